use super::columns::ColumnResolver;
use crate::config::{NullSort, PaginateConfig};
use crate::models::{PaginateQuery, SortOrder};
use sea_orm::{
    DatabaseBackend,
    sea_query::{Expr, NullOrdering, Order, SelectStatement, SimpleExpr},
};

/// Where the effective sort came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrigin {
    /// Valid `sortBy` pairs from the request
    Requested,
    /// The endpoint's `default_sort_by`
    Configured,
    /// First sortable column, ascending
    Fallback,
}

/// Pick the effective sort for a request.
///
/// Requested pairs survive only when the column is sortable and the direction
/// is `ASC` or `DESC` in any case.
#[must_use]
pub fn resolve_sort(
    query: &PaginateQuery,
    config: &PaginateConfig,
) -> (Vec<(String, SortOrder)>, SortOrigin) {
    let requested: Vec<(String, SortOrder)> = query
        .sort_by
        .iter()
        .flatten()
        .filter_map(|(column, direction)| {
            let order = SortOrder::parse(direction);
            if order.is_none() || !config.sortable_columns.contains(column) {
                tracing::debug!(column = %column, direction = %direction, "Ignoring invalid sort pair");
            }
            order
                .filter(|_| config.sortable_columns.contains(column))
                .map(|order| (column.clone(), order))
        })
        .collect();

    if !requested.is_empty() {
        return (requested, SortOrigin::Requested);
    }
    if !config.default_sort_by.is_empty() {
        return (config.default_sort_by.clone(), SortOrigin::Configured);
    }
    let fallback = config
        .sortable_columns
        .first()
        .map(|column| vec![(column.clone(), SortOrder::Asc)])
        .unwrap_or_default();
    (fallback, SortOrigin::Fallback)
}

/// One ORDER BY key.
#[derive(Debug, Clone)]
pub struct OrderKey {
    pub expr: SimpleExpr,
    pub order: Order,
    pub nulls: Option<NullOrdering>,
}

/// Resolve sort pairs into ORDER BY keys, joining relations on the way.
///
/// MySQL has no `NULLS FIRST`/`NULLS LAST`; there an `IS NULL` or
/// `IS NOT NULL` key is placed ahead of each column instead.
pub fn build_order_keys(
    sort: &[(String, SortOrder)],
    resolver: &mut ColumnResolver<'_>,
    null_sort: Option<NullSort>,
    backend: DatabaseBackend,
) -> Vec<OrderKey> {
    let mut keys = Vec::with_capacity(sort.len());
    for (column, order) in sort {
        let expr = resolver.resolve(column).to_expr();
        match (null_sort, backend) {
            (Some(null_sort), DatabaseBackend::MySql) => {
                let nulls_key = match null_sort {
                    NullSort::Last => Expr::expr(expr.clone()).is_null(),
                    NullSort::First => Expr::expr(expr.clone()).is_not_null(),
                };
                keys.push(OrderKey {
                    expr: nulls_key,
                    order: Order::Asc,
                    nulls: None,
                });
                keys.push(OrderKey {
                    expr,
                    order: (*order).into(),
                    nulls: None,
                });
            }
            (Some(null_sort), _) => keys.push(OrderKey {
                expr,
                order: (*order).into(),
                nulls: Some(match null_sort {
                    NullSort::First => NullOrdering::First,
                    NullSort::Last => NullOrdering::Last,
                }),
            }),
            (None, _) => keys.push(OrderKey {
                expr,
                order: (*order).into(),
                nulls: None,
            }),
        }
    }
    keys
}

pub fn apply_order(statement: &mut SelectStatement, keys: &[OrderKey]) {
    for key in keys {
        match &key.nulls {
            Some(nulls) => {
                statement.order_by_expr_with_nulls(key.expr.clone(), key.order.clone(), nulls.clone());
            }
            None => {
                statement.order_by_expr(key.expr.clone(), key.order.clone());
            }
        }
    }
}
