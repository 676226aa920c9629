//! Compiles `filter.<column>` parameters and static `where` groups into
//! Sea-ORM conditions.

use super::columns::{ColumnResolver, ResolvedColumn};
use super::search::{LikeMatch, build_like_condition};
use super::token::{FilterComparator, FilterOperator, FilterToken, parse_filter_token};
use crate::config::{FilterRule, PaginateConfig};
use crate::models::PaginateQuery;
use sea_orm::{
    Condition, DatabaseBackend,
    sea_query::{Alias, Expr, SimpleExpr},
};
use std::collections::BTreeMap;

/// Compiled filters for one column, in request order.
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    pub column: String,
    pub entries: Vec<(FilterComparator, Condition)>,
}

impl ColumnFilter {
    /// Fold the entries left to right: `$or` entries widen the running
    /// condition, `$and` entries narrow it.
    #[must_use]
    pub fn to_condition(&self) -> Option<Condition> {
        self.entries
            .iter()
            .cloned()
            .fold(None, |running, (comparator, predicate)| {
                Some(match running {
                    None => predicate,
                    Some(running) => match comparator {
                        FilterComparator::And => Condition::all().add(running).add(predicate),
                        FilterComparator::Or => Condition::any().add(running).add(predicate),
                    },
                })
            })
    }
}

/// Whether a parsed token passes a column's filter rule.
///
/// `$not` on a bare equality only needs `$not` to be allowed.
#[must_use]
pub fn is_token_allowed(rule: &FilterRule, token: &FilterToken) -> bool {
    if let Some(suffix) = token.suffix {
        if !rule.allows_suffix(suffix) {
            return false;
        }
        if token.operator == FilterOperator::Eq {
            return true;
        }
    }
    rule.allows_operator(token.operator)
}

/// Turn one token into a predicate on `column`.
///
/// Returns `None` for a `$btw` without exactly two bounds.
#[must_use]
pub fn build_token_condition(
    column: &ResolvedColumn,
    token: &FilterToken,
    backend: DatabaseBackend,
) -> Option<Condition> {
    let value = token.value.as_deref().unwrap_or_default();
    let expr = || Expr::expr(column.to_expr());
    let coerce = |raw: &str| column.kind.coerce(raw);

    let predicate: SimpleExpr = match token.operator {
        FilterOperator::Eq => expr().eq(coerce(value)),
        FilterOperator::Gt => expr().gt(coerce(value)),
        FilterOperator::Gte => expr().gte(coerce(value)),
        FilterOperator::Lt => expr().lt(coerce(value)),
        FilterOperator::Lte => expr().lte(coerce(value)),
        FilterOperator::In => expr().is_in(token.values().into_iter().map(coerce)),
        FilterOperator::Null => expr().is_null(),
        FilterOperator::Btw => match token.values().as_slice() {
            [low, high] => expr().between(coerce(*low), coerce(*high)),
            _ => {
                tracing::debug!(value, "Dropping $btw filter without exactly two bounds");
                return None;
            }
        },
        FilterOperator::ILike => build_like_condition(column, value, LikeMatch::Contains, backend),
        FilterOperator::Sw => build_like_condition(column, value, LikeMatch::StartsWith, backend),
    };

    let condition = Condition::all().add(predicate);
    Some(if token.is_negated() { condition.not() } else { condition })
}

/// Compile the query's filters against the configured allow-list.
///
/// Columns that are not filterable and tokens the column's rule rejects are
/// dropped silently.
pub fn compile_filters(
    query: &PaginateQuery,
    config: &PaginateConfig,
    resolver: &mut ColumnResolver<'_>,
    backend: DatabaseBackend,
) -> Vec<ColumnFilter> {
    let Some(filter) = &query.filter else {
        return Vec::new();
    };

    let mut compiled = Vec::new();
    for (column, raw_values) in filter {
        let Some(rule) = config.filterable_columns.get(column) else {
            tracing::debug!(column = %column, "Ignoring filter on non-filterable column");
            continue;
        };

        let tokens: Vec<FilterToken> = raw_values
            .iter()
            .filter_map(|raw| parse_filter_token(Some(raw.as_str())))
            .filter(|token| {
                let allowed = is_token_allowed(rule, token);
                if !allowed {
                    tracing::debug!(
                        column = %column,
                        operator = token.operator.as_token(),
                        "Ignoring filter with disallowed operator"
                    );
                }
                allowed
            })
            .collect();
        if tokens.is_empty() {
            continue;
        }

        let resolved = resolver.resolve(column);
        let entries: Vec<_> = tokens
            .iter()
            .filter_map(|token| {
                build_token_condition(&resolved, token, backend).map(|condition| (token.comparator, condition))
            })
            .collect();
        if !entries.is_empty() {
            compiled.push(ColumnFilter {
                column: column.clone(),
                entries,
            });
        }
    }
    compiled
}

/// AND the per-column conditions together.
#[must_use]
pub fn filters_to_condition(filters: &[ColumnFilter]) -> Option<Condition> {
    let conditions: Vec<Condition> = filters.iter().filter_map(ColumnFilter::to_condition).collect();
    if conditions.is_empty() {
        return None;
    }
    Some(
        conditions
            .into_iter()
            .fold(Condition::all(), Condition::add),
    )
}

/// Static `where` groups: columns inside a group are ANDed, groups are ORed.
/// Values use the filter token grammar but are not checked against any rule.
pub fn build_where_condition(
    groups: &[BTreeMap<String, String>],
    resolver: &mut ColumnResolver<'_>,
    backend: DatabaseBackend,
) -> Option<Condition> {
    let mut any_group = Condition::any();
    for group in groups.iter().filter(|group| !group.is_empty()) {
        let mut all_columns = Condition::all();
        for (column, raw) in group {
            let Some(token) = parse_filter_token(Some(raw.as_str())) else {
                continue;
            };
            let resolved = resolver.resolve(column);
            if let Some(condition) = build_token_condition(&resolved, &token, backend) {
                all_columns = all_columns.add(condition);
            }
        }
        if !all_columns.is_empty() {
            any_group = any_group.add(all_columns);
        }
    }
    (!any_group.is_empty()).then_some(any_group)
}

/// Hide soft-deleted rows unless the config asks for them.
#[must_use]
pub fn build_soft_delete_condition(config: &PaginateConfig) -> Option<SimpleExpr> {
    if config.with_deleted {
        return None;
    }
    let column = config.schema.deleted_at_column()?;
    Some(
        Expr::col((
            Alias::new(config.schema.alias()),
            Alias::new(column),
        ))
        .is_null(),
    )
}
