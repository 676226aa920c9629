//! Query assembly and execution.
//!
//! [`paginate`] is the single entry point: it validates the config, builds one
//! `SELECT` from the request, runs it (plus a `COUNT(*)` over the same
//! statement when paginated) and wraps the rows with metadata and links.
//!
//! Once a relation is joined the rows no longer map one to one onto entities.
//! The page is then chosen over the grouped root primary keys first and the
//! rows are read by joining that page back:
//!
//! ```sql
//! SELECT cat.id AS id, ... FROM cats AS cat
//! INNER JOIN (
//!     SELECT cat.id AS id, MIN(cat.name) AS paginate_sort_0
//!     FROM cats AS cat LEFT JOIN toys AS cat_toys ON cat.id = cat_toys.cat_id
//!     WHERE ... GROUP BY cat.id ORDER BY MIN(cat.name) ASC, cat.id ASC LIMIT 2
//! ) AS paginate_page ON cat.id = paginate_page.id
//! ORDER BY paginate_page.paginate_sort_0 ASC, cat.id ASC
//! ```

use crate::config::{PaginateConfig, PaginationType};
use crate::errors::PaginateError;
use crate::filtering::{
    ColumnResolver, LinkState, OrderKey, PageWindow, SortOrigin, apply_order, build_order_keys,
    build_search_condition, build_soft_delete_condition, build_where_condition, compile_filters,
    filters_to_condition, link_base, resolve_sort,
};
use crate::models::{PaginateQuery, Paginated, PaginatedMeta, SortOrder};
use sea_orm::{
    Condition, ConnectionTrait, FromQueryResult, QueryResult,
    sea_query::{Alias, Expr, Func, JoinType, Order, Query, SelectStatement},
};
use uuid::Uuid;

const COUNT_ALIAS: &str = "num_items";
const COUNT_SUBQUERY_ALIAS: &str = "sub_query";
const CURSOR_ALIAS: &str = "paginate_cursor";
const PAGE_ALIAS: &str = "paginate_page";
const SORT_KEY_ALIAS: &str = "paginate_sort";

/// Run one paginated query.
///
/// `M` receives each row as selected: root columns under their own names,
/// embedded properties as `<embedded>_<property>`, relation columns as
/// `<relation>_<column>` and generated virtual columns under their name.
///
/// Limits, offsets and totals always count entities. Selecting a to-many
/// relation yields one row per related row; those rows stay next to each
/// other.
///
/// # Errors
///
/// [`PaginateError::Misconfigured`] when the config cannot serve any request,
/// [`PaginateError::Database`] when a statement fails and
/// [`PaginateError::Row`] when a row does not fit `M`.
pub async fn paginate<M, C>(
    query: &PaginateQuery,
    db: &C,
    config: &PaginateConfig,
) -> Result<Paginated<M>, PaginateError>
where
    M: FromQueryResult + Send,
    C: ConnectionTrait,
{
    if config.sortable_columns.is_empty() {
        return Err(PaginateError::misconfigured("No sortable columns configured"));
    }

    let backend = db.get_database_backend();
    let schema = &config.schema;
    let is_cursor = config.pagination_type == PaginationType::Cursor;
    let mut window = PageWindow::resolve(query.page, query.limit, config.default_limit, config.max_limit);
    if is_cursor {
        window.page = 1;
    }

    let (mut sort, origin) = resolve_sort(query, config);
    let cursor_sort = if is_cursor {
        Some(move_cursor_column_first(&mut sort, origin, config)?)
    } else {
        None
    };

    let search_by = effective_search_by(query, config);

    let mut select_resolver = ColumnResolver::new(schema);
    for relation in &config.relations {
        select_resolver.join(relation);
    }
    let select = narrowed_select(query, config, &select_resolver);

    let mut statement = Query::select();
    statement.from_as(Alias::new(schema.table()), Alias::new(schema.alias()));
    select_columns(&mut statement, &mut select_resolver, config, select.as_deref());
    if let Some((column, _)) = &cursor_sort {
        statement.expr_as(select_resolver.resolve(column).to_expr(), Alias::new(CURSOR_ALIAS));
    }

    // filters, search and sort may join more relations than the select needs
    let mut resolver = select_resolver.clone();
    let mut condition = Condition::all();
    if let Some(where_condition) = build_where_condition(&config.where_clause, &mut resolver, backend) {
        condition = condition.add(where_condition);
    }
    if let Some(term) = query.search.as_deref()
        && let Some(search_condition) =
            build_search_condition(term, &search_by, config.multi_word_search, &mut resolver, backend)
    {
        condition = condition.add(search_condition);
    }
    let filters = compile_filters(query, config, &mut resolver, backend);
    if let Some(filter_condition) = filters_to_condition(&filters) {
        condition = condition.add(filter_condition);
    }
    if let Some(soft_delete) = build_soft_delete_condition(config) {
        condition = condition.add(soft_delete);
    }

    let order_keys = build_order_keys(&sort, &mut resolver, config.null_sort, backend);

    let mut page_condition = condition.clone();
    if let Some((column, order)) = &cursor_sort
        && let Some(cursor) = query.cursor.as_deref()
    {
        let cursor_column = resolver.resolve(column);
        let value = cursor_column.kind.coerce(cursor);
        let target = Expr::expr(cursor_column.to_expr());
        page_condition = page_condition.add(match order {
            SortOrder::Asc => target.gt(value),
            SortOrder::Desc => target.lt(value),
        });
    }

    let groups_entities = resolver.has_joins() && !schema.primary_key().is_empty();
    let (count_statement, rows_statement, cursor_page) = if groups_entities {
        let count_base = entity_keys(&resolver, condition);

        let mut page = entity_keys(&resolver, page_condition);
        let page_keys = aggregate_order_keys(&order_keys);
        for (index, key) in page_keys.iter().enumerate() {
            page.expr_as(key.expr.clone(), Alias::new(sort_key_alias(index)));
        }
        apply_order(&mut page, &page_keys);
        order_by_primary_key(&mut page, schema.alias(), schema.primary_key());
        if window.paginated {
            page.limit(window.limit);
            if !is_cursor {
                page.offset(window.offset());
            }
        }

        let mut rows_statement = statement;
        select_resolver.apply_joins(&mut rows_statement);
        rows_statement.join_subquery(
            JoinType::InnerJoin,
            page.clone(),
            Alias::new(PAGE_ALIAS),
            page_join_condition(schema.alias(), schema.primary_key()),
        );
        let outer_keys: Vec<OrderKey> = page_keys
            .iter()
            .enumerate()
            .map(|(index, key)| OrderKey {
                expr: Expr::col((Alias::new(PAGE_ALIAS), Alias::new(sort_key_alias(index)))).into(),
                order: key.order.clone(),
                nulls: key.nulls.clone(),
            })
            .collect();
        apply_order(&mut rows_statement, &outer_keys);
        order_by_primary_key(&mut rows_statement, schema.alias(), schema.primary_key());

        (Some(count_base), rows_statement, is_cursor.then_some(page))
    } else {
        resolver.apply_joins(&mut statement);

        let count_statement = window.paginated.then(|| {
            let mut count_base = statement.clone();
            if !condition.is_empty() {
                count_base.cond_where(condition);
            }
            count_base
        });

        let mut rows_statement = statement;
        if !page_condition.is_empty() {
            rows_statement.cond_where(page_condition);
        }
        apply_order(&mut rows_statement, &order_keys);
        if window.paginated {
            rows_statement.limit(window.limit);
            if !is_cursor {
                rows_statement.offset(window.offset());
            }
        }
        (count_statement, rows_statement, None)
    };

    let total_from_count = match count_statement {
        Some(count_base) => Some(count_rows(db, count_base).await?),
        None => None,
    };

    let rows = if window.is_counts_only() {
        Vec::new()
    } else {
        let built = backend.build(&rows_statement);
        tracing::debug!(sql = %built, "Running paginated query");
        db.query_all(built).await?
    };

    let page_entities = match cursor_page {
        Some(page) if !rows.is_empty() => count_rows(db, page).await?,
        _ => rows.len() as u64,
    };
    let next_cursor = if is_cursor && window.limit > 0 && page_entities == window.limit {
        rows.last().and_then(read_cursor)
    } else {
        None
    };

    let data = rows
        .iter()
        .map(|row| M::from_query_result(row, "").map_err(PaginateError::row))
        .collect::<Result<Vec<M>, _>>()?;
    let returned = u64::try_from(data.len()).unwrap_or(u64::MAX);
    let total_items = total_from_count.unwrap_or(returned);

    let client_search_by = query.search_by.as_ref().map(|_| search_by.as_slice());
    let client_select = query.select.as_ref().and(select.as_deref());
    let state = LinkState {
        sort_by: &sort,
        search: query.search.as_deref(),
        search_by: client_search_by,
        select: client_select,
        filter: query.filter.as_ref(),
    };
    let base = link_base(&query.path, config.relative_path, config.origin.as_deref());
    let links = if is_cursor {
        state.cursor_links(&base, window.limit, query.cursor.as_deref(), next_cursor.as_deref())
    } else {
        state.page_links(&base, window, total_items)
    };

    let meta = PaginatedMeta {
        items_per_page: if window.paginated { window.limit } else { total_items },
        total_items,
        current_page: window.page,
        total_pages: window.total_pages(total_items),
        search_by: query.search.as_ref().map(|_| search_by.clone()),
        search: query.search.clone(),
        select: client_select.map(<[String]>::to_vec),
        filter: query.filter.clone(),
        cursor: query.cursor.clone(),
        sort_by: sort,
    };

    Ok(Paginated { data, meta, links })
}

/// Root primary keys of the matching entities, one row each however many
/// joined rows matched.
fn entity_keys(resolver: &ColumnResolver<'_>, condition: Condition) -> SelectStatement {
    let schema = resolver.schema();
    let root = schema.alias();
    let mut statement = Query::select();
    statement.from_as(Alias::new(schema.table()), Alias::new(root));
    for key in schema.primary_key() {
        statement
            .expr_as(Expr::col((Alias::new(root), Alias::new(key.as_str()))), Alias::new(key.as_str()))
            .group_by_col((Alias::new(root), Alias::new(key.as_str())));
    }
    resolver.apply_joins(&mut statement);
    if !condition.is_empty() {
        statement.cond_where(condition);
    }
    statement
}

/// One sort value per entity: the smallest related value for ascending keys,
/// the largest for descending ones.
fn aggregate_order_keys(keys: &[OrderKey]) -> Vec<OrderKey> {
    keys.iter()
        .map(|key| OrderKey {
            expr: match &key.order {
                Order::Desc => Func::max(key.expr.clone()).into(),
                _ => Func::min(key.expr.clone()).into(),
            },
            order: key.order.clone(),
            nulls: key.nulls.clone(),
        })
        .collect()
}

fn sort_key_alias(index: usize) -> String {
    format!("{SORT_KEY_ALIAS}_{index}")
}

fn order_by_primary_key(statement: &mut SelectStatement, root: &str, primary_key: &[String]) {
    for key in primary_key {
        statement.order_by((Alias::new(root), Alias::new(key.as_str())), Order::Asc);
    }
}

fn page_join_condition(root: &str, primary_key: &[String]) -> Condition {
    primary_key.iter().fold(Condition::all(), |on, key| {
        on.add(
            Expr::col((Alias::new(root), Alias::new(key.as_str())))
                .equals((Alias::new(PAGE_ALIAS), Alias::new(key.as_str()))),
        )
    })
}

/// Put the cursor column at the front of the sort so the keyset comparison
/// follows the row order.
fn move_cursor_column_first(
    sort: &mut Vec<(String, SortOrder)>,
    origin: SortOrigin,
    config: &PaginateConfig,
) -> Result<(String, SortOrder), PaginateError> {
    let Some(first_cursorable) = config.cursorable_columns.first() else {
        return Err(PaginateError::misconfigured(
            "Cursor pagination requires at least one cursorable column",
        ));
    };

    if origin == SortOrigin::Configured
        && let Some((column, _)) = sort.first()
        && !config.cursorable_columns.contains(column)
    {
        return Err(PaginateError::misconfigured(format!(
            "Invalid cursor column: {column}"
        )));
    }

    let cursor_pair = match sort
        .iter()
        .position(|(column, _)| config.cursorable_columns.contains(column))
    {
        Some(index) => sort.remove(index),
        None => (first_cursorable.clone(), SortOrder::Asc),
    };
    sort.insert(0, cursor_pair.clone());
    Ok(cursor_pair)
}

/// Searchable columns narrowed by `searchBy` when the client sent it.
fn effective_search_by(query: &PaginateQuery, config: &PaginateConfig) -> Vec<String> {
    match &query.search_by {
        Some(requested) => config
            .searchable_columns
            .iter()
            .filter(|column| requested.contains(column))
            .cloned()
            .collect(),
        None => config.searchable_columns.clone(),
    }
}

/// The select list before the primary key check: the configured select (or
/// every root column) narrowed by the client's `select`.
fn narrowed_select(
    query: &PaginateQuery,
    config: &PaginateConfig,
    resolver: &ColumnResolver<'_>,
) -> Option<Vec<String>> {
    match (&query.select, config.select.is_empty()) {
        (None, true) => None,
        (None, false) => Some(config.select.clone()),
        (Some(requested), false) => Some(
            config
                .select
                .iter()
                .filter(|column| requested.contains(column))
                .cloned()
                .collect(),
        ),
        (Some(requested), true) => Some(
            requested
                .iter()
                .filter(|column| {
                    let properties = resolver.properties(column);
                    !properties.is_relation
                        && ((properties.is_virtual && properties.generator.is_some())
                            || properties.is_embedded
                            || (!properties.is_virtual && resolver.schema().has_column(column)))
                })
                .cloned()
                .collect(),
        ),
    }
}

fn select_alias(path: &str) -> String {
    path.replace('.', "_")
}

fn select_columns(
    statement: &mut SelectStatement,
    resolver: &mut ColumnResolver<'_>,
    config: &PaginateConfig,
    select: Option<&[String]>,
) {
    let schema = resolver.schema();
    let narrowed = select.filter(|columns| {
        !columns.is_empty()
            && schema
                .primary_key()
                .iter()
                .all(|key| columns.contains(key))
    });

    if let Some(columns) = narrowed {
        for path in columns {
            let column = resolver.resolve(path);
            statement.expr_as(column.to_expr(), Alias::new(select_alias(path)));
        }
        return;
    }

    for column in schema.columns() {
        statement.expr_as(
            Expr::col((Alias::new(schema.alias()), Alias::new(column))),
            Alias::new(column),
        );
    }
    for (name, virtual_column) in schema.virtual_columns() {
        if virtual_column.generator().is_some() {
            let column = resolver.resolve(name);
            statement.expr_as(column.to_expr(), Alias::new(name));
        }
    }
    for relation in &config.relations {
        let Some(target) = resolver.relation_schema(relation) else {
            continue;
        };
        let segments: Vec<&str> = relation.split('.').collect();
        let table_alias = resolver.relation_alias(&segments);
        let prefix = select_alias(relation);
        for column in target.columns() {
            statement.expr_as(
                Expr::col((Alias::new(table_alias.as_str()), Alias::new(column))),
                Alias::new(format!("{prefix}_{column}")),
            );
        }
    }
}

async fn count_rows<C: ConnectionTrait>(db: &C, base: SelectStatement) -> Result<u64, PaginateError> {
    let backend = db.get_database_backend();
    let mut statement = Query::select();
    statement
        .expr_as(Expr::cust("COUNT(*)"), Alias::new(COUNT_ALIAS))
        .from_subquery(base, Alias::new(COUNT_SUBQUERY_ALIAS));

    let built = backend.build(&statement);
    tracing::debug!(sql = %built, "Counting paginated rows");
    let total: i64 = match db.query_one(built).await? {
        Some(row) => row.try_get("", COUNT_ALIAS).map_err(PaginateError::row)?,
        None => 0,
    };
    Ok(u64::try_from(total).unwrap_or_default())
}

/// Cursor value of a row, whatever type the cursor column has.
fn read_cursor(row: &QueryResult) -> Option<String> {
    if let Ok(value) = row.try_get::<Option<i64>>("", CURSOR_ALIAS) {
        return value.map(|value| value.to_string());
    }
    if let Ok(value) = row.try_get::<Option<i32>>("", CURSOR_ALIAS) {
        return value.map(|value| value.to_string());
    }
    if let Ok(value) = row.try_get::<Option<f64>>("", CURSOR_ALIAS) {
        return value.map(|value| value.to_string());
    }
    if let Ok(value) = row.try_get::<Option<Uuid>>("", CURSOR_ALIAS) {
        return value.map(|value| value.to_string());
    }
    row.try_get::<Option<String>>("", CURSOR_ALIAS).ok().flatten()
}
