use sea_orm::Order;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Normalised pagination request, as produced by the
/// [`PaginateQuery`](crate::PaginateQuery) extractor.
///
/// Every field is `None` when the client did not send the parameter.
///
/// # Query string
/// - `page=2` - 1-based page number
/// - `limit=20` - page size; `0` requests counts only
/// - `sortBy=color:ASC` - repeatable, applied in order
/// - `search=tom` and `searchBy=name` (repeatable or comma separated)
/// - `filter.age=$gte:3` - repeatable per column, see [`parse_filter_token`](crate::parse_filter_token)
/// - `select=id,name` - comma separated
/// - `cursor=42` - keyset cursor for cursor pagination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginateQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Raw `(column, direction)` pairs; invalid pairs are dropped when paginating
    pub sort_by: Option<Vec<(String, String)>>,
    pub search_by: Option<Vec<String>>,
    pub search: Option<String>,
    /// Raw filter strings per column, in the order they were sent
    pub filter: Option<BTreeMap<String, Vec<String>>>,
    pub select: Option<Vec<String>>,
    pub cursor: Option<String>,
    /// Request URL without the query string, used as the base of every link
    pub path: String,
}

impl PaginateQuery {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, column: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort_by
            .get_or_insert_with(Vec::new)
            .push((column.into(), direction.into()));
        self
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    #[must_use]
    pub fn with_search_by(mut self, column: impl Into<String>) -> Self {
        self.search_by.get_or_insert_with(Vec::new).push(column.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, column: impl Into<String>, raw: impl Into<String>) -> Self {
        self.filter
            .get_or_insert_with(BTreeMap::new)
            .entry(column.into())
            .or_default()
            .push(raw.into());
        self
    }

    #[must_use]
    pub fn with_select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive `ASC`/`DESC`; anything else is rejected.
    #[must_use]
    pub fn parse(direction: &str) -> Option<Self> {
        if direction.eq_ignore_ascii_case("ASC") {
            Some(Self::Asc)
        } else if direction.eq_ignore_ascii_case("DESC") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginatedMeta,
    pub links: PaginatedLinks,
}

/// Pagination state echoed back to the client.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedMeta {
    pub items_per_page: u64,
    pub total_items: u64,
    pub current_page: u64,
    pub total_pages: u64,
    #[schema(value_type = Vec<Vec<String>>)]
    pub sort_by: Vec<(String, SortOrder)>,
    pub search_by: Option<Vec<String>>,
    pub search: Option<String>,
    pub select: Option<Vec<String>>,
    pub filter: Option<BTreeMap<String, Vec<String>>>,
    pub cursor: Option<String>,
}

/// Navigation links. Each link reproduces the full request state.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginatedLinks {
    pub first: Option<String>,
    pub previous: Option<String>,
    pub current: String,
    pub next: Option<String>,
    pub last: Option<String>,
}
