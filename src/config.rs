//! Per-endpoint pagination options.
//!
//! A [`PaginateConfig`] is usually built in code next to the handler, but the
//! declarative part also deserialises from JSON or TOML using camelCase keys:
//!
//! ```json
//! {
//!   "sortableColumns": ["id", "name", "color"],
//!   "defaultSortBy": [["id", "DESC"]],
//!   "searchableColumns": ["name", "color"],
//!   "filterableColumns": { "age": ["$gte", "$lte", "$not"], "color": true },
//!   "maxLimit": 50
//! }
//! ```
//!
//! The [`Schema`] is never part of the serialised form; attach it with
//! [`PaginateConfig::with_schema`].

use crate::filtering::token::{FilterOperator, FilterSuffix};
use crate::models::SortOrder;
use crate::schema::Schema;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Page size used when the client does not send `limit`.
pub const DEFAULT_LIMIT: u64 = 20;
/// Largest page size a client may request unless configured otherwise.
pub const DEFAULT_MAX_LIMIT: u64 = 100;

/// Where NULL values sort relative to everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullSort {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PaginationType {
    #[default]
    #[serde(rename = "limit")]
    LimitOffset,
    #[serde(rename = "cursor")]
    Cursor,
}

/// One entry of a per-column filter allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum FilterKeyword {
    Operator(FilterOperator),
    Suffix(FilterSuffix),
}

impl From<FilterOperator> for FilterKeyword {
    fn from(operator: FilterOperator) -> Self {
        Self::Operator(operator)
    }
}

impl From<FilterSuffix> for FilterKeyword {
    fn from(suffix: FilterSuffix) -> Self {
        Self::Suffix(suffix)
    }
}

/// What a client may do with `filter.<column>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "FilterRuleRepr")]
pub enum FilterRule {
    /// Every operator and suffix (`true` in serialised configs)
    Any,
    Only(Vec<FilterKeyword>),
}

impl FilterRule {
    pub fn only<I, K>(keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FilterKeyword>,
    {
        Self::Only(keywords.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn allows_operator(&self, operator: FilterOperator) -> bool {
        match self {
            Self::Any => true,
            Self::Only(keywords) => keywords.contains(&FilterKeyword::Operator(operator)),
        }
    }

    #[must_use]
    pub fn allows_suffix(&self, suffix: FilterSuffix) -> bool {
        match self {
            Self::Any => true,
            Self::Only(keywords) => keywords.contains(&FilterKeyword::Suffix(suffix)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterRuleRepr {
    Flag(bool),
    List(Vec<FilterKeyword>),
}

impl From<FilterRuleRepr> for FilterRule {
    fn from(repr: FilterRuleRepr) -> Self {
        match repr {
            FilterRuleRepr::Flag(true) => Self::Any,
            FilterRuleRepr::Flag(false) => Self::Only(Vec::new()),
            FilterRuleRepr::List(keywords) => Self::Only(keywords),
        }
    }
}

/// Pagination options for one endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginateConfig {
    #[serde(skip)]
    pub schema: Schema,
    /// Columns clients may sort by; must not be empty
    pub sortable_columns: Vec<String>,
    pub default_sort_by: Vec<(String, SortOrder)>,
    pub null_sort: Option<NullSort>,
    pub searchable_columns: Vec<String>,
    /// Require every whitespace separated search word to match some column
    pub multi_word_search: bool,
    /// Columns selected by default and the upper bound of a client `select`
    pub select: Vec<String>,
    pub filterable_columns: BTreeMap<String, FilterRule>,
    /// Relation paths to join, nested ones dotted (`toys.shop`)
    pub relations: Vec<String>,
    /// Static conditions: columns in a group are ANDed, groups are ORed.
    /// Values use the filter token grammar.
    #[serde(rename = "where")]
    pub where_clause: Vec<BTreeMap<String, String>>,
    pub default_limit: u64,
    /// `0` lifts the bound; with a client `limit=0` it disables pagination
    pub max_limit: u64,
    pub with_deleted: bool,
    pub pagination_type: PaginationType,
    pub cursorable_columns: Vec<String>,
    /// Emit links without scheme and host
    pub relative_path: bool,
    /// Replace scheme and host of links
    pub origin: Option<String>,
}

impl Default for PaginateConfig {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            sortable_columns: Vec::new(),
            default_sort_by: Vec::new(),
            null_sort: None,
            searchable_columns: Vec::new(),
            multi_word_search: false,
            select: Vec::new(),
            filterable_columns: BTreeMap::new(),
            relations: Vec::new(),
            where_clause: Vec::new(),
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            with_deleted: false,
            pagination_type: PaginationType::default(),
            cursorable_columns: Vec::new(),
            relative_path: false,
            origin: None,
        }
    }
}

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl PaginateConfig {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    #[must_use]
    pub fn with_sortable_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable_columns = strings(columns);
        self
    }

    #[must_use]
    pub fn with_default_sort_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.default_sort_by.push((column.into(), order));
        self
    }

    #[must_use]
    pub fn with_null_sort(mut self, null_sort: NullSort) -> Self {
        self.null_sort = Some(null_sort);
        self
    }

    #[must_use]
    pub fn with_searchable_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable_columns = strings(columns);
        self
    }

    #[must_use]
    pub fn with_multi_word_search(mut self, enabled: bool) -> Self {
        self.multi_word_search = enabled;
        self
    }

    #[must_use]
    pub fn with_select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = strings(columns);
        self
    }

    #[must_use]
    pub fn with_filterable_column(mut self, column: impl Into<String>, rule: FilterRule) -> Self {
        self.filterable_columns.insert(column.into(), rule);
        self
    }

    #[must_use]
    pub fn with_relations<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations = strings(relations);
        self
    }

    /// Add one ORed group of ANDed `(column, raw filter)` conditions.
    #[must_use]
    pub fn with_where<I, K, V>(mut self, group: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.where_clause.push(
            group
                .into_iter()
                .map(|(column, raw)| (column.into(), raw.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_limit(mut self, limit: u64) -> Self {
        self.max_limit = limit;
        self
    }

    #[must_use]
    pub fn with_deleted(mut self, with_deleted: bool) -> Self {
        self.with_deleted = with_deleted;
        self
    }

    #[must_use]
    pub fn with_pagination_type(mut self, pagination_type: PaginationType) -> Self {
        self.pagination_type = pagination_type;
        self
    }

    #[must_use]
    pub fn with_cursorable_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cursorable_columns = strings(columns);
        self
    }

    #[must_use]
    pub fn with_relative_path(mut self, relative: bool) -> Self {
        self.relative_path = relative;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}
