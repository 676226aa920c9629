//! # Query translation
//!
//! Turns the query-string grammar into `sea-query` building blocks. Each
//! submodule handles one parameter family and none of them touch the database.
//!
//! ## Query Parameter Examples
//!
//! ```text
//! GET /cats?page=2&limit=10
//! GET /cats?sortBy=color:ASC&sortBy=id:DESC
//! GET /cats?filter.age=$gte:3&filter.age=$lte:6
//! GET /cats?filter.color=$in:white,black&filter.name=$not:$null
//! GET /cats?filter.toys.name=$ilike:ball
//! GET /cats?search=white cat&searchBy=name&searchBy=color
//! GET /cats?select=id,name,size.height
//! ```
//!
//! ## Components
//!
//! - [`token`]: the `[$and|$or:][$not:][$op:]value` filter grammar
//! - [`columns`]: dotted column paths to qualified expressions and joins
//! - [`conditions`]: filter allow-lists, static `where` groups, soft delete
//! - [`search`]: case-insensitive search across columns
//! - [`sort`]: sort validation and null ordering
//! - [`pagination`]: page window and navigation links

pub mod columns;
pub mod conditions;
pub mod pagination;
pub mod search;
pub mod sort;
pub mod token;

pub use columns::{ColumnExpr, ColumnProperties, ColumnResolver, ResolvedColumn};
pub use conditions::{
    ColumnFilter, build_soft_delete_condition, build_token_condition, build_where_condition,
    compile_filters, filters_to_condition, is_token_allowed,
};
pub use pagination::{LinkState, PageWindow, link_base};
pub use search::{LikeMatch, build_like_condition, build_search_condition};
pub use sort::{OrderKey, SortOrigin, apply_order, build_order_keys, resolve_sort};
pub use token::{FilterComparator, FilterOperator, FilterSuffix, FilterToken, parse_filter_token};
