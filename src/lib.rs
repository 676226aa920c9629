//! # sea-paginate
//!
//! Query-string driven pagination, sorting, filtering and search for Axum
//! handlers backed by Sea-ORM.
//!
//! ```rust,ignore
//! use sea_paginate::{PaginateConfig, PaginateQuery, Paginated, PaginateError, Schema, paginate};
//!
//! fn cat_config() -> PaginateConfig {
//!     PaginateConfig::new(Schema::of::<cat::Entity>().with_alias("cat"))
//!         .with_sortable_columns(["id", "name", "color"])
//!         .with_searchable_columns(["name", "color"])
//!         .with_filterable_column("age", FilterRule::Any)
//! }
//!
//! async fn list_cats(
//!     State(db): State<DatabaseConnection>,
//!     query: PaginateQuery,
//! ) -> Result<Json<Paginated<cat::Model>>, PaginateError> {
//!     Ok(Json(paginate(&query, &db, &cat_config()).await?))
//! }
//! ```
//!
//! `GET /cats?page=2&limit=10&sortBy=color:ASC&filter.age=$gte:3&search=tom`
//! returns the second page of ten cats aged three or more whose name or color
//! contains "tom", ordered by color, together with `meta` and `links`.

pub mod config;
pub mod core;
pub mod errors;
pub mod extract;
pub mod filtering;
pub mod models;
pub mod paginate;
pub mod schema;

pub use config::{
    DEFAULT_LIMIT, DEFAULT_MAX_LIMIT, FilterKeyword, FilterRule, NullSort, PaginateConfig,
    PaginationType,
};
pub use crate::core::PaginatedResource;
pub use errors::PaginateError;
pub use filtering::token::{
    FilterComparator, FilterOperator, FilterSuffix, FilterToken, parse_filter_token,
};
pub use models::{PaginateQuery, Paginated, PaginatedLinks, PaginatedMeta, SortOrder};
pub use paginate::paginate;
pub use schema::{ColumnKind, RelationSchema, Schema};
pub use serde_with;
