//! Axum extractor for [`PaginateQuery`].
//!
//! Extraction never fails: parameters that do not parse are treated as absent.

use crate::models::PaginateQuery;
use axum::{
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};
use std::convert::Infallible;
use url::form_urlencoded;

const FILTER_PREFIX: &str = "filter.";
const LIST_SEPARATOR: char = ',';
const SORT_SEPARATOR: char = ':';

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
}

impl PaginateQuery {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// `path` is the request URL without its query string; links are built
    /// from it.
    #[must_use]
    pub fn from_query_string(path: impl Into<String>, query: &str) -> Self {
        let mut parsed = Self::new(path);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => parsed.page = value.trim().parse().ok(),
                "limit" => parsed.limit = value.trim().parse().ok(),
                "sortBy" => {
                    let (column, direction) = value.split_once(SORT_SEPARATOR).unwrap_or((value.as_ref(), ""));
                    parsed
                        .sort_by
                        .get_or_insert_with(Vec::new)
                        .push((column.to_owned(), direction.to_owned()));
                }
                "search" => parsed.search = Some(value.into_owned()),
                "searchBy" => parsed
                    .search_by
                    .get_or_insert_with(Vec::new)
                    .extend(split_list(&value)),
                "select" => parsed
                    .select
                    .get_or_insert_with(Vec::new)
                    .extend(split_list(&value)),
                "cursor" => parsed.cursor = Some(value.into_owned()),
                other => {
                    if let Some(column) = other.strip_prefix(FILTER_PREFIX)
                        && !column.is_empty()
                    {
                        parsed = parsed.with_filter(column, value.into_owned());
                    }
                }
            }
        }
        parsed
    }
}

impl<S> FromRequestParts<S> for PaginateQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|host| host.to_str().ok())
            .or_else(|| parts.uri.host())
            .unwrap_or("localhost");
        let scheme = parts.uri.scheme_str().unwrap_or("http");
        let path = format!("{scheme}://{host}{}", parts.uri.path());

        Ok(Self::from_query_string(path, parts.uri.query().unwrap_or_default()))
    }
}
