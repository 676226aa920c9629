use crate::models::{PaginatedLinks, SortOrder};
use std::collections::BTreeMap;
use url::{Url, form_urlencoded};

/// Effective page and page size of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based
    pub page: u64,
    /// `0` while paginated means counts only
    pub limit: u64,
    pub paginated: bool,
}

impl PageWindow {
    /// Resolve the requested page and limit against the configured bounds.
    ///
    /// * missing or negative `limit` uses `default_limit`, capped like any other
    /// * `limit=0` with `max_limit == 0` disables pagination
    /// * `max_limit == 0` otherwise leaves the limit unbounded
    /// * `page` below 1 is page 1
    #[must_use]
    pub fn resolve(page: Option<i64>, limit: Option<i64>, default_limit: u64, max_limit: u64) -> Self {
        let page = page
            .and_then(|page| u64::try_from(page).ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);

        let explicit = limit.and_then(|limit| u64::try_from(limit).ok());
        if explicit == Some(0) && max_limit == 0 {
            return Self {
                page: 1,
                limit: 0,
                paginated: false,
            };
        }

        let requested = explicit.unwrap_or(default_limit);
        Self {
            page,
            limit: if max_limit == 0 { requested } else { requested.min(max_limit) },
            paginated: true,
        }
    }

    #[must_use]
    pub const fn is_counts_only(&self) -> bool {
        self.paginated && self.limit == 0
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)` while paginated, `0` for counts only and `1`
    /// without pagination.
    #[must_use]
    pub const fn total_pages(&self, total_items: u64) -> u64 {
        if !self.paginated {
            1
        } else if self.limit == 0 {
            0
        } else {
            total_items.div_ceil(self.limit)
        }
    }
}

/// Percent-encode a link value, keeping `:`, `,` and `$` readable.
fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace("%3A", ":")
        .replace("%2C", ",")
        .replace("%24", "$")
}

/// Base URL of every link: the request path, optionally stripped of scheme
/// and host or moved to another origin.
#[must_use]
pub fn link_base(path: &str, relative: bool, origin: Option<&str>) -> String {
    let Ok(url) = Url::parse(path) else {
        // already relative
        return match origin {
            Some(origin) if !relative => format!("{}{path}", origin.trim_end_matches('/')),
            _ => path.to_owned(),
        };
    };
    if relative {
        url.path().to_owned()
    } else if let Some(origin) = origin {
        format!("{}{}", origin.trim_end_matches('/'), url.path())
    } else {
        format!("{}{}", url.origin().ascii_serialization(), url.path())
    }
}

/// Request state carried by every link besides page, limit and cursor.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkState<'a> {
    pub sort_by: &'a [(String, SortOrder)],
    pub search: Option<&'a str>,
    /// Only when the client sent `searchBy`
    pub search_by: Option<&'a [String]>,
    /// Only when the client sent `select`
    pub select: Option<&'a [String]>,
    pub filter: Option<&'a BTreeMap<String, Vec<String>>>,
}

impl LinkState<'_> {
    fn options(&self) -> String {
        let mut options = String::new();
        for (column, order) in self.sort_by {
            options.push_str(&format!("&sortBy={}:{}", encode(column), order.as_str()));
        }
        if let Some(search) = self.search {
            options.push_str(&format!("&search={}", encode(search)));
        }
        for column in self.search_by.into_iter().flatten() {
            options.push_str(&format!("&searchBy={}", encode(column)));
        }
        if let Some(select) = self.select {
            options.push_str(&format!("&select={}", encode(&select.join(","))));
        }
        for (column, raw_values) in self.filter.into_iter().flatten() {
            for raw in raw_values {
                options.push_str(&format!("&filter.{}={}", encode(column), encode(raw)));
            }
        }
        options
    }

    /// Links for limit/offset pagination.
    #[must_use]
    pub fn page_links(&self, base: &str, window: PageWindow, total_items: u64) -> PaginatedLinks {
        let options = self.options();
        let total_pages = window.total_pages(total_items);
        let link = |page: u64| format!("{base}?page={page}&limit={}{options}", window.limit);
        let page = window.page;

        PaginatedLinks {
            first: (page != 1).then(|| link(1)),
            previous: (page > 1).then(|| link(page - 1)),
            current: link(page),
            next: (page < total_pages).then(|| link(page + 1)),
            last: (page != total_pages && total_pages > 0 && total_items > 0).then(|| link(total_pages)),
        }
    }

    /// Links for cursor pagination. There is no way back, so `previous` and
    /// `last` are never set.
    #[must_use]
    pub fn cursor_links(
        &self,
        base: &str,
        limit: u64,
        cursor: Option<&str>,
        next_cursor: Option<&str>,
    ) -> PaginatedLinks {
        let options = self.options();
        let link = |cursor: Option<&str>| {
            let mut link = format!("{base}?limit={limit}{options}");
            if let Some(cursor) = cursor {
                link.push_str(&format!("&cursor={}", encode(cursor)));
            }
            link
        };

        PaginatedLinks {
            first: cursor.is_some().then(|| link(None)),
            previous: None,
            current: link(cursor),
            next: next_cursor.map(|next| link(Some(next))),
            last: None,
        }
    }
}
