//! List/export request parameters parsed from untrusted query strings.
//!
//! Pagination policy: `page` and `limit` that are missing, non-numeric, zero or
//! negative fall back to the defaults silently; `limit` is clamped to [`MAX_LIMIT`].

use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 1000;

/// Query keys with a fixed meaning; every other key is a column filter candidate.
const RESERVED_KEYS: &[&str] = &["page", "limit", "search", "sort", "order", "format"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRequest {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: SortOrder,
    /// Candidate filters keyed by request name. Names are checked against the resource when SQL is built.
    pub filters: BTreeMap<String, String>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        QueryRequest {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            sort: None,
            order: SortOrder::Desc,
            filters: BTreeMap::new(),
        }
    }
}

fn positive_or(raw: Option<&String>, default: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(default)
}

fn non_empty(raw: Option<&String>) -> Option<String> {
    raw.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl QueryRequest {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let filters = params
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .collect();
        QueryRequest {
            page: positive_or(params.get("page"), DEFAULT_PAGE),
            limit: positive_or(params.get("limit"), DEFAULT_LIMIT).min(MAX_LIMIT),
            search: non_empty(params.get("search")),
            sort: non_empty(params.get("sort")),
            order: params
                .get("order")
                .map(|s| SortOrder::parse(s))
                .unwrap_or_default(),
            filters,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

/// `ceil(total / limit)`; zero when there are no rows.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}
