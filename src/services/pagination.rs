//! Pagination and sort normalizer
//!
//! Raw list parameters may be missing, non-numeric or non-positive. Each
//! such value falls back to its default instead of failing the request.

use crate::config::PaginationConfig;
use crate::models::{ListQuery, PageRequest, Sort, SortField, SortOrder};

/// Normalizes caller-supplied paging and sorting
#[derive(Debug, Clone, Copy)]
pub struct PaginationNormalizer {
    default_limit: u32,
    max_limit: Option<u32>,
}

impl Default for PaginationNormalizer {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: None,
        }
    }
}

impl From<&PaginationConfig> for PaginationNormalizer {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            default_limit: config.default_limit.max(1),
            max_limit: config.max_limit,
        }
    }
}

impl PaginationNormalizer {
    pub fn normalize(&self, query: &ListQuery) -> PageRequest {
        let page = parse_positive(query.page.as_deref()).unwrap_or(1);
        let mut limit = parse_positive(query.limit.as_deref()).unwrap_or(self.default_limit);
        if let Some(max) = self.max_limit {
            limit = limit.min(max);
        }

        PageRequest {
            page,
            limit,
            sort: normalize_sort(query.sort_by.as_deref(), query.sort_order.as_deref()),
        }
    }
}

/// A strictly positive integer, or `None`
fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

fn normalize_sort(field: Option<&str>, order: Option<&str>) -> Sort {
    let Some(name) = field.filter(|f| !f.trim().is_empty()) else {
        return Sort::default();
    };

    match SortField::parse(name) {
        Some(field) => {
            let order = order
                .and_then(|o| {
                    let parsed = SortOrder::parse(o);
                    if parsed.is_none() {
                        tracing::warn!("Ignoring unknown sort order {:?}", o);
                    }
                    parsed
                })
                .unwrap_or_default();
            Sort { field, order }
        }
        None => {
            tracing::warn!("Ignoring unknown sort field {:?}", name);
            Sort::default()
        }
    }
}
