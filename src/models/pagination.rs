//! Pagination and sorting types for list queries

use serde::{Deserialize, Serialize};

/// Raw pagination input as received from a caller.
///
/// Values are kept as strings because they may be missing, non-numeric or
/// non-positive; `services::pagination` turns them into a [`PageRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

impl ListQuery {
    pub fn page(mut self, page: impl ToString) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn limit(mut self, limit: impl ToString) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order.into());
        self
    }
}

/// Post fields a list may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Views,
    Status,
    IsFeatured,
}

impl SortField {
    /// Parse a caller-supplied field name; accepts camelCase and snake_case
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "updatedAt" | "updated_at" => Some(Self::UpdatedAt),
            "title" => Some(Self::Title),
            "views" => Some(Self::Views),
            "status" => Some(Self::Status),
            "isFeatured" | "is_featured" => Some(Self::IsFeatured),
            _ => None,
        }
    }

    /// Column name in the posts table
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
            Self::Views => "views",
            Self::Status => "status",
            Self::IsFeatured => "is_featured",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validated ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

/// Normalized pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub limit: u32,
    pub sort: Sort,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: Sort::default(),
        }
    }
}

impl PageRequest {
    /// Rows to skip: `(page - 1) * limit`, saturating at `i64::MAX`
    pub fn skip(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)).saturating_mul(i64::from(self.limit))
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of matching items across all pages
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    /// `ceil(total / limit)`
    pub total_pages: i64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let limit = i64::from(request.limit.max(1));
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
            total_pages: (total.max(0) + limit - 1) / limit,
        }
    }

    pub fn has_next(&self) -> bool {
        i64::from(self.page) < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
