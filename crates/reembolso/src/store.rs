//! Shared record-store contract pieces.
//!
//! The persistence layer is a generic record store reachable through simple
//! filter/insert/update/delete operations; each aggregate defines its own
//! repository trait next to its domain types and reuses the error and
//! pagination vocabulary below.

use serde::{Deserialize, Serialize};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// One-based page selector carried by listing endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default = "PageRequest::default_page")]
    pub page: usize,
    #[serde(default = "PageRequest::default_limit")]
    pub limit: usize,
}

impl PageRequest {
    const fn default_page() -> usize {
        1
    }

    const fn default_limit() -> usize {
        20
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Apply this selector to an already-ordered full result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let data: Vec<T> = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit.max(1))
            .collect();
        Page {
            data,
            page: self.page.max(1),
            limit: self.limit.max(1),
            total,
            total_pages: total.div_ceil(self.limit.max(1)),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::default_page(),
            limit: Self::default_limit(),
        }
    }
}

/// Paginated listing response.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_slices_and_counts() {
        let page = PageRequest { page: 2, limit: 3 };
        let result = page.paginate((1..=8).collect::<Vec<_>>());
        assert_eq!(result.data, vec![4, 5, 6]);
        assert_eq!(result.total, 8);
        assert_eq!(result.total_pages, 3);
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let page = PageRequest { page: 9, limit: 10 };
        let result = page.paginate(vec![1, 2, 3]);
        assert!(result.data.is_empty());
        assert_eq!(result.total, 3);
        assert_eq!(result.total_pages, 1);
    }
}
