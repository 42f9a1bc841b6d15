//! Paginator state for post lists.
//!
//! The paginator never talks to the network. It turns user intent (go to
//! page N, change page size) into the next `(page, page_size)` request, or
//! `None` when the intent is a no-op.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
use crate::error::AppError;
use crate::models::PaginatedResponse;

/// Parameters for one page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    current: PageRequest,
    total_count: u64,
    total_pages: u32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self {
            current: PageRequest::default(),
            total_count: 0,
            total_pages: 1,
        }
    }

    /// Sync with the page the server returned
    pub fn observe<T>(&mut self, response: &PaginatedResponse<T>) {
        self.current = PageRequest {
            page: response.page.max(1),
            page_size: response.page_size,
        };
        self.total_count = response.total_count;
        self.total_pages = response.total_pages();
    }

    pub fn current(&self) -> PageRequest {
        self.current
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Controls are only shown when there is somewhere to go
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }

    pub fn has_previous(&self) -> bool {
        self.current.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current.page < self.total_pages
    }

    /// Move to `page`. Out-of-range pages and the current page are no-ops.
    pub fn go_to(&mut self, page: u32) -> Option<PageRequest> {
        if page < 1 || page > self.total_pages || page == self.current.page {
            return None;
        }
        self.current.page = page;
        Some(self.current)
    }

    pub fn next(&mut self) -> Option<PageRequest> {
        self.go_to(self.current.page.saturating_add(1))
    }

    pub fn previous(&mut self) -> Option<PageRequest> {
        self.go_to(self.current.page.saturating_sub(1))
    }

    /// Change the page size; always restarts at page 1.
    pub fn set_page_size(&mut self, page_size: u32) -> Result<Option<PageRequest>, AppError> {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(AppError::validation(format!(
                "page size must be one of {:?}",
                PAGE_SIZE_OPTIONS
            )));
        }
        if page_size == self.current.page_size {
            return Ok(None);
        }
        self.current = PageRequest {
            page: DEFAULT_PAGE,
            page_size,
        };
        Ok(Some(self.current))
    }

    /// 1-based `(first, last)` item positions on the current page, or None
    /// when the collection is empty
    pub fn showing(&self) -> Option<(u64, u64)> {
        if self.total_count == 0 {
            return None;
        }
        let size = u64::from(self.current.page_size);
        let first = u64::from(self.current.page - 1) * size + 1;
        let last = (first + size - 1).min(self.total_count);
        Some((first, last))
    }

    /// "Showing 11 to 20 of 42"
    pub fn summary(&self) -> String {
        match self.showing() {
            Some((first, last)) => {
                format!("Showing {} to {} of {}", first, last, self.total_count)
            }
            None => "No results".to_string(),
        }
    }
}
