//! Plain paging types for the query surface.
//!
//! No framework wrapper: page index (zero-based), page size, total counts and
//! the items themselves, all serializable.

use serde::{Deserialize, Serialize};

/// A zero-based page request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Offset of the first item of this page in the full ordering.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// An empty page for the given request (e.g. filter by an unknown actor).
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            page: request.page,
            size: request.size,
            total_items: 0,
            total_pages: 0,
        }
    }

    /// Slice a page out of an already-ordered full result set.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total_items = all.len();
        let total_pages = if request.size == 0 {
            0
        } else {
            total_items.div_ceil(request.size)
        };
        let items: Vec<T> = all
            .into_iter()
            .skip(request.offset())
            .take(request.size)
            .collect();
        Self {
            items,
            page: request.page,
            size: request.size,
            total_items,
            total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
