//! Pagination types
//!
//! [`PageRequest`] goes into the store, [`Page`] comes back out of it, and
//! [`PageResult`] is the envelope serialized to clients.

use serde::Serialize;

use crate::error::AppError;

/// Default zero-indexed page number
pub const DEFAULT_PAGE: i64 = 0;
/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A validated, zero-indexed page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl PageRequest {
    /// Build a page request
    ///
    /// # Returns
    /// * `Ok(PageRequest)` - `page >= 0` and `size >= 1`
    /// * `Err(AppError::BadRequest)` - otherwise
    pub fn new(page: i64, size: i64) -> Result<Self, AppError> {
        if page < 0 {
            return Err(AppError::BadRequest(format!(
                "page must not be negative, got {}",
                page
            )));
        }
        if size < 1 {
            return Err(AppError::BadRequest(format!(
                "size must be at least 1, got {}",
                size
            )));
        }
        if page.checked_mul(size).is_none() {
            return Err(AppError::BadRequest(format!(
                "page {} with size {} is out of range",
                page, size
            )));
        }
        Ok(Self { page, size })
    }

    /// Zero-indexed page number
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Records per page
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Number of records to skip
    pub fn offset(&self) -> i64 {
        self.page * self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One slice of a query result, as returned by a store
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records on this page
    pub content: Vec<T>,
    /// Total number of records matching the query
    pub total_elements: i64,
    /// The request that produced this page
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(content: Vec<T>, total_elements: i64, request: PageRequest) -> Self {
        Self {
            content,
            total_elements,
            request,
        }
    }

    /// Number of pages needed to hold `total_elements`
    pub fn total_pages(&self) -> i64 {
        let size = self.request.size();
        self.total_elements / size + i64::from(self.total_elements % size != 0)
    }
}

/// Serializable pagination envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// Records on this page
    pub content: Vec<T>,
    /// Zero-indexed page number
    pub page_number: i64,
    /// Requested page size
    pub page_size: i64,
    /// Total number of matching records
    pub total_elements: i64,
    /// Total number of pages
    pub total_pages: i64,
}

impl<T> From<Page<T>> for PageResult<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            page_number: page.request.page(),
            page_size: page.request.size(),
            total_elements: page.total_elements,
            total_pages,
            content: page.content,
        }
    }
}
