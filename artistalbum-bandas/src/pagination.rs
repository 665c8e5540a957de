//! Pagination utilities
//!
//! Pages are zero-based. Bands are always sorted by name; the caller only
//! picks the direction.

use artistalbum_common::{Error, Result};
use serde::Serialize;

/// Page size when the caller gives none
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Sort direction for the band name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `"desc"` in any case means descending; anything else is ascending
    pub fn parse_lenient(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub direction: SortDirection,
}

impl PageRequest {
    pub fn new(page: i64, size: i64, direction: SortDirection) -> Result<Self> {
        if page < 0 {
            return Err(Error::InvalidInput(format!(
                "page must not be negative (got {})",
                page
            )));
        }
        if size < 1 {
            return Err(Error::InvalidInput(format!(
                "size must be at least 1 (got {})",
                size
            )));
        }

        Ok(Self {
            page,
            size,
            direction,
        })
    }

    /// Offset for SQL LIMIT/OFFSET, saturating for absurd page numbers
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// Calculate total page count for `total_results` rows
///
/// # Examples
/// ```
/// use artistalbum_bandas::pagination::total_pages;
///
/// assert_eq!(total_pages(5, 2), 3);
/// assert_eq!(total_pages(4, 2), 2);
/// assert_eq!(total_pages(0, 10), 0);
/// ```
pub fn total_pages(total_results: i64, size: i64) -> i64 {
    if size <= 0 || total_results <= 0 {
        return 0;
    }
    (total_results - 1) / size + 1
}

/// One page of results with its position in the whole result set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let total_pages = total_pages(total_elements, request.size);
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
            first: request.page == 0,
            last: request.page.saturating_add(1) >= total_pages,
        }
    }
}
