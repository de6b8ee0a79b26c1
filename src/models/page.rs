//! Pagination types shared by all listings

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{author::Author, book::BookSummary, instance::LoanDetails};

/// Note attached to the author and book listings for display
pub const LISTING_NOTE: &str = "This is just some data";

/// Page query parameter (1-based)
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
}

/// Offset/limit window of a 1-based page. Pages below 1 select nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn new(page: Option<i64>, per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1),
            per_page: per_page.max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.page < 1
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.per_page
        }
    }

    /// Slice an in-memory, already ordered collection
    pub fn slice<T: Clone>(&self, rows: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(0);
        rows.iter().skip(start).take(limit).cloned().collect()
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(AuthorPage = Page<Author>, BookPage = Page<BookSummary>, LoanPage = Page<LoanDetails>)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Rows of this page
    pub items: Vec<T>,
    /// Total number of rows across all pages
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Rows per page
    pub per_page: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, window: PageWindow) -> Self {
        Self {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            note: None,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}
