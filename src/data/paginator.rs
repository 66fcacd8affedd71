use crate::error::ViewError;
use serde::{Deserialize, Serialize};

/// Page sizes offered by the rows-per-page selector. Any positive size works.
pub const RECOMMENDED_PAGE_SIZES: [usize; 6] = [20, 50, 100, 1000, 5000, 10000];

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Links shown either side of the active page
const LINK_RADIUS: usize = 2;

/// Current page (1-based) and page size, owned by whoever renders the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    number: usize,
    rows: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            number: 1,
            rows: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageState {
    pub fn new(number: usize, rows: usize) -> Result<Self, ViewError> {
        if rows == 0 {
            return Err(ViewError::InvalidPageSize(rows));
        }
        if number == 0 {
            return Err(ViewError::InvalidPageNumber(number));
        }
        Ok(Self { number, rows })
    }

    pub fn first(rows: usize) -> Result<Self, ViewError> {
        Self::new(1, rows)
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Move to another page, keeping the page size
    pub fn go_to(self, number: usize) -> Result<Self, ViewError> {
        Self::new(number, self.rows)
    }

    /// Change the page size. Pagination always restarts at page 1.
    pub fn with_rows(self, rows: usize) -> Result<Self, ViewError> {
        let next = Self::first(rows)?;
        if next.rows != self.rows {
            tracing::debug!(target: "page", "Page size {} -> {}, back to page 1", self.rows, rows);
        }
        Ok(next)
    }

    /// Index of the first row on this page
    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1).saturating_mul(self.rows)
    }

    pub fn last_page(&self, total: usize) -> usize {
        Paginator::last_page(total, self.rows)
    }

    /// Reset to page 1 when the page no longer exists for `total` rows.
    ///
    /// Returns true when the page was reset.
    pub fn clamp_to(&mut self, total: usize) -> bool {
        let last = self.last_page(total);
        if self.number > last {
            tracing::debug!(
                target: "page",
                "Page {} is past last page {} ({} rows), resetting to 1",
                self.number,
                last,
                total
            );
            self.number = 1;
            true
        } else {
            false
        }
    }
}

/// One entry in the page link strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageLink {
    Page { number: usize, active: bool },
    Ellipsis,
}

pub struct Paginator;

impl Paginator {
    /// Rows on the current page; empty past the end, never wraps.
    pub fn slice<'a, T>(rows: &'a [T], page: &PageState) -> &'a [T] {
        let start = page.offset();
        if start >= rows.len() {
            return &[];
        }
        let end = start.saturating_add(page.rows).min(rows.len());
        &rows[start..end]
    }

    /// Number of the last page, at least 1 even for an empty dataset
    pub fn last_page(total: usize, rows_per_page: usize) -> usize {
        if rows_per_page == 0 {
            return 1;
        }
        total.div_ceil(rows_per_page).max(1)
    }

    /// Page links around the active page, with the first and last page
    /// reachable through ellipses once they fall out of the window.
    ///
    /// Empty when everything fits on one page.
    pub fn page_links(total: usize, page: &PageState) -> Vec<PageLink> {
        let last = page.last_page(total);
        let active = page.number();
        if total == 0 || total < page.rows() || last == 1 {
            return Vec::new();
        }

        let (mut start, mut end) = (1, last);
        if last > 5 {
            if active > LINK_RADIUS + 1 {
                start = active - LINK_RADIUS;
            }
            if active + LINK_RADIUS < last {
                end = active + LINK_RADIUS;
            }
        }

        let mut links = Vec::new();
        if start > 1 {
            links.push(PageLink::Page {
                number: 1,
                active: false,
            });
            links.push(PageLink::Ellipsis);
        }
        for number in start..=end {
            links.push(PageLink::Page {
                number,
                active: number == active,
            });
        }
        if end < last {
            links.push(PageLink::Ellipsis);
            links.push(PageLink::Page {
                number: last,
                active: false,
            });
        }
        links
    }
}
