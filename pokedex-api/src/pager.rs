//! # Pagination
//!
//! [`Pager`] holds the 0-based page of a list view and moves between pages.
//! Page numbers typed by a user are 1-based; [`Pager::go_to`] converts them.
//!
//! [`DetailNav`] steps through detail ids, wrapping from the last id to the first.

use serde::Serialize;

use crate::{DEFAULT_CATALOG_SIZE, Result, error::PokedexError};

/// Page position within a list of `total` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pager {
    /// 0-based current page
    pub page: usize,
    /// Number of entries across all pages
    pub total: usize,
    pub page_size: usize,
}

impl Pager {
    pub fn new(page: usize, total: usize, page_size: usize) -> Self {
        Self {
            page,
            total,
            page_size,
        }
    }

    /// Number of pages; 0 for an empty list or a zero page size.
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }

    /// Current page as shown to users (1-based).
    pub fn display_page(&self) -> usize {
        self.page.saturating_add(1)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages().saturating_sub(1)
    }

    /// Moves back one page. No-op on the first page.
    pub fn previous(&mut self) {
        if self.has_previous() {
            self.page -= 1;
        }
    }

    /// Moves forward one page. No-op on the last page.
    pub fn next(&mut self) {
        if self.has_next() {
            self.page += 1;
        }
    }

    /// Jumps to 1-based page `number`. Out of range numbers are rejected
    /// and the current page is kept.
    pub fn go_to(&mut self, number: usize) -> Result<()> {
        let total_pages = self.total_pages();
        if number == 0 || number > total_pages {
            return Err(PokedexError::PageOutOfRange {
                requested: number,
                total_pages,
            });
        }
        self.page = number - 1;
        Ok(())
    }

    /// Jumps to the page typed in a page-number box. Leading whitespace and
    /// trailing non-digits are ignored, so `"3 "` and `"3rd"` both mean 3.
    pub fn go_to_input(&mut self, input: &str) -> Result<()> {
        let trimmed = input.trim_start();
        let digits = trimmed
            .find(|ch: char| !ch.is_ascii_digit())
            .map_or(trimmed, |end| &trimmed[..end]);
        let number = digits.parse::<usize>().unwrap_or(0);
        self.go_to(number)
    }

    /// Page controls are only shown when there is more than one page.
    pub fn shows_navigation(&self) -> bool {
        self.total_pages() > 1
    }
}

/// Previous/next navigation between detail ids, circular over `1..=catalog_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetailNav {
    pub id: u32,
    pub catalog_size: u32,
}

impl DetailNav {
    pub fn new(id: u32, catalog_size: u32) -> Self {
        Self {
            id,
            catalog_size: catalog_size.max(1),
        }
    }

    pub fn previous_id(&self) -> u32 {
        if self.id <= 1 || self.id > self.catalog_size {
            self.catalog_size
        } else {
            self.id - 1
        }
    }

    pub fn next_id(&self) -> u32 {
        if self.id >= self.catalog_size {
            1
        } else {
            self.id + 1
        }
    }
}

impl Default for DetailNav {
    fn default() -> Self {
        Self::new(1, DEFAULT_CATALOG_SIZE)
    }
}
