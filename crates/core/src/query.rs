//! Pagination shared by every listing.
//!
//! Page numbers follow the usual paginator rules: a missing or non-numeric
//! page means the first page, and a number outside `1..=total_pages` is
//! clamped to the nearest valid page. An empty collection still has one
//! (empty) page.

use serde::Serialize;

/// A requested page before the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based, not yet clamped to the last page.
    pub page: u64,
    /// Items per page, at least one.
    pub per_page: u64,
}

impl PageRequest {
    /// Build a request from a raw `page` query value and a fixed page size.
    #[must_use]
    pub fn parse(page: Option<&str>, per_page: u64) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .map_or(1, |p| u64::try_from(p.max(1)).unwrap_or(1));

        Self {
            page,
            per_page: per_page.max(1),
        }
    }

    /// Build a request whose page size comes from the client, as the JSON
    /// listing allows. Missing, non-numeric or non-positive sizes fall back
    /// to `default`; larger ones are capped at `max`.
    #[must_use]
    pub fn parse_sized(page: Option<&str>, per_page: Option<&str>, default: u64, max: u64) -> Self {
        let per_page = per_page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p > 0)
            .map_or(default, |p| u64::try_from(p).unwrap_or(default).min(max));

        Self::parse(page, per_page)
    }

    /// Number of pages for `total` items; never zero.
    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        if total == 0 {
            1
        } else {
            total.div_ceil(self.per_page)
        }
    }

    /// The requested page clamped to what exists.
    #[must_use]
    pub fn resolve(&self, total: u64) -> u64 {
        self.page.clamp(1, self.total_pages(total))
    }

    /// Row offset of the resolved page.
    #[must_use]
    pub fn offset(&self, total: u64) -> u64 {
        (self.resolve(total) - 1) * self.per_page
    }

    /// Wrap one page of items.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>, total: u64) -> Paginated<T> {
        let total_pages = self.total_pages(total);
        let current_page = self.resolve(total);

        Paginated {
            items,
            total,
            total_pages,
            current_page,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Items across all pages.
    pub total: u64,
    /// Never zero, even for an empty listing.
    pub total_pages: u64,
    /// 1-based page actually served after clamping.
    pub current_page: u64,
    /// A later page exists.
    pub has_next: bool,
    /// An earlier page exists.
    pub has_previous: bool,
}

impl<T> Paginated<T> {
    /// Convert the items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            total_pages: self.total_pages,
            current_page: self.current_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
