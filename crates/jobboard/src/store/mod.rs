pub mod memory;

pub use memory::MemoryStore;

use serde::Serialize;
use std::collections::HashMap;

/// Failure modes shared by every repository implementation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record violates a uniqueness constraint")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// One-based page selection. Callers validate bounds before building one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub const fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn skip(&self) -> usize {
        self.page.saturating_sub(1) as usize * self.limit as usize
    }

    /// Cuts an already filtered and sorted result set down to this page.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(self.skip())
            .take(self.limit as usize)
            .collect();
        Page {
            items,
            total,
            page: self.page,
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: request.page,
            limit: request.limit,
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as usize)
    }

    pub fn has_next_page(&self) -> bool {
        (self.page as usize) < self.total_pages()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: self.total,
            page: self.page,
            limit: self.limit,
        })
    }
}

/// One group of a grouped count, e.g. applications per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

/// `part` as a rounded percentage of `whole`; zero when there is nothing to compare against.
pub fn percentage(part: usize, whole: usize) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u64
}

/// Groups labels into buckets, largest first with ties broken by label.
pub fn tally<I, S>(labels: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.into()).or_default() += 1;
    }
    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(label, count)| Bucket { label, count })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_requested_window() {
        let page = PageRequest::new(2, 3).slice((1..=8).collect::<Vec<_>>());
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 8);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next_page());
        assert!(page.has_prev_page());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = PageRequest::new(5, 10).slice(vec!['a', 'b']);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages(), 1);
        assert!(!page.has_next_page());
    }

    #[test]
    fn tally_orders_by_count_then_label() {
        let buckets = tally(["Pending", "Accepted", "Pending", "Rejected"]);
        assert_eq!(
            buckets,
            vec![
                Bucket { label: "Pending".into(), count: 2 },
                Bucket { label: "Accepted".into(), count: 1 },
                Bucket { label: "Rejected".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn percentage_is_zero_for_empty_totals() {
        assert_eq!(percentage(3, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let page: Page<u8> = Page::empty(PageRequest::default());
        assert_eq!(page.total_pages(), 0);
        assert!(!page.has_next_page());
        assert!(!page.has_prev_page());
    }
}
