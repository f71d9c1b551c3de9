//! Page arithmetic for the catalog grid.
//!
//! Pages are 1-based. The numbered window shows at most
//! [`WINDOW_SIZE`] buttons centred on the current page, with shortcuts to the
//! first and last page and ellipses where pages are skipped.

/// Products per catalog page.
pub const PAGE_SIZE: usize = 9;

/// Maximum numbered buttons in the page window.
pub const WINDOW_SIZE: usize = 5;

/// One slot in the rendered page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Page(usize),
    Ellipsis,
}

/// Position of the current page within a filtered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current: usize,
    total_pages: usize,
    total_items: usize,
}

/// `ceil(items / PAGE_SIZE)`.
#[must_use]
pub const fn total_pages(items: usize) -> usize {
    items.div_ceil(PAGE_SIZE)
}

impl Pagination {
    /// Pagination for `total_items` results with `requested` clamped to
    /// `1..=max(total_pages, 1)`.
    #[must_use]
    pub fn new(requested: usize, total_items: usize) -> Self {
        let total_pages = total_pages(total_items);
        Self {
            current: requested.clamp(1, total_pages.max(1)),
            total_pages,
            total_items,
        }
    }

    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_pages
    }

    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.total_items
    }

    /// Page controls are only shown when there is more than one page.
    #[must_use]
    pub const fn is_needed(&self) -> bool {
        self.total_pages > 1
    }

    #[must_use]
    pub const fn prev(&self) -> Option<usize> {
        if self.current > 1 {
            Some(self.current - 1)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn next(&self) -> Option<usize> {
        if self.current < self.total_pages {
            Some(self.current + 1)
        } else {
            None
        }
    }

    /// Index range of the current page into the filtered list.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = ((self.current - 1) * PAGE_SIZE).min(self.total_items);
        let end = (start + PAGE_SIZE).min(self.total_items);
        start..end
    }

    /// The items on the current page.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        items.get(self.range()).unwrap_or_default()
    }

    /// Numbered buttons and ellipses for the page window.
    #[must_use]
    pub fn window(&self) -> Vec<PageSlot> {
        if self.total_pages == 0 {
            return Vec::new();
        }

        let total = self.total_pages;
        let mut start = self.current.saturating_sub(WINDOW_SIZE / 2).max(1);
        let end = (start + WINDOW_SIZE - 1).min(total);
        if end + 1 - start < WINDOW_SIZE {
            start = (end + 1).saturating_sub(WINDOW_SIZE).max(1);
        }

        let mut slots = Vec::with_capacity(WINDOW_SIZE + 4);
        if start > 1 {
            slots.push(PageSlot::Page(1));
            if start > 2 {
                slots.push(PageSlot::Ellipsis);
            }
        }
        slots.extend((start..=end).map(PageSlot::Page));
        if end < total {
            if end < total - 1 {
                slots.push(PageSlot::Ellipsis);
            }
            slots.push(PageSlot::Page(total));
        }
        slots
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::PageSlot::{Ellipsis, Page};
    use super::*;

    #[test]
    fn test_total_pages_is_ceil() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(9), 1);
        assert_eq!(total_pages(10), 2);
        assert_eq!(total_pages(27), 3);
        assert_eq!(total_pages(28), 4);
    }

    #[test]
    fn test_pages_concatenate_to_input() {
        for n in [0_usize, 1, 8, 9, 10, 26, 27, 50] {
            let items: Vec<usize> = (0..n).collect();
            let pages = total_pages(n);
            let joined: Vec<usize> = (1..=pages)
                .flat_map(|p| Pagination::new(p, n).slice(&items).to_vec())
                .collect();
            assert_eq!(joined, items, "n = {n}");
        }
    }

    #[test]
    fn test_page_is_clamped() {
        assert_eq!(Pagination::new(0, 20).current(), 1);
        assert_eq!(Pagination::new(99, 20).current(), 3);
        assert_eq!(Pagination::new(5, 0).current(), 1);
        let last = Pagination::new(99, 20);
        assert_eq!(last.slice(&(0..20).collect::<Vec<_>>()), &[18, 19]);
    }

    #[test]
    fn test_prev_next() {
        let first = Pagination::new(1, 30);
        assert_eq!(first.prev(), None);
        assert_eq!(first.next(), Some(2));
        let last = Pagination::new(4, 30);
        assert_eq!(last.prev(), Some(3));
        assert_eq!(last.next(), None);
        assert!(!Pagination::new(1, 9).is_needed());
    }

    fn window(current: usize, pages: usize) -> Vec<PageSlot> {
        Pagination::new(current, pages * PAGE_SIZE).window()
    }

    #[test]
    fn test_window_few_pages() {
        assert_eq!(window(1, 3), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(window(2, 5), vec![Page(1), Page(2), Page(3), Page(4), Page(5)]);
        assert!(Pagination::new(1, 0).window().is_empty());
    }

    #[test]
    fn test_window_at_start() {
        assert_eq!(
            window(1, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn test_window_in_middle() {
        assert_eq!(
            window(5, 10),
            vec![
                Page(1),
                Ellipsis,
                Page(3),
                Page(4),
                Page(5),
                Page(6),
                Page(7),
                Ellipsis,
                Page(10)
            ]
        );
    }

    #[test]
    fn test_window_at_end() {
        assert_eq!(
            window(10, 10),
            vec![Page(1), Ellipsis, Page(6), Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn test_window_adjacent_edges_skip_ellipsis() {
        // start == 2: page 1 shortcut without ellipsis
        assert_eq!(
            window(4, 7),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Page(7)]
        );
    }
}
