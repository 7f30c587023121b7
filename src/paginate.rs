use std::ops::Range;

use serde::Serialize;

/// Page metadata for a collection of `total_items`, with `window` being the
/// index range of the current page's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub window: Range<usize>,
}

impl Pagination {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Never fails: a zero page size is treated as one, and zero items still
/// define a single empty page. `requested_page` is clamped into
/// `[1, total_pages]`.
pub fn paginate(total_items: usize, page_size: usize, requested_page: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_items.div_ceil(page_size).max(1);
    let current_page = requested_page.clamp(1, total_pages);
    let start = ((current_page - 1) * page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);
    Pagination {
        current_page,
        total_pages,
        page_size,
        total_items,
        window: start..end,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
}

impl<T> PageResult<T> {
    /// Client-side pagination of a full, unpaginated collection.
    pub fn slice(mut all: Vec<T>, page_size: usize, requested_page: usize) -> Self {
        let pagination = paginate(all.len(), page_size, requested_page);
        all.truncate(pagination.window.end);
        let items = all.split_off(pagination.window.start);
        Self {
            items,
            current_page: pagination.current_page,
            total_pages: pagination.total_pages,
        }
    }

    /// A page the server already cut; `reported_pages` is trusted but still
    /// floored at one.
    pub fn from_server(items: Vec<T>, reported_pages: usize, requested_page: usize) -> Self {
        let total_pages = reported_pages.max(1);
        Self {
            items,
            current_page: requested_page.clamp(1, total_pages),
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn map_items<U, F>(self, f: F) -> PageResult<U>
    where
        F: FnOnce(Vec<T>) -> Vec<U>,
    {
        PageResult {
            items: f(self.items),
            current_page: self.current_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_is_one_empty_page() {
        let page = paginate(0, 20, 5);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.window, 0..0);
        assert!(!page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn out_of_range_request_clamps_to_last_page() {
        let page = paginate(45, 20, 99);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.window, 40..45);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn page_zero_clamps_to_first_page() {
        let page = paginate(45, 20, 0);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.window, 0..20);
        assert!(page.has_next());
    }

    #[test]
    fn current_page_always_within_bounds() {
        for total in [0usize, 1, 19, 20, 21, 100, 101] {
            for size in [1usize, 7, 20, 1000] {
                for requested in [0usize, 1, 2, 6, 500, usize::MAX] {
                    let page = paginate(total, size, requested);
                    assert!(page.total_pages >= 1);
                    assert!((1..=page.total_pages).contains(&page.current_page));
                    assert!(page.window.end - page.window.start <= size);
                }
            }
        }
    }

    #[test]
    fn slice_takes_the_clamped_window() {
        let page = PageResult::slice((1..=45).collect::<Vec<_>>(), 20, 3);
        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn server_pages_floor_at_one() {
        let page = PageResult::<u8>::from_server(Vec::new(), 0, 4);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
    }
}
