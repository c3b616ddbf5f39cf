//! Page slicing for list views.

use serde::{Deserialize, Serialize};

/// One page of a longer list. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
}

impl<T> Page<T> {
    /// Cut page `page` out of `all`.
    ///
    /// Page 0 is treated as page 1. A page past the end is empty rather than
    /// an error.
    #[must_use]
    pub fn paginate(all: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total = all.len();
        let pages = total.div_ceil(per_page);
        let skip = (page - 1).saturating_mul(per_page);
        let items = all.into_iter().skip(skip).take(per_page).collect();
        Self {
            items,
            page,
            per_page,
            total,
            pages,
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Convert the items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_middle_page() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.pages, 3);
        assert!(page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn last_page_is_partial() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert!(!page.has_next());
    }

    #[test]
    fn out_of_range_is_empty_not_error() {
        let page = Page::paginate(vec![1, 2, 3], 9, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn page_zero_means_first() {
        let page = Page::paginate(vec![1, 2, 3], 0, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec![1, 2]);
    }

    #[test]
    fn empty_list_has_no_pages() {
        let page: Page<u8> = Page::paginate(Vec::new(), 1, 20);
        assert_eq!(page.pages, 0);
        assert!(!page.has_next());
    }
}
