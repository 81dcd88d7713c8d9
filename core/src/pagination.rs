//! Page arithmetic for the users table.
//!
//! Pages are 1-based. The server only knows `skip`/`limit`; `count` in the
//! list envelope is the total, so it alone decides whether a next page
//! exists.

use crate::client::Call;
use crate::services::UsersService;
use crate::types::UsersPublic;

pub const DEFAULT_PER_PAGE: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

impl Pagination {
    /// `page` and `per_page` are clamped to at least 1.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self, count: u64) -> bool {
        self.skip().saturating_add(self.limit()) < count
    }

    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.per_page)
    }

    pub fn previous(&self) -> Self {
        Self::new(self.page.saturating_sub(1), self.per_page)
    }
}

impl<'a> UsersService<'a> {
    pub fn list_page(&self, pagination: &Pagination) -> Call<'a, UsersPublic> {
        self.list(pagination.skip(), pagination.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn first_page_has_no_previous() {
        let page = Pagination::default();
        assert_eq!(page.skip(), 0);
        assert!(!page.has_previous());
        assert!(page.previous().page() == 1);
    }

    #[rstest]
    #[case(1, 5, 12, true)]
    #[case(2, 5, 12, true)]
    #[case(3, 5, 12, false)]
    #[case(2, 5, 10, false)]
    #[case(1, 5, 0, false)]
    fn next_depends_on_total_count(
        #[case] page: u64,
        #[case] per_page: u64,
        #[case] count: u64,
        #[case] expected: bool,
    ) {
        assert_eq!(Pagination::new(page, per_page).has_next(count), expected);
    }

    #[test]
    fn zero_inputs_are_clamped() {
        let page = Pagination::new(0, 0);
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), 1);
    }

    #[test]
    fn navigation_moves_by_one_page() {
        let page = Pagination::new(1, 5).next().next();
        assert_eq!(page.page(), 3);
        assert_eq!(page.skip(), 10);
        assert!(page.has_previous());
        assert_eq!(page.previous().skip(), 5);
    }
}
