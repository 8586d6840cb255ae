//! Page selection shared by the list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation failures for [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    #[error("page must be at least 1")]
    PageOutOfRange,
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange { max: u32 },
}

/// A validated page number and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate optional query values, applying `default_limit` when absent.
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self, PageRequestError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(PageRequestError::PageOutOfRange);
        }
        let limit = limit.unwrap_or(default_limit);
        if limit == 0 || limit > max_limit {
            return Err(PageRequestError::LimitOutOfRange { max: max_limit });
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Slice `items` to this page.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let limit = self.limit as usize;
        let offset = (self.page as usize - 1).saturating_mul(limit);
        let items = items.into_iter().skip(offset).take(limit).collect();
        Page {
            items,
            total,
            page: self.page,
            limit: self.limit,
            pages: total.div_ceil(limit).max(1),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    /// Always at least 1, even for empty results.
    pub pages: usize,
}

impl<T> Page<T> {
    /// Convert the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(0), None, PageRequestError::PageOutOfRange)]
    #[case(None, Some(0), PageRequestError::LimitOutOfRange { max: 100 })]
    #[case(None, Some(101), PageRequestError::LimitOutOfRange { max: 100 })]
    fn rejects_out_of_range(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected: PageRequestError,
    ) {
        assert_eq!(PageRequest::new(page, limit, 50, 100), Err(expected));
    }

    #[rstest]
    #[case(1, 2, vec![1, 2], 3)]
    #[case(3, 2, vec![5], 3)]
    #[case(4, 2, vec![], 3)]
    fn slices_pages(
        #[case] page: u32,
        #[case] limit: u32,
        #[case] expected: Vec<i32>,
        #[case] pages: usize,
    ) {
        let request = PageRequest::new(Some(page), Some(limit), 50, 100).expect("valid");
        let result = request.apply(vec![1, 2, 3, 4, 5]);
        assert_eq!(result.items, expected);
        assert_eq!(result.total, 5);
        assert_eq!(result.pages, pages);
    }

    #[rstest]
    fn empty_results_report_one_page() {
        let request = PageRequest::new(None, None, 50, 100).expect("defaults");
        let result = request.apply(Vec::<u8>::new());
        assert_eq!((result.limit, result.pages), (50, 1));
    }
}
