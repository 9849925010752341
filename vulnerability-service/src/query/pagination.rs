//! Page size / page number normalization.

use super::error::QueryError;

/// Page size that returns every match in one response.
pub const UNLIMITED_PAGE_SIZE: i64 = -1;

/// Requested page size after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    Limited(u32),
    Unlimited,
}

impl PageSize {
    /// Interpret a caller-supplied page size. `-1` is the "everything"
    /// sentinel; zero and other negatives are rejected rather than guessed at.
    pub fn parse(raw: i64) -> Result<Self, QueryError> {
        match raw {
            UNLIMITED_PAGE_SIZE => Ok(PageSize::Unlimited),
            n if n > 0 => u32::try_from(n).map(PageSize::Limited).map_err(|_| {
                QueryError::InvalidPagination(format!("pageSize {} is too large", n))
            }),
            n => Err(QueryError::InvalidPagination(format!(
                "pageSize must be a positive integer or -1, got {}",
                n
            ))),
        }
    }
}

/// Concrete slice of the ordered result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWindow {
    Limited { limit: u32, offset: u64 },
    Unlimited,
}

impl PageWindow {
    /// Normalize `(pageSize, page)` into a window.
    ///
    /// `page` is 1-based and clamped to 1; it is ignored for unlimited pages.
    pub fn normalize(
        page_size: Option<i64>,
        page: Option<i64>,
        default_page_size: u32,
    ) -> Result<Self, QueryError> {
        let size = match page_size {
            Some(raw) => PageSize::parse(raw)?,
            None => PageSize::Limited(default_page_size),
        };

        match size {
            PageSize::Unlimited => Ok(PageWindow::Unlimited),
            PageSize::Limited(limit) => {
                let page = page.unwrap_or(1).max(1) as u64;
                let offset = (page - 1)
                    .checked_mul(u64::from(limit))
                    .filter(|offset| i64::try_from(*offset).is_ok())
                    .ok_or_else(|| {
                        QueryError::InvalidPagination(format!("page {} is out of range", page))
                    })?;
                Ok(PageWindow::Limited { limit, offset })
            }
        }
    }

    /// `LIMIT` value; `None` means no limit.
    pub fn limit(&self) -> Option<i64> {
        match self {
            PageWindow::Limited { limit, .. } => Some(i64::from(*limit)),
            PageWindow::Unlimited => None,
        }
    }

    pub fn offset(&self) -> u64 {
        match self {
            PageWindow::Limited { offset, .. } => *offset,
            PageWindow::Unlimited => 0,
        }
    }

    /// Apply the window to an already ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        match self {
            PageWindow::Limited { limit, .. } => {
                items.into_iter().skip(skip).take(*limit as usize).collect()
            }
            PageWindow::Unlimited => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_default_size() {
        let window = PageWindow::normalize(None, None, 25).unwrap();
        assert_eq!(window, PageWindow::Limited { limit: 25, offset: 0 });
    }

    #[test]
    fn computes_offset_from_page() {
        let window = PageWindow::normalize(Some(10), Some(3), 25).unwrap();
        assert_eq!(window, PageWindow::Limited { limit: 10, offset: 20 });
        assert_eq!(window.limit(), Some(10));
        assert_eq!(window.offset(), 20);
    }

    #[test]
    fn clamps_page_below_one() {
        for page in [0, -4] {
            let window = PageWindow::normalize(Some(5), Some(page), 25).unwrap();
            assert_eq!(window, PageWindow::Limited { limit: 5, offset: 0 });
        }
    }

    #[test]
    fn minus_one_is_unlimited_and_ignores_page() {
        let window = PageWindow::normalize(Some(-1), Some(7), 25).unwrap();
        assert_eq!(window, PageWindow::Unlimited);
        assert_eq!(window.limit(), None);
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn rejects_zero_and_other_negatives() {
        for size in [0, -2, -100] {
            let err = PageWindow::normalize(Some(size), None, 25).unwrap_err();
            assert!(matches!(err, QueryError::InvalidPagination(_)), "{}", size);
        }
    }

    #[test]
    fn rejects_page_size_beyond_u32() {
        let err = PageSize::parse(i64::from(u32::MAX) + 1).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPagination(_)));
    }

    #[test]
    fn rejects_offset_that_overflows() {
        let err = PageWindow::normalize(Some(1000), Some(i64::MAX), 25).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPagination(_)));
    }

    #[test]
    fn slice_applies_window() {
        let items: Vec<u32> = (1..=7).collect();
        let window = PageWindow::normalize(Some(3), Some(3), 25).unwrap();
        assert_eq!(window.slice(items.clone()), vec![7]);
        assert_eq!(PageWindow::Unlimited.slice(items.clone()), items);
    }
}
