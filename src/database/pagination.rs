use serde::{Deserialize, Serialize};

use crate::constants::MAX_PAGE_SIZE;

use super::error::{Error, HtmlError};

#[derive(Serialize, Deserialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// `page` is 1-based. `limit` falls back to the configured page size and is capped.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Result<Self, Error> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(HtmlError::NotFound.new("Invalid page."));
        }

        let limit = limit.unwrap_or(default_limit);
        if limit < 1 {
            return Err(Error::field("limit", "Ensure this value is greater than or equal to 1."));
        }

        let limit = limit.min(MAX_PAGE_SIZE);
        // Both the offset and the next page link must stay representable.
        if page.checked_add(1).and_then(|next| next.checked_mul(limit)).is_none() {
            return Err(HtmlError::NotFound.new("Invalid page."));
        }

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl<T> Page<T> {
    /// `link` renders the URL of another page number.
    pub fn from_rows<F>(
        results: Vec<T>,
        total_rows: i64,
        request: PageRequest,
        link: F,
    ) -> Result<Self, Error>
    where
        F: Fn(i64) -> String,
    {
        if results.is_empty() && request.page > 1 {
            return Err(HtmlError::NotFound.new("Invalid page."));
        }

        let next = (request.page * request.limit < total_rows).then(|| link(request.page + 1));
        let previous = (request.page > 1).then(|| link(request.page - 1));

        Ok(Self {
            count: total_rows,
            next,
            previous,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(page: i64) -> String {
        format!("/api/recipes/?page={page}")
    }

    #[test]
    fn middle_page_links_both_ways() {
        let request = PageRequest::new(Some(2), Some(2), 6).unwrap();
        let page = Page::from_rows(vec![3, 4], 5, request, link).unwrap();

        assert_eq!(request.offset(), 2);
        assert_eq!(page.next.as_deref(), Some("/api/recipes/?page=3"));
        assert_eq!(page.previous.as_deref(), Some("/api/recipes/?page=1"));
    }

    #[test]
    fn last_page_has_no_next() {
        let request = PageRequest::new(None, Some(3), 6).unwrap();
        let page = Page::from_rows(vec![1, 2, 3], 3, request, link).unwrap();

        assert!(page.next.is_none());
        assert!(page.previous.is_none());
    }

    #[test]
    fn page_past_the_end_is_not_found() {
        let request = PageRequest::new(Some(4), None, 6).unwrap();
        let result = Page::<i32>::from_rows(vec![], 2, request, link);

        assert!(result.is_err());
    }

    #[test]
    fn limit_is_capped() {
        let request = PageRequest::new(None, Some(10_000), 6).unwrap();

        assert_eq!(request.limit, MAX_PAGE_SIZE);
        assert!(PageRequest::new(Some(0), None, 6).is_err());
        assert!(PageRequest::new(None, Some(0), 6).is_err());
    }

    #[test]
    fn unrepresentable_page_is_not_found() {
        let error = PageRequest::new(Some(i64::MAX), None, 6).unwrap_err();
        assert_eq!(error.code(), warp::http::StatusCode::NOT_FOUND);

        assert!(PageRequest::new(Some(200_000_000_000_000_000), Some(100), 6).is_err());
        assert!(PageRequest::new(Some(i64::MAX / 100 - 1), Some(100), 6).is_ok());
    }
}
