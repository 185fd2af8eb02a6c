//! Page-number pagination for list endpoints.
//!
//! Lists are wrapped in a `{count, next, previous, results}` envelope. The
//! links are absolute and keep every other query parameter of the request.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{Uri, request::Parts},
};
use serde::Serialize;
use url::{Url, form_urlencoded};
use utoipa::{IntoParams, ToSchema};

use crate::db::{PageRequest, PageSlice};
use crate::error::AppError;

/// Query parameter name carrying the page number.
const PAGE_PARAM: &str = "page";

/// `?page=N` query string.
///
/// When `page` is repeated the last value wins; other parameters are
/// ignored here and kept in the page links.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    #[param(value_type = Option<u64>, minimum = 1)]
    pub page: Option<String>,
}

impl PageQuery {
    /// Read `page` from a raw query string.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        let page = query.and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .filter(|(key, _)| key == PAGE_PARAM)
                .last()
                .map(|(_, value)| value.into_owned())
        });
        Self { page }
    }

    /// The requested page number, defaulting to 1.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidPage` if the value is not a positive integer.
    pub fn number(&self) -> Result<u64, AppError> {
        match self.page.as_deref() {
            None => Ok(1),
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(AppError::InvalidPage),
        }
    }

    /// The storage window for this page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidPage` if the page number is malformed.
    pub fn request(&self, page_size: u64) -> Result<(u64, PageRequest), AppError> {
        let number = self.number()?;
        Ok((number, PageRequest::for_page(number, page_size)))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PageQuery {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query(parts.uri.query()))
    }
}

/// A page of results.
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    /// Total number of items across all pages.
    pub count: u64,
    /// Absolute URL of the next page.
    pub next: Option<String>,
    /// Absolute URL of the previous page.
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap one page of items.
    ///
    /// `base_url` and `uri` together give the absolute URL of the current
    /// request; the links are derived from it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidPage` if `number` is past the last page.
    /// Page 1 of an empty list is valid.
    pub fn new(
        slice: PageSlice<T>,
        number: u64,
        page_size: u64,
        base_url: &str,
        uri: &Uri,
    ) -> Result<Self, AppError> {
        let last = last_page(slice.total, page_size);
        if number > last {
            return Err(AppError::InvalidPage);
        }

        let current = Url::parse(&format!("{base_url}{uri}"))
            .map_err(|e| AppError::Internal(format!("invalid request URL: {e}")))?;

        let next = (number < last).then(|| page_link(&current, number + 1));
        let previous = (number > 1).then(|| page_link(&current, number - 1));

        Ok(Self {
            count: slice.total,
            next,
            previous,
            results: slice.items,
        })
    }
}

/// Number of the last page; an empty list still has page 1.
const fn last_page(total: u64, page_size: u64) -> u64 {
    if page_size == 0 || total == 0 {
        return 1;
    }
    total.div_ceil(page_size)
}

/// `current` with its page parameter set to `number` (removed for page 1).
fn page_link(current: &Url, number: u64) -> String {
    let retained: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut link = current.clone();
    link.set_query(None);
    if !retained.is_empty() || number > 1 {
        let mut pairs = link.query_pairs_mut();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        if number > 1 {
            pairs.append_pair(PAGE_PARAM, &number.to_string());
        }
    }
    link.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: &str = "http://testserver";

    fn slice(total: u64, items: usize) -> PageSlice<u64> {
        PageSlice {
            items: (0..items as u64).collect(),
            total,
        }
    }

    fn query(page: &str) -> PageQuery {
        PageQuery {
            page: Some(page.to_string()),
        }
    }

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(PageQuery::default().number().unwrap(), 1);
        assert_eq!(query("3").number().unwrap(), 3);
        assert!(query("0").number().is_err());
        assert!(query("-1").number().is_err());
        assert!(query("abc").number().is_err());
    }

    #[test]
    fn test_page_from_query_string() {
        assert_eq!(PageQuery::from_query(None).page, None);
        assert_eq!(PageQuery::from_query(Some("format=json")).page, None);
        assert_eq!(
            PageQuery::from_query(Some("page=2&format=json")).page.as_deref(),
            Some("2")
        );
        // Repeated parameter: last value wins
        let query = PageQuery::from_query(Some("page=1&page=3"));
        assert_eq!(query.number().unwrap(), 3);
        let query = PageQuery::from_query(Some("page=2&page=x"));
        assert!(query.number().is_err());
    }

    #[test]
    fn test_single_page_has_no_links() {
        let uri: Uri = "/api/v1/categories/".parse().unwrap();
        let page = Page::new(slice(3, 3), 1, 10, BASE, &uri).unwrap();
        assert_eq!(page.count, 3);
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
    }

    #[test]
    fn test_middle_page_links() {
        let uri: Uri = "/api/v1/goods/?page=2".parse().unwrap();
        let page = Page::new(slice(25, 10), 2, 10, BASE, &uri).unwrap();
        assert_eq!(
            page.next.as_deref(),
            Some("http://testserver/api/v1/goods/?page=3")
        );
        // Link to the first page drops the parameter
        assert_eq!(
            page.previous.as_deref(),
            Some("http://testserver/api/v1/goods/")
        );
    }

    #[test]
    fn test_links_keep_other_params() {
        let uri: Uri = "/api/v1/goods/?format=json&page=1".parse().unwrap();
        let page = Page::new(slice(25, 10), 1, 10, BASE, &uri).unwrap();
        assert_eq!(
            page.next.as_deref(),
            Some("http://testserver/api/v1/goods/?format=json&page=2")
        );
    }

    #[test]
    fn test_page_past_end() {
        let uri: Uri = "/api/v1/goods/?page=4".parse().unwrap();
        assert!(matches!(
            Page::new(slice(25, 0), 4, 10, BASE, &uri),
            Err(AppError::InvalidPage)
        ));
    }

    #[test]
    fn test_empty_list_first_page() {
        let uri: Uri = "/api/v1/goods/".parse().unwrap();
        let page = Page::new(slice(0, 0), 1, 10, BASE, &uri).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());

        let uri: Uri = "/api/v1/goods/?page=2".parse().unwrap();
        assert!(Page::new(slice(0, 0), 2, 10, BASE, &uri).is_err());
    }
}
