//! Page-number pagination for transaction listings.

use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};

/// The keyword that may be passed instead of a page number to request the final page.
pub const LAST_PAGE: &str = "last";

/// Page size settings, read from the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: u32,
    max_page_size: u32,
}

impl Pagination {
    pub fn new(page_size: u32, max_page_size: u32) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            page_size: page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    /// Interprets the raw `page` and `page_size` query parameters of an HTTP request.
    ///
    /// A `page_size` that is not a positive integer is ignored and the default is used; one that
    /// is too large is capped. A `page` that is not a positive integer (or `last`) is an error.
    pub fn request(
        &self,
        page: Option<&str>,
        page_size: Option<&str>,
    ) -> Result<PageRequest, PageError> {
        let size = page_size.and_then(|s| s.trim().parse::<u32>().ok());
        let number = match page.map(str::trim) {
            None | Some("") => PageNumber::Number(1),
            Some(LAST_PAGE) => PageNumber::Last,
            Some(s) => PageNumber::Number(s.parse::<u64>().map_err(|_| PageError)?),
        };
        self.page(number, size)
    }

    /// Builds a request for page `number` holding `size` items, applying the defaults and the
    /// cap. Page zero is an error.
    pub fn page(&self, number: PageNumber, size: Option<u32>) -> Result<PageRequest, PageError> {
        if number == PageNumber::Number(0) {
            return Err(PageError);
        }
        let size = size
            .filter(|s| *s > 0)
            .map(|s| s.min(self.max_page_size))
            .unwrap_or(self.page_size);
        Ok(PageRequest::new(number, size))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(10, 100)
    }
}

/// Which page was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(u64),
    Last,
}

/// A validated page request. The requested page is checked against the number of available pages
/// with `resolve` once the total count is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: PageNumber,
    size: u32,
}

impl PageRequest {
    pub fn new(number: PageNumber, size: u32) -> Self {
        Self {
            number,
            size: size.max(1),
        }
    }

    pub fn first(size: u32) -> Self {
        Self::new(PageNumber::Number(1), size)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Resolves this request against `count` available items. The first page always exists, even
    /// when there are no items.
    pub fn resolve(&self, count: u64) -> Result<PageWindow, PageError> {
        let size = u64::from(self.size);
        let num_pages = count.div_ceil(size).max(1);
        let number = match self.number {
            PageNumber::Number(n) => n,
            PageNumber::Last => num_pages,
        };
        if number > num_pages {
            return Err(PageError);
        }
        Ok(PageWindow {
            number,
            size,
            num_pages,
        })
    }
}

/// A page that is known to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub size: u64,
    pub num_pages: u64,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }

    pub fn limit(&self) -> u64 {
        self.size
    }

    pub fn next(&self) -> Option<u64> {
        (self.number < self.num_pages).then_some(self.number + 1)
    }

    pub fn previous(&self) -> Option<u64> {
        (self.number > 1).then_some(self.number - 1)
    }
}

/// One page of results along with the total number of matching items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T>
where
    T: Serialize,
{
    pub count: u64,
    #[serde(skip)]
    pub window: PageWindow,
    pub results: Vec<T>,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn new(count: u64, window: PageWindow, results: Vec<T>) -> Self {
        Self {
            count,
            window,
            results,
        }
    }
}

/// The requested page does not exist.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PageError;

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Invalid page.")
    }
}

impl Debug for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for PageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::default();
        let request = p.request(None, None).unwrap();
        assert_eq!(request, PageRequest::first(10));
    }

    #[test]
    fn test_page_size_is_capped() {
        let p = Pagination::new(10, 100);
        assert_eq!(p.request(None, Some("5")).unwrap().size(), 5);
        assert_eq!(p.request(None, Some("1000")).unwrap().size(), 100);
    }

    #[test]
    fn test_bad_page_size_uses_default() {
        let p = Pagination::new(10, 100);
        assert_eq!(p.request(None, Some("0")).unwrap().size(), 10);
        assert_eq!(p.request(None, Some("-3")).unwrap().size(), 10);
        assert_eq!(p.request(None, Some("ten")).unwrap().size(), 10);
    }

    #[test]
    fn test_bad_page_number() {
        let p = Pagination::default();
        assert_eq!(p.request(Some("0"), None), Err(PageError));
        assert_eq!(p.request(Some("two"), None), Err(PageError));
        assert_eq!(p.page(PageNumber::Number(0), None), Err(PageError));
        assert_eq!(PageError.to_string(), "Invalid page.");
    }

    #[test]
    fn test_resolve() {
        let window = PageRequest::new(PageNumber::Number(2), 10)
            .resolve(15)
            .unwrap();
        assert_eq!(window.num_pages, 2);
        assert_eq!(window.offset(), 10);
        assert_eq!(window.next(), None);
        assert_eq!(window.previous(), Some(1));

        let window = PageRequest::first(10).resolve(15).unwrap();
        assert_eq!(window.next(), Some(2));
        assert_eq!(window.previous(), None);
    }

    #[test]
    fn test_resolve_past_the_end() {
        assert_eq!(
            PageRequest::new(PageNumber::Number(3), 10).resolve(15),
            Err(PageError)
        );
    }

    #[test]
    fn test_first_page_of_nothing_exists() {
        let window = PageRequest::first(10).resolve(0).unwrap();
        assert_eq!(window.number, 1);
        assert_eq!(window.next(), None);
    }

    #[test]
    fn test_last_page() {
        let request = Pagination::default().request(Some("last"), Some("4")).unwrap();
        let window = request.resolve(10).unwrap();
        assert_eq!(window.number, 3);
        assert_eq!(window.offset(), 8);
    }
}
