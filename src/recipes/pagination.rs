use axum::http::Uri;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(i64),
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: PageNumber,
    pub page_size: i64,
}

/// A page resolved against the total row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

fn invalid_page() -> ApiError {
    ApiError::NotFound("Invalid page.".into())
}

impl PageRequest {
    /// `page` must be a positive integer or `last`. A missing, non-positive
    /// or unparsable `page_size` falls back to the default; larger values are
    /// clamped to [`MAX_PAGE_SIZE`].
    pub fn from_params(page: Option<&str>, page_size: Option<&str>) -> ApiResult<Self> {
        let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
            None => PageNumber::Number(1),
            Some("last") => PageNumber::Last,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => PageNumber::Number(n),
                _ => return Err(invalid_page()),
            },
        };

        let page_size = page_size
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map_or(DEFAULT_PAGE_SIZE, |n| n.min(MAX_PAGE_SIZE));

        Ok(Self { page, page_size })
    }

    pub fn resolve(&self, count: i64) -> ApiResult<PageWindow> {
        // An empty collection still has one (empty) page.
        let num_pages = ((count + self.page_size - 1) / self.page_size).max(1);
        let number = match self.page {
            PageNumber::Last => num_pages,
            PageNumber::Number(n) if n <= num_pages => n,
            PageNumber::Number(_) => return Err(invalid_page()),
        };
        Ok(PageWindow {
            number,
            num_pages,
            limit: self.page_size,
            offset: (number - 1) * self.page_size,
        })
    }
}

impl<T> Page<T> {
    pub fn new(uri: &Uri, window: &PageWindow, count: i64, results: Vec<T>) -> Self {
        let next = (window.number < window.num_pages).then(|| page_link(uri, Some(window.number + 1)));
        let previous = (window.number > 1).then(|| {
            let target = window.number - 1;
            page_link(uri, (target > 1).then_some(target))
        });
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// The request's path and query with `page` replaced, or dropped for `None`.
pub fn page_link(uri: &Uri, page: Option<i64>) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some("page"))
        .map(str::to_owned)
        .collect();
    if let Some(n) = page {
        pairs.push(format!("page={n}"));
    }

    if pairs.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), pairs.join("&"))
    }
}
