//! Shared query parameter types for API handlers.

use serde::Deserialize;
use vidfeed_core::feed::PageRequest;

/// Feed window and ordering (`?sort=&page=&limit=`).
///
/// `sort` stays a raw string so unknown tokens fall back to the default
/// ordering instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl FeedParams {
    pub fn window(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Free-text search (`?q=&sort=&page=&limit=`).
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchParams {
    pub fn window(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}
