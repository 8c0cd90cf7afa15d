//! Feed ranking and pagination policy.
//!
//! Sort tokens, filters and page windows are resolved here, before any
//! query runs, so every caller sees the same fallback rules:
//!
//! - an unrecognised sort token silently becomes [`SortMode::DateDesc`];
//! - [`SortMode::Relevance`] without a free-text filter degrades to
//!   [`SortMode::DateDesc`];
//! - page numbers below 1 are clamped to 1 and page sizes to
//!   `1..=MAX_PAGE_SIZE`.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Number of feed items per page when the client does not ask otherwise.
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Upper bound for a client-supplied `limit`.
pub const MAX_PAGE_SIZE: i64 = 48;

// ---------------------------------------------------------------------------
// Sort modes
// ---------------------------------------------------------------------------

/// Recognised feed orderings.
///
/// Every mode is a total order: ties on the primary key are broken by
/// `created_at` descending, then by id descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    DateDesc,
    ViewsDesc,
    LikesDesc,
    CommentsDesc,
    Relevance,
}

impl SortMode {
    /// Wire token for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::DateDesc => "date_desc",
            SortMode::ViewsDesc => "views_desc",
            SortMode::LikesDesc => "likes_desc",
            SortMode::CommentsDesc => "comments_desc",
            SortMode::Relevance => "relevance",
        }
    }

    /// Parse a wire token. Returns `None` for anything unrecognised.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "date_desc" => Some(SortMode::DateDesc),
            "views_desc" => Some(SortMode::ViewsDesc),
            "likes_desc" => Some(SortMode::LikesDesc),
            "comments_desc" => Some(SortMode::CommentsDesc),
            "relevance" => Some(SortMode::Relevance),
            _ => None,
        }
    }

    /// Parse a wire token, mapping anything unrecognised to `DateDesc`.
    pub fn parse_or_default(token: &str) -> Self {
        SortMode::parse(token).unwrap_or(SortMode::DateDesc)
    }

    /// Resolve the `sort` query parameter.
    ///
    /// A missing parameter yields `when_absent` (the feed uses `DateDesc`,
    /// search uses `Relevance`). A present but unrecognised token always
    /// yields `DateDesc`, never an error.
    pub fn from_param(param: Option<&str>, when_absent: SortMode) -> Self {
        match param {
            None => when_absent,
            Some(token) if token.trim().is_empty() => when_absent,
            Some(token) => SortMode::parse_or_default(token),
        }
    }

    /// The mode actually applied for `filter`.
    ///
    /// Relevance only has a score to order on when the filter is a text
    /// query; otherwise it degrades to `DateDesc`.
    pub fn effective_for(self, filter: &FeedFilter) -> Self {
        match self {
            SortMode::Relevance if !filter.is_text() => SortMode::DateDesc,
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Base-row selection for the feed pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFilter {
    /// Every video.
    All,
    /// Free-text match against title and description.
    Text(String),
    /// Videos published by one uploader (profile pages).
    Uploader(DbId),
    /// A single video by id.
    Video(DbId),
}

impl FeedFilter {
    /// Build a text filter, or `None` when the query has no usable content.
    pub fn text(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(FeedFilter::Text(trimmed.to_string()))
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FeedFilter::Text(_))
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// A resolved, clamped page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Clamp client-supplied `page` / `limit` into a valid window.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip before this page starts.
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// `ceil(total / page_size)`, with `0` for an empty result set.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// One window of a feed plus the metadata a client needs for load-more.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl<T> FeedPage<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: i64) -> Self {
        Self {
            items,
            current_page: request.page,
            total_pages: total_pages(total_items, request.page_size),
            total_items: total_items.max(0),
        }
    }

    /// A page for a query that was never executed (e.g. an empty search).
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- SortMode ------------------------------------------------------------

    #[test]
    fn parse_recognises_every_token() {
        for mode in [
            SortMode::DateDesc,
            SortMode::ViewsDesc,
            SortMode::LikesDesc,
            SortMode::CommentsDesc,
            SortMode::Relevance,
        ] {
            assert_eq!(SortMode::parse(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn unknown_token_falls_back_to_date_desc() {
        assert_eq!(
            SortMode::from_param(Some("most_viral"), SortMode::Relevance),
            SortMode::DateDesc
        );
    }

    #[test]
    fn parse_or_default_covers_garbage() {
        assert_eq!(SortMode::parse_or_default("LIKES_DESC"), SortMode::DateDesc);
        assert_eq!(SortMode::parse_or_default(" views_desc "), SortMode::ViewsDesc);
    }

    #[test]
    fn absent_param_uses_caller_default() {
        assert_eq!(
            SortMode::from_param(None, SortMode::DateDesc),
            SortMode::DateDesc
        );
        assert_eq!(
            SortMode::from_param(None, SortMode::Relevance),
            SortMode::Relevance
        );
        assert_eq!(
            SortMode::from_param(Some("  "), SortMode::Relevance),
            SortMode::Relevance
        );
    }

    #[test]
    fn relevance_without_text_filter_degrades() {
        assert_eq!(
            SortMode::Relevance.effective_for(&FeedFilter::All),
            SortMode::DateDesc
        );
        assert_eq!(
            SortMode::Relevance.effective_for(&FeedFilter::Uploader(3)),
            SortMode::DateDesc
        );
    }

    #[test]
    fn relevance_with_text_filter_is_kept() {
        let filter = FeedFilter::text("cats").unwrap();
        assert_eq!(SortMode::Relevance.effective_for(&filter), SortMode::Relevance);
        assert_eq!(SortMode::ViewsDesc.effective_for(&filter), SortMode::ViewsDesc);
    }

    // -- FeedFilter ----------------------------------------------------------

    #[test]
    fn blank_text_query_yields_no_filter() {
        assert_eq!(FeedFilter::text("   "), None);
        assert_eq!(
            FeedFilter::text("  funny cats "),
            Some(FeedFilter::Text("funny cats".to_string()))
        );
    }

    // -- PageRequest ---------------------------------------------------------

    #[test]
    fn page_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(req.skip(), 0);
    }

    #[test]
    fn page_is_clamped_to_one() {
        assert_eq!(PageRequest::new(Some(0), None).page, 1);
        assert_eq!(PageRequest::new(Some(-7), None).page, 1);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(PageRequest::new(None, Some(0)).page_size, 1);
        assert_eq!(PageRequest::new(None, Some(1000)).page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn skip_is_page_offset() {
        assert_eq!(PageRequest::new(Some(3), Some(12)).skip(), 24);
    }

    // -- total_pages ---------------------------------------------------------

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 12), 0);
        assert_eq!(total_pages(1, 12), 1);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
    }

    #[test]
    fn page_beyond_last_reports_real_total() {
        let page: FeedPage<()> = FeedPage::new(Vec::new(), PageRequest::new(Some(9), None), 13);
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 9);
        assert_eq!(page.total_pages, 2);
    }
}
