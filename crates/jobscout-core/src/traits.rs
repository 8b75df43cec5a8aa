use std::future::Future;

use url::Url;

use crate::document::PageDocument;
use crate::error::AppError;
use crate::models::{ListingId, ListingRecord, Pagination, QuerySpec, SearchTerms};

/// Status and body of one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.status, 404 | 410)
    }
}

/// Retrieves raw pages.
///
/// Headers and other session configuration are fixed when the transport
/// is built and shared read-only by every concurrent fetch of a run.
/// Non-success statuses are returned, not raised: only connection-level
/// failures are errors.
pub trait Transport: Send + Sync + Clone {
    fn get(&self, url: &Url) -> impl Future<Output = Result<RawResponse, AppError>> + Send;
}

/// How a board encodes the page number into its query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageParam {
    /// The key carries the 1-based page index.
    Index(&'static str),
    /// The key carries the zero-based offset of the page's first result.
    Offset(&'static str),
}

impl PageParam {
    pub fn key(&self) -> &'static str {
        match self {
            PageParam::Index(key) | PageParam::Offset(key) => key,
        }
    }

    /// Derive the query for `page` without touching `query`.
    pub fn apply(&self, query: &QuerySpec, page: u32, pagination: &Pagination) -> QuerySpec {
        let value = match self {
            PageParam::Index(_) => u64::from(page),
            PageParam::Offset(_) => pagination.offset(page),
        };
        query.with(self.key(), Some(value.to_string()))
    }
}

/// What a fetched page turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSignal {
    Content,
    NoResults,
    /// Anti-automation challenge; carries the marker that gave it away.
    Blocked(String),
}

/// A job board adapter: everything the engine needs to know about one site.
///
/// Only query layout, page geometry and document inspection vary per
/// board; fetching, fan-out and merging are shared by the engine.
pub trait JobBoard: Send + Sync + Clone {
    /// Short lowercase board name used in logs and errors.
    fn name(&self) -> &str;

    fn pagination(&self) -> Pagination;

    /// The board's default query, every known key declared.
    fn query(&self) -> QuerySpec;

    /// Map free-text search terms onto this board's query keys.
    fn apply_search(&self, query: QuerySpec, search: &SearchTerms) -> QuerySpec;

    fn page_param(&self) -> PageParam;

    /// Search endpoint the query string is appended to.
    fn search_base(&self, query: &QuerySpec) -> Result<Url, AppError>;

    /// Request target for a 1-based results page.
    fn search_url(&self, query: &QuerySpec, page: u32) -> Result<Url, AppError> {
        let paged = self.page_param().apply(query, page, &self.pagination());
        paged.to_url(&self.search_base(query)?)
    }

    /// Canonical detail-page locator for a listing.
    fn listing_url(&self, id: &ListingId) -> Result<Url, AppError>;

    /// Page text that reveals a bot challenge.
    fn blocked_markers(&self) -> &[&str] {
        &[]
    }

    /// Page text that means the query matched nothing.
    fn no_results_markers(&self) -> &[&str] {
        &[]
    }

    fn classify(&self, doc: &PageDocument) -> PageSignal {
        let text = doc.text();
        if let Some(marker) = self.blocked_markers().iter().find(|m| text.contains(**m)) {
            return PageSignal::Blocked(marker.to_string());
        }
        if self.no_results_markers().iter().any(|m| text.contains(m)) {
            return PageSignal::NoResults;
        }
        PageSignal::Content
    }

    /// Total matches reported on the first results page.
    fn result_count(&self, doc: &PageDocument) -> Result<u64, AppError>;

    /// Listing identifiers on a results page, in page order.
    fn listing_ids(&self, doc: &PageDocument) -> Result<Vec<ListingId>, AppError>;

    /// Fields a results page already exposes per listing.
    fn listing_summaries(
        &self,
        _doc: &PageDocument,
    ) -> Result<Vec<(ListingId, ListingRecord)>, AppError> {
        Ok(Vec::new())
    }

    /// Ids and summaries of a results page together.
    ///
    /// Boards whose ids and summaries come from the same parsed source
    /// override this to read it once.
    fn page_listings(
        &self,
        doc: &PageDocument,
    ) -> Result<(Vec<ListingId>, Vec<(ListingId, ListingRecord)>), AppError> {
        Ok((self.listing_ids(doc)?, self.listing_summaries(doc)?))
    }

    /// Whether a detail page stands for a listing that no longer exists.
    fn is_listing_absent(&self, doc: &PageDocument) -> bool {
        matches!(doc.status(), 404 | 410 | 500) || doc.contains_text("Internal server error")
    }

    /// Extract the listing's fields from its detail page.
    ///
    /// Together with the listing's results-page summary, the record must
    /// carry `title` and `description`; the engine sets `url`.
    fn extract_fields(
        &self,
        doc: &PageDocument,
        id: &ListingId,
    ) -> Result<ListingRecord, AppError>;
}
