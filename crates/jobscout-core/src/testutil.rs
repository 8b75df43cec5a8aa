//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit and integration
//! tests. Mocks share state through `Arc<Mutex<_>>` so clones handed to
//! the engine still record into the instance the test asserts on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;

use crate::document::{PageDocument, element_text};
use crate::error::AppError;
use crate::models::{ListingId, ListingRecord, Pagination, QuerySpec, SearchTerms};
use crate::reporter::{RunEvent, RunReporter};
use crate::traits::{JobBoard, PageParam, RawResponse, Transport};

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum MockRoute {
    Response(RawResponse),
    NetworkError(String),
    /// Answers after the delay elapses.
    Delayed(RawResponse, Duration),
    /// Never completes within any sane deadline.
    Hang,
}

/// Transport serving canned responses keyed by full request URL.
///
/// Unrouted URLs answer 404. Every request is recorded in order.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<HashMap<String, MockRoute>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, response: RawResponse) -> Self {
        self.insert(url, MockRoute::Response(response))
    }

    pub fn route_error(self, url: &str, message: &str) -> Self {
        self.insert(url, MockRoute::NetworkError(message.to_string()))
    }

    pub fn route_delay(self, url: &str, response: RawResponse, delay: Duration) -> Self {
        self.insert(url, MockRoute::Delayed(response, delay))
    }

    pub fn route_hang(self, url: &str) -> Self {
        self.insert(url, MockRoute::Hang)
    }

    fn insert(self, url: &str, route: MockRoute) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), route);
        self
    }

    /// Every requested URL, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// How many times `url` was requested.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == url)
            .count()
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, AppError> {
        self.requests.lock().unwrap().push(url.to_string());
        let route = self.routes.lock().unwrap().get(url.as_str()).cloned();

        match route {
            Some(MockRoute::Response(response)) => Ok(response),
            Some(MockRoute::NetworkError(message)) => Err(AppError::NetworkError(message)),
            Some(MockRoute::Delayed(response, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(MockRoute::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(AppError::NetworkError("hang elapsed".to_string()))
            }
            None => Ok(RawResponse::new(404, "<html><body>Not Found</body></html>")),
        }
    }
}

// ---------------------------------------------------------------------------
// MockBoard
// ---------------------------------------------------------------------------

/// Minimal board over the fixture markup produced by [`search_page`] and
/// [`listing_page`].
///
/// - search: `https://jobs.test/search?q=..&page=N`
/// - listing: `https://jobs.test/listing/{id}`
#[derive(Debug, Clone)]
pub struct MockBoard {
    pagination: Pagination,
}

impl Default for MockBoard {
    fn default() -> Self {
        Self {
            pagination: Pagination::new(50, 20),
        }
    }
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }
}

impl JobBoard for MockBoard {
    fn name(&self) -> &str {
        "mock"
    }

    fn pagination(&self) -> Pagination {
        self.pagination
    }

    fn query(&self) -> QuerySpec {
        QuerySpec::new().unset("q").param("page", 1)
    }

    fn apply_search(&self, query: QuerySpec, search: &SearchTerms) -> QuerySpec {
        query.with("q", Some(search.terms.clone()))
    }

    fn page_param(&self) -> PageParam {
        PageParam::Index("page")
    }

    fn search_base(&self, _query: &QuerySpec) -> Result<Url, AppError> {
        Url::parse("https://jobs.test/search").map_err(|e| AppError::InvalidQuery(e.to_string()))
    }

    fn listing_url(&self, id: &ListingId) -> Result<Url, AppError> {
        Url::parse(&format!("https://jobs.test/listing/{id}"))
            .map_err(|e| AppError::InvalidQuery(e.to_string()))
    }

    fn blocked_markers(&self) -> &[&str] {
        &["captcha-wall"]
    }

    fn no_results_markers(&self) -> &[&str] {
        &["No jobs matched"]
    }

    fn result_count(&self, doc: &PageDocument) -> Result<u64, AppError> {
        let raw = doc.require_text("#total")?;
        raw.parse()
            .map_err(|_| AppError::ExtractionError(format!("bad total '{raw}'")))
    }

    fn listing_ids(&self, doc: &PageDocument) -> Result<Vec<ListingId>, AppError> {
        Ok(doc
            .select("a.job")?
            .into_iter()
            .filter_map(|el| el.value().attr("data-id"))
            .map(ListingId::from)
            .collect())
    }

    fn listing_summaries(
        &self,
        doc: &PageDocument,
    ) -> Result<Vec<(ListingId, ListingRecord)>, AppError> {
        Ok(doc
            .select("a.job[data-company]")?
            .into_iter()
            .filter_map(|el| {
                let id = el.value().attr("data-id")?;
                let company = el.value().attr("data-company")?;
                Some((ListingId::from(id), ListingRecord::new().field("company", company)))
            })
            .collect())
    }

    fn extract_fields(
        &self,
        doc: &PageDocument,
        _id: &ListingId,
    ) -> Result<ListingRecord, AppError> {
        let mut record =
            ListingRecord::titled(doc.require_text("h1")?, doc.require_text("#description")?);
        if let Some(salary) = doc.first("span.salary")? {
            record.insert("salary", element_text(salary));
        }
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const BLOCKED_PAGE: &str =
    "<html><body><div class=\"challenge\">Please complete the captcha-wall</div></body></html>";

pub const NO_RESULTS_PAGE: &str = "<html><body><p>No jobs matched your search</p></body></html>";

/// Results page reporting `total` matches and linking `ids`.
pub fn search_page(total: u64, ids: &[&str]) -> String {
    let links: String = ids
        .iter()
        .map(|id| format!("<a class=\"job\" data-id=\"{id}\">Job {id}</a>"))
        .collect();
    format!("<html><body><span id=\"total\">{total}</span>{links}</body></html>")
}

/// Results page whose links also carry a company summary.
pub fn search_page_with_companies(total: u64, listings: &[(&str, &str)]) -> String {
    let links: String = listings
        .iter()
        .map(|(id, company)| {
            format!("<a class=\"job\" data-id=\"{id}\" data-company=\"{company}\">Job {id}</a>")
        })
        .collect();
    format!("<html><body><span id=\"total\">{total}</span>{links}</body></html>")
}

pub fn listing_page(title: &str, description: &str) -> String {
    format!(
        "<html><body><h1>{title}</h1><section id=\"description\">{description}</section></body></html>"
    )
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Reporter that records the variant name of every event.
#[derive(Clone, Default)]
pub struct MockReporter {
    labels: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

impl RunReporter for MockReporter {
    fn report(&self, event: RunEvent<'_>) {
        let label = match event {
            RunEvent::Started { .. } => "Started",
            RunEvent::NoResults => "NoResults",
            RunEvent::PageCountResolved { .. } => "PageCountResolved",
            RunEvent::PageFetched { .. } => "PageFetched",
            RunEvent::PageMissing { .. } => "PageMissing",
            RunEvent::ListingsCollected { .. } => "ListingsCollected",
            RunEvent::ListingFetched { .. } => "ListingFetched",
            RunEvent::ListingAbsent { .. } => "ListingAbsent",
            RunEvent::Aborted { .. } => "Aborted",
            RunEvent::Completed { .. } => "Completed",
        };
        self.labels.lock().unwrap().push(label.to_string());
    }
}
