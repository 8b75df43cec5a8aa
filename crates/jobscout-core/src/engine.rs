use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::document::PageDocument;
use crate::error::AppError;
use crate::models::{ListingId, ListingRecord, QuerySpec, ResultTable, SearchTerms};
use crate::reporter::{RunEvent, RunReporter};
use crate::traits::{JobBoard, PageSignal, RawResponse, Transport};

/// Outcome of fetching one search-results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPage {
    Listings {
        ids: Vec<ListingId>,
        summaries: Vec<(ListingId, ListingRecord)>,
        /// Only read from the first page.
        total_results: Option<u64>,
    },
    NoResults,
    NotFound,
}

/// Outcome of fetching one listing's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOutcome {
    Found(ListingRecord),
    Absent,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub total_results: u64,
    pub page_count: u32,
    /// Unique identifiers sent to the listing stage.
    pub listings_seen: usize,
    pub absent: usize,
    pub table: ResultTable,
}

impl RunReport {
    fn no_results(run_id: String) -> Self {
        Self {
            run_id,
            total_results: 0,
            page_count: 0,
            listings_seen: 0,
            absent: 0,
            table: ResultTable::new(),
        }
    }

    /// The query matched nothing; zero pages were processed.
    pub fn is_no_results(&self) -> bool {
        self.page_count == 0
    }
}

/// Deduplicated output of the page stage.
#[derive(Debug, Default)]
struct CollectedListings {
    ids: Vec<ListingId>,
    summaries: HashMap<ListingId, ListingRecord>,
    duplicates: usize,
}

/// Drives one board through a full search: probe → page stage → listing
/// stage → table.
///
/// Generic over the board adapter and the transport, so runs can be
/// exercised without a network.
pub struct SearchEngine<B, T>
where
    B: JobBoard,
    T: Transport,
{
    board: B,
    transport: T,
    config: EngineConfig,
    cancel: CancellationToken,
}

impl<B, T> SearchEngine<B, T>
where
    B: JobBoard,
    T: Transport,
{
    pub fn new(board: B, transport: T, config: EngineConfig) -> Self {
        Self {
            board,
            transport,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort runs with [`AppError::Cancelled`] once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Map `search` onto the board's default query and run it.
    pub async fn search<R: RunReporter + ?Sized>(
        &self,
        search: &SearchTerms,
        reporter: &R,
    ) -> Result<RunReport, AppError> {
        let query = self.board.apply_search(self.board.query(), search);
        self.run(&query, reporter).await
    }

    /// Run the full pipeline for `query`.
    ///
    /// 1. Probe page 1 for the result count (or no-results / not-found)
    /// 2. Clamp the page count to the board's maximum
    /// 3. Fetch pages 1..=N concurrently
    /// 4. Flatten and deduplicate listing identifiers
    /// 5. Fetch every listing concurrently
    /// 6. Assemble the table from the non-absent listings
    ///
    /// A blocked page anywhere aborts the run and drops in-flight fetches.
    pub async fn run<R: RunReporter + ?Sized>(
        &self,
        query: &QuerySpec,
        reporter: &R,
    ) -> Result<RunReport, AppError> {
        let run_id = Uuid::new_v4().to_string()[..8].to_string();
        let span = tracing::info_span!("run", %run_id, board = %self.board.name());

        let result = tokio::select! {
            result = self.run_stages(query, run_id.clone(), reporter).instrument(span) => result,
            () = self.cancel.cancelled() => Err(AppError::Cancelled),
        };

        if let Err(e) = &result {
            reporter.report(RunEvent::Aborted {
                error: &e.to_string(),
            });
        }
        result
    }

    async fn run_stages<R: RunReporter + ?Sized>(
        &self,
        query: &QuerySpec,
        run_id: String,
        reporter: &R,
    ) -> Result<RunReport, AppError> {
        reporter.report(RunEvent::Started {
            run_id: &run_id,
            board: self.board.name(),
        });

        // 1. Probe
        let total_results = match self.fetch_search_page(query, 1).await? {
            SearchPage::NotFound => {
                return Err(AppError::EntryPointNotFound {
                    url: self.board.search_url(query, 1)?.to_string(),
                });
            }
            SearchPage::NoResults => {
                reporter.report(RunEvent::NoResults);
                return Ok(RunReport::no_results(run_id));
            }
            SearchPage::Listings { total_results, .. } => total_results.unwrap_or_default(),
        };

        // 2. Page count
        let pagination = self.board.pagination();
        let page_count = pagination.page_count(total_results);
        let unclamped = total_results.div_ceil(u64::from(pagination.page_size));
        reporter.report(RunEvent::PageCountResolved {
            total_results,
            page_count,
            clamped: unclamped > u64::from(page_count),
        });
        if page_count == 0 {
            reporter.report(RunEvent::NoResults);
            return Ok(RunReport::no_results(run_id));
        }

        // 3 & 4. Page stage
        let pages = self.fetch_pages(query, page_count, reporter).await?;
        let collected = collect_listings(pages);
        reporter.report(RunEvent::ListingsCollected {
            unique: collected.ids.len(),
            duplicates: collected.duplicates,
        });

        // 5 & 6. Listing stage
        let listings_seen = collected.ids.len();
        let (table, absent) = self.fetch_listings(collected, reporter).await?;
        reporter.report(RunEvent::Completed {
            rows: table.len(),
            absent,
        });

        Ok(RunReport {
            run_id,
            total_results,
            page_count,
            listings_seen,
            absent,
            table,
        })
    }

    /// Fetch pages `1..=page_count` with bounded concurrency.
    ///
    /// Returning early on the first error drops the stream, which cancels
    /// every fetch still in flight.
    async fn fetch_pages<R: RunReporter + ?Sized>(
        &self,
        query: &QuerySpec,
        page_count: u32,
        reporter: &R,
    ) -> Result<Vec<(u32, SearchPage)>, AppError> {
        let mut stage = stream::iter(1..=page_count)
            .map(|page| async move { (page, self.fetch_search_page(query, page).await) })
            .buffer_unordered(self.config.concurrency);

        let mut pages = Vec::with_capacity(page_count as usize);
        while let Some((page, result)) = stage.next().await {
            let outcome = result?;
            match &outcome {
                SearchPage::Listings { ids, .. } => reporter.report(RunEvent::PageFetched {
                    page,
                    listings: ids.len(),
                }),
                SearchPage::NoResults => reporter.report(RunEvent::PageFetched { page, listings: 0 }),
                SearchPage::NotFound => reporter.report(RunEvent::PageMissing { page }),
            }
            pages.push((page, outcome));
        }

        pages.sort_by_key(|(page, _)| *page);
        Ok(pages)
    }

    /// Fetch every collected listing with bounded concurrency and merge the
    /// found ones into a table, keeping first-seen identifier order.
    async fn fetch_listings<R: RunReporter + ?Sized>(
        &self,
        collected: CollectedListings,
        reporter: &R,
    ) -> Result<(ResultTable, usize), AppError> {
        let CollectedListings {
            ids, mut summaries, ..
        } = collected;
        let total = ids.len();

        let mut stage = stream::iter(ids.into_iter().enumerate())
            .map(|(pos, id)| {
                let summary = summaries.remove(&id);
                async move {
                    let outcome = self.fetch_listing(&id, summary).await;
                    (pos, id, outcome)
                }
            })
            .buffer_unordered(self.config.concurrency);

        let mut found = Vec::with_capacity(total);
        let mut absent = 0;
        while let Some((pos, id, outcome)) = stage.next().await {
            match outcome? {
                ListingOutcome::Found(record) => {
                    reporter.report(RunEvent::ListingFetched { id: &id });
                    found.push((pos, id, record));
                }
                ListingOutcome::Absent => {
                    reporter.report(RunEvent::ListingAbsent { id: &id });
                    absent += 1;
                }
            }
        }

        found.sort_by_key(|(pos, _, _)| *pos);
        let table = found
            .into_iter()
            .map(|(_, id, record)| (id, record))
            .collect();
        Ok((table, absent))
    }

    /// Fetch and classify one search-results page.
    pub async fn fetch_search_page(
        &self,
        query: &QuerySpec,
        page: u32,
    ) -> Result<SearchPage, AppError> {
        let url = self.board.search_url(query, page)?;
        tracing::debug!(%page, %url, "Fetching search page");
        let response = self.get(&url).await?;
        self.inspect_search_page(&url, page, response)
    }

    fn inspect_search_page(
        &self,
        url: &Url,
        page: u32,
        response: RawResponse,
    ) -> Result<SearchPage, AppError> {
        let doc = PageDocument::parse(response.status, &response.body);

        match self.board.classify(&doc) {
            PageSignal::Blocked(marker) => return Err(self.blocked(url, marker)),
            _ if response.is_not_found() => return Ok(SearchPage::NotFound),
            PageSignal::NoResults => return Ok(SearchPage::NoResults),
            PageSignal::Content => {}
        }
        if !response.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                response.status, url
            )));
        }

        let total_results = if page == 1 {
            let count = self.board.result_count(&doc)?;
            if count == 0 {
                return Ok(SearchPage::NoResults);
            }
            Some(count)
        } else {
            None
        };

        let (ids, summaries) = self.board.page_listings(&doc)?;
        Ok(SearchPage::Listings {
            ids,
            summaries,
            total_results,
        })
    }

    /// Fetch one listing's detail page and extract its record.
    ///
    /// `summary` holds fields already seen on a results page; detail-page
    /// values take precedence over it.
    pub async fn fetch_listing(
        &self,
        id: &ListingId,
        summary: Option<ListingRecord>,
    ) -> Result<ListingOutcome, AppError> {
        let url = self.board.listing_url(id)?;
        let response = self.get(&url).await?;
        self.inspect_listing(id, &url, response, summary)
    }

    fn inspect_listing(
        &self,
        id: &ListingId,
        url: &Url,
        response: RawResponse,
        summary: Option<ListingRecord>,
    ) -> Result<ListingOutcome, AppError> {
        let doc = PageDocument::parse(response.status, &response.body);

        if let PageSignal::Blocked(marker) = self.board.classify(&doc) {
            return Err(self.blocked(url, marker));
        }
        if self.board.is_listing_absent(&doc) {
            return Ok(ListingOutcome::Absent);
        }
        if !response.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                response.status, url
            )));
        }

        let extracted = self.board.extract_fields(&doc, id)?;
        let mut record = match summary {
            Some(summary) => extracted.over(summary),
            None => extracted,
        };
        record.insert("url", url.as_str());

        let missing = record.missing_required();
        if !missing.is_empty() {
            return Err(AppError::ExtractionError(format!(
                "{} listing {} is missing {}",
                self.board.name(),
                id,
                missing.join(", ")
            )));
        }
        Ok(ListingOutcome::Found(record))
    }

    async fn get(&self, url: &Url) -> Result<RawResponse, AppError> {
        match tokio::time::timeout(self.config.fetch_timeout, self.transport.get(url)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.config.fetch_timeout.as_secs())),
        }
    }

    fn blocked(&self, url: &Url, marker: String) -> AppError {
        AppError::Blocked {
            board: self.board.name().to_string(),
            url: url.to_string(),
            marker,
        }
    }
}

/// Flatten page results into a deduplicated identifier list.
///
/// Pages are visited in page order; the first occurrence of an identifier
/// (and its first summary) wins.
fn collect_listings(pages: Vec<(u32, SearchPage)>) -> CollectedListings {
    let mut collected = CollectedListings::default();
    let mut seen = HashSet::new();

    for (_, page) in pages {
        let SearchPage::Listings { ids, summaries, .. } = page else {
            continue;
        };
        for id in ids {
            if seen.insert(id.clone()) {
                collected.ids.push(id);
            } else {
                collected.duplicates += 1;
            }
        }
        for (id, summary) in summaries {
            collected.summaries.entry(id).or_insert(summary);
        }
    }

    collected
}
