use crate::models::ListingId;

/// Events emitted by the engine over the course of a run.
#[derive(Debug, Clone)]
pub enum RunEvent<'a> {
    Started {
        run_id: &'a str,
        board: &'a str,
    },
    NoResults,
    PageCountResolved {
        total_results: u64,
        page_count: u32,
        clamped: bool,
    },
    PageFetched {
        page: u32,
        listings: usize,
    },
    PageMissing {
        page: u32,
    },
    ListingsCollected {
        unique: usize,
        duplicates: usize,
    },
    ListingFetched {
        id: &'a ListingId,
    },
    ListingAbsent {
        id: &'a ListingId,
    },
    Aborted {
        error: &'a str,
    },
    Completed {
        rows: usize,
        absent: usize,
    },
}

/// Trait for receiving run events (decoupled logging).
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunReporter;

impl RunReporter for TracingRunReporter {
    fn report(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Started { run_id, board } => {
                tracing::info!(%run_id, %board, "Run started");
            }
            RunEvent::NoResults => {
                tracing::info!("No jobs found for query");
            }
            RunEvent::PageCountResolved {
                total_results,
                page_count,
                clamped,
            } => {
                tracing::info!(%total_results, %page_count, %clamped, "Page count resolved");
            }
            RunEvent::PageFetched { page, listings } => {
                tracing::debug!(%page, %listings, "Search page fetched");
            }
            RunEvent::PageMissing { page } => {
                tracing::warn!(%page, "Search page not found, treating as empty");
            }
            RunEvent::ListingsCollected { unique, duplicates } => {
                tracing::info!(%unique, %duplicates, "Listing identifiers collected");
            }
            RunEvent::ListingFetched { id } => {
                tracing::debug!(listing_id = %id, "Listing fetched");
            }
            RunEvent::ListingAbsent { id } => {
                tracing::info!(listing_id = %id, "Listing absent, skipped");
            }
            RunEvent::Aborted { error } => {
                tracing::error!(%error, "Run aborted");
            }
            RunEvent::Completed { rows, absent } => {
                tracing::info!(%rows, %absent, "Run completed");
            }
        }
    }
}
