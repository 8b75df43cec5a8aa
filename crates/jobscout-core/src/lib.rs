pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod export;
pub mod models;
pub mod reporter;
pub mod throttle;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::EngineConfig;
pub use engine::{RunReport, SearchEngine};
pub use error::AppError;
pub use models::{
    ListingId, ListingRecord, Pagination, QuerySpec, ResultTable, SearchScope, SearchTerms,
    StatusResponse,
};
pub use reporter::{RunReporter, TracingRunReporter};
pub use traits::{JobBoard, Transport};
