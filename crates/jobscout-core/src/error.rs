use thiserror::Error;

/// Application-wide error types for jobscout.
///
/// Every variant is fatal for the run that produced it. Non-fatal
/// conditions (no results, an absent listing) are modelled as outcomes,
/// never as errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The board served an anti-automation challenge instead of content.
    #[error("Blocked by {board}: found '{marker}' at {url}")]
    Blocked {
        board: String,
        url: String,
        marker: String,
    },

    /// The first search page does not exist; the board's base target is wrong.
    #[error("Search entry point not found: {url}")]
    EntryPointNotFound { url: String },

    /// Unexpected non-success HTTP status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A single fetch exceeded its deadline.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// A request target could not be built from the query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A fetched document lacks something the board extractor requires.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// A selector, pattern, or embedded payload failed to parse.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Writing the tabular export failed.
    #[error("Export error: {0}")]
    ExportError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The run was cancelled by its caller.
    #[error("Run cancelled")]
    Cancelled,
}

impl AppError {
    /// Returns true if the board actively rejected the client.
    pub fn is_blocked(&self) -> bool {
        matches!(self, AppError::Blocked { .. })
    }

    /// Returns true if the error points at a misconfigured board or engine
    /// rather than at the remote site.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::EntryPointNotFound { .. }
                | AppError::InvalidQuery(_)
                | AppError::ConfigError(_)
        )
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::ExportError(err.to_string())
    }
}
