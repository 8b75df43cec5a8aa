//! Job board adapters.
//!
//! Each adapter only describes its site: query keys, page geometry,
//! markers and document lookups. Fetching and merging live in
//! [`jobscout_core::engine`].

mod adzuna;
mod indeed;
mod seek;

pub use adzuna::Adzuna;
pub use indeed::Indeed;
pub use seek::Seek;

use jobscout_core::error::AppError;
use regex::Regex;
use url::Url;

/// Parse a displayed result count such as `1,250` or `1250.0`.
pub(crate) fn parse_count(raw: &str) -> Result<u64, AppError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    cleaned
        .parse::<u64>()
        .or_else(|_| cleaned.parse::<f64>().map(|n| n as u64))
        .map_err(|_| AppError::ExtractionError(format!("unreadable result count '{raw}'")))
}

pub(crate) fn pattern(re: &str) -> Result<Regex, AppError> {
    Regex::new(re).map_err(|e| AppError::ParseError(format!("invalid pattern '{re}': {e}")))
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, AppError> {
    Url::parse(raw).map_err(|e| AppError::InvalidQuery(format!("{raw}: {e}")))
}
