use std::time::Duration;

use crate::error::AppError;

/// Tuning knobs shared by every run of an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum fetches in flight within one stage.
    pub concurrency: usize,
    /// Deadline for a single fetch.
    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Read configuration from environment variables.
    ///
    /// - `JOBSCOUT_CONCURRENCY` (optional, defaults to 8)
    /// - `JOBSCOUT_FETCH_TIMEOUT_SECS` (optional, defaults to 30)
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let concurrency = positive_env("JOBSCOUT_CONCURRENCY")?
            .map(|n| n as usize)
            .unwrap_or(defaults.concurrency);
        let fetch_timeout = positive_env("JOBSCOUT_FETCH_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);

        Ok(Self {
            concurrency,
            fetch_timeout,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

fn positive_env(name: &str) -> Result<Option<u64>, AppError> {
    match std::env::var(name) {
        Err(_) => Ok(None),
        Ok(raw) => parse_positive(name, &raw).map(Some),
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u64, AppError> {
    let parsed: u64 = raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {name} '{raw}': must be a positive integer"
        ))
    })?;
    if parsed == 0 {
        return Err(AppError::ConfigError(format!("{name} must be at least 1")));
    }
    Ok(parsed)
}
