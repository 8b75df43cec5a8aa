//! Per-host request spacing.
//!
//! Wraps any [`Transport`] so that consecutive requests to the same host
//! are at least `delay` (plus optional jitter) apart. Concurrent fetches
//! to different hosts are not held back by each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::error::AppError;
use crate::traits::{RawResponse, Transport};

/// Spacing applied between requests to one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub delay: Duration,
    /// Upper bound of the uniform random extra wait. `Duration::ZERO` disables it.
    pub jitter: Duration,
}

impl ThrottleConfig {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn effective_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        self.delay + Duration::from_millis(rand_jitter_ms(self.jitter.as_millis() as u64))
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            jitter: Duration::from_millis(250),
        }
    }
}

/// A [`Transport`] that waits out the per-host delay before each request.
#[derive(Clone)]
pub struct ThrottledTransport<T> {
    inner: T,
    config: ThrottleConfig,
    /// Next instant a request to each host may start.
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl<T: Transport> ThrottledTransport<T> {
    pub fn new(inner: T, config: ThrottleConfig) -> Self {
        Self {
            inner,
            config,
            next_slot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// `scheme://host:port` of `url`, or `None` for host-less URLs.
    fn host_key(url: &Url) -> Option<String> {
        let host = url.host_str()?;
        let port = url
            .port_or_known_default()
            .map(|p| format!(":{p}"))
            .unwrap_or_default();
        Some(format!("{}://{host}{port}", url.scheme()))
    }

    /// Reserve the next free slot for `host` and sleep until it arrives.
    ///
    /// Slots are handed out under the lock, so concurrent callers for the
    /// same host queue up one delay apart instead of all waking together.
    async fn wait_for_host(&self, host: String) {
        let wait = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let start = slots.get(&host).copied().filter(|s| *s > now).unwrap_or(now);
            slots.insert(host.clone(), start + self.config.effective_delay());
            start.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tracing::debug!(%host, wait_ms = %wait.as_millis(), "Throttling request");
            tokio::time::sleep(wait).await;
        }
    }
}

impl<T: Transport> Transport for ThrottledTransport<T> {
    async fn get(&self, url: &Url) -> Result<RawResponse, AppError> {
        if let Some(host) = Self::host_key(url) {
            self.wait_for_host(host).await;
        }
        self.inner.get(url).await
    }
}

// ---------------------------------------------------------------------------
// Jitter from a time-seeded xorshift; not for anything security related.
// ---------------------------------------------------------------------------

fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
