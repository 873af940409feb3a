//! Retrying image loader in front of the preload cache.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::cache::PreloadCache;
use super::error::{LoadError, LoadResult};
use super::probe::{HttpImageProbe, ImageProbe};
use crate::config::ImagesConfig;

/// Attempt budget and timing for one `load_image` sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Bound on each individual attempt.
    pub attempt_timeout: Duration,
    /// Wait after failed attempt `n` is `backoff_base * n`.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(images: &ImagesConfig) -> Self {
        Self {
            max_retries: images.max_retries,
            attempt_timeout: images.load_timeout(),
            backoff_base: images.backoff_base(),
        }
    }

    /// Linear backoff after the given (1-based) failed attempt.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ImagesConfig::default())
    }
}

/// Loads images with bounded retries, remembering outcomes in a
/// [`PreloadCache`].
///
/// Failures are returned as values; `load_image` never errors.
pub struct ImageLoader {
    probe: Arc<dyn ImageProbe>,
    cache: Arc<PreloadCache>,
    policy: RetryPolicy,
}

impl ImageLoader {
    pub fn new(probe: Arc<dyn ImageProbe>, cache: Arc<PreloadCache>, policy: RetryPolicy) -> Self {
        Self {
            probe,
            cache,
            policy,
        }
    }

    /// Loader backed by [`HttpImageProbe`] and a fresh cache. The probe's
    /// client timeout matches the per-attempt timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn http(policy: RetryPolicy) -> anyhow::Result<Self> {
        let probe = HttpImageProbe::new(policy.attempt_timeout)?;
        Ok(Self::new(
            Arc::new(probe),
            Arc::new(PreloadCache::new()),
            policy,
        ))
    }

    pub fn is_loaded(&self, url: &str) -> bool {
        self.cache.is_loaded(url)
    }

    pub fn has_failed(&self, url: &str) -> bool {
        self.cache.has_failed(url)
    }

    /// Forgets any recorded outcome for `url`. No I/O.
    pub fn retry(&self, url: &str) {
        self.cache.retry(url);
    }

    /// Loads `url` with the policy's retry budget.
    pub async fn load_image(&self, url: &str, cancel: &CancellationToken) -> LoadResult {
        self.load_image_with(url, self.policy.max_retries, cancel)
            .await
    }

    /// Loads `url` with up to `max_retries + 1` attempts.
    ///
    /// Known-good and known-bad URLs resolve immediately without I/O. A
    /// cancelled sequence resolves with [`LoadError::Cancelled`] and leaves
    /// the ledger untouched.
    pub async fn load_image_with(
        &self,
        url: &str,
        max_retries: u32,
        cancel: &CancellationToken,
    ) -> LoadResult {
        if url.is_empty() {
            return LoadResult::failed(url, LoadError::EmptyUrl);
        }
        if self.cache.is_loaded(url) {
            debug!(url, "image cache hit");
            return LoadResult::loaded(url);
        }
        if self.cache.has_failed(url) {
            debug!(url, "image previously failed; skipping");
            return LoadResult::failed(url, LoadError::PreviousFailure);
        }

        let attempts = max_retries.saturating_add(1);
        let mut attempt = 1;
        let error = loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return LoadResult::failed(url, LoadError::Cancelled),
                outcome = tokio::time::timeout(self.policy.attempt_timeout, self.probe.probe(url)) => outcome,
            };

            let err = match outcome {
                Ok(Ok(())) => {
                    self.cache.mark_loaded(url);
                    debug!(url, attempt, "image loaded");
                    return LoadResult::loaded(url);
                }
                Ok(Err(err)) => err,
                Err(_) => LoadError::Timeout(self.policy.attempt_timeout),
            };

            if attempt >= attempts {
                break err;
            }

            let delay = self.policy.backoff_after(attempt);
            debug!(url, attempt, error = %err, delay_ms = delay.as_millis() as u64, "image attempt failed; backing off");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return LoadResult::failed(url, LoadError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        };

        self.cache.mark_failed(url);
        warn!(url, attempts, error = %error, "image failed after all attempts");
        LoadResult::failed(url, error)
    }
}
