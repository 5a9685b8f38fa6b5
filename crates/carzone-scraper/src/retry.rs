//! Fixed-delay retry for catalog fetches.
//!
//! A logical fetch (one page, one detail payload, or the discovery call) is
//! attempted at most `max_retries` times. Only non-2xx statuses are retried;
//! the wait between attempts is constant. Pacing against upstream rate limits
//! happens between chunks in the orchestrator.
//!
//! Transport failures (connection refused, timeout, malformed body) end the
//! fetch immediately. They still count as a failed attempt in [`RetryState`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ScraperError;
use crate::transport::Transport;

/// Attempt budget and inter-attempt delay shared by every fetch in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per logical fetch, including the first. Never below 1.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }
}

/// Counters for a single logical fetch. Discarded once the fetch resolves
/// and its numbers have been folded into the run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub attempts: u32,
    /// Attempts that did not produce a usable body. Attempt slots
    /// `0..failed_attempts` are the ones charged in the run report.
    pub failed_attempts: u32,
    pub cumulative_delay: Duration,
}

/// Result of one logical fetch together with the counters it accumulated.
#[derive(Debug)]
pub struct FetchOutcome {
    pub result: Result<serde_json::Value, ScraperError>,
    pub retry: RetryState,
}

/// Returns `true` if `err` is worth another attempt after the fixed delay.
///
/// Only [`ScraperError::NonSuccessStatus`] qualifies. Everything else
/// (transport failures, mapping and decode errors) ends the fetch.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(err, ScraperError::NonSuccessStatus { .. })
}

/// Executes `operation` until it succeeds, fails with a non-retriable error,
/// or `policy.max_retries` attempts have been made.
///
/// `state` is updated on every attempt. When the budget runs out on a
/// non-success status the error is converted into
/// [`ScraperError::RetryExhausted`] carrying the last status seen. No delay is
/// taken after the final attempt.
pub(crate) async fn retry_with_fixed_delay<T, F, Fut>(
    policy: RetryPolicy,
    state: &mut RetryState,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_retries = policy.max_retries.max(1);

    loop {
        state.attempts += 1;
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        state.failed_attempts += 1;

        if !is_retriable(&err) {
            return Err(err);
        }

        if state.attempts >= max_retries {
            return Err(match err {
                ScraperError::NonSuccessStatus { status, url } => ScraperError::RetryExhausted {
                    url,
                    last_status: status,
                    attempts: state.attempts,
                },
                other => other,
            });
        }

        let delay_ms = u64::try_from(policy.retry_delay.as_millis()).unwrap_or(u64::MAX);
        tracing::warn!(
            attempt = state.attempts,
            max_retries,
            delay_ms,
            error = %err,
            "non-success status — retrying after fixed delay"
        );
        if !policy.retry_delay.is_zero() {
            tokio::time::sleep(policy.retry_delay).await;
        }
        state.cumulative_delay += policy.retry_delay;
    }
}

/// Wraps a [`Transport`] with the run's [`RetryPolicy`].
///
/// Cheap to clone; clones share the same underlying transport (and therefore
/// the same connection pool).
#[derive(Clone)]
pub struct RetryingFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches `url` and returns its JSON body, retrying non-2xx statuses.
    ///
    /// Never panics and never returns early without a [`FetchOutcome`]; the
    /// caller decides how a failed fetch is contained.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let transport = self.transport.as_ref();
        let mut retry = RetryState::default();

        let result = retry_with_fixed_delay(self.policy, &mut retry, || async move {
            let response = transport.get(url).await?;
            if response.is_success() {
                Ok(response.body)
            } else {
                Err(ScraperError::NonSuccessStatus {
                    status: response.status,
                    url: url.to_owned(),
                })
            }
        })
        .await;

        match &result {
            Ok(_) => tracing::debug!(url, attempts = retry.attempts, "fetch succeeded"),
            Err(e) => tracing::debug!(url, attempts = retry.attempts, error = %e, "fetch failed"),
        }

        FetchOutcome { result, retry }
    }
}
