//! Drives a whole harvesting run: discovery, chunked page scheduling, and
//! in-order assembly of the result set.
//!
//! Pages are launched `chunk_size` at a time and each chunk is awaited in
//! full before the next one starts, so at most `chunk_size` page tasks are in
//! flight. Completion order inside a chunk does not matter: outcomes are
//! sorted by page before they are appended.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use carzone_core::AppConfig;
use futures::stream::{self, StreamExt};

use crate::catalog::CatalogEndpoints;
use crate::error::ScraperError;
use crate::page_task::{Enrichment, PageOutcome, PageTask};
use crate::result_set::ResultSet;
use crate::retry::{RetryPolicy, RetryState, RetryingFetcher};
use crate::stats::{PageIndex, RunStats};
use crate::transport::{HttpTransport, Transport};
use crate::types::DiscoveryResponse;

/// Per-run scheduling knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Pages to fetch. Zero or negative triggers discovery.
    pub page_count: i64,
    pub first_page: PageIndex,
    /// Concurrency cap: page tasks launched together per chunk.
    pub chunk_size: usize,
    /// Pause between consecutive chunks. Not taken after the last one.
    pub inter_chunk_delay: Duration,
    pub enrichment_enabled: bool,
    pub detail_concurrency: usize,
}

impl RunOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_count: config.page_count,
            first_page: config.first_page,
            chunk_size: config.chunk_size,
            inter_chunk_delay: config.inter_chunk_delay(),
            enrichment_enabled: config.enrichment_enabled,
            detail_concurrency: config.detail_concurrency,
        }
    }

    fn enrichment(&self) -> Option<Enrichment> {
        self.enrichment_enabled.then(|| Enrichment {
            concurrency: self.detail_concurrency.max(1),
        })
    }
}

/// Catalog size as reported by the discovery call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discovery {
    pub total_pages: u32,
    pub total_items: Option<u64>,
}

/// Everything a finished run hands back.
#[derive(Debug)]
pub struct RunOutput {
    pub records: ResultSet,
    pub stats: RunStats,
}

pub struct Orchestrator {
    fetcher: RetryingFetcher,
    endpoints: Arc<CatalogEndpoints>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoints: CatalogEndpoints,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            fetcher: RetryingFetcher::new(transport, policy),
            endpoints: Arc::new(endpoints),
        }
    }

    /// Builds an orchestrator backed by [`HttpTransport`] from resolved config.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] for unusable endpoint URLs, or
    /// [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let endpoints = CatalogEndpoints::new(&config.base_url, &config.detail_base_url)?;
        let transport = HttpTransport::new(config.request_timeout_secs, &config.user_agent)?;
        let policy = RetryPolicy::new(config.max_retries, config.retry_delay());
        Ok(Self::new(Arc::new(transport), endpoints, policy))
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.fetcher.policy()
    }

    /// Asks the catalog how many pages (and listings) it holds.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Discovery`] if the discovery fetch fails after
    /// retries, or [`ScraperError::Deserialize`] if the body has no usable
    /// `totalPages`.
    pub async fn discover(&self) -> Result<Discovery, ScraperError> {
        self.discover_tracked().await.0
    }

    async fn discover_tracked(&self) -> (Result<Discovery, ScraperError>, RetryState) {
        let url = self.endpoints.discovery_url();
        let fetched = self.fetcher.fetch(&url).await;

        let result = fetched
            .result
            .map_err(|e| ScraperError::Discovery {
                url: url.clone(),
                reason: e.to_string(),
            })
            .and_then(|body| {
                serde_json::from_value::<DiscoveryResponse>(body).map_err(|source| {
                    ScraperError::Deserialize {
                        context: format!("discovery response from {url}"),
                        source,
                    }
                })
            })
            .map(|response| Discovery {
                total_pages: response.total_pages,
                total_items: response.total_results,
            });

        match &result {
            Ok(discovery) => tracing::info!(
                url = %url,
                total_pages = discovery.total_pages,
                total_items = ?discovery.total_items,
                "discovery complete"
            ),
            Err(e) => tracing::error!(url = %url, error = %e, "discovery failed"),
        }

        (result, fetched.retry)
    }

    /// Runs the whole harvest described by `options`.
    ///
    /// Page and record failures are contained and show up in
    /// [`RunStats::errors`]; the run always completes with whatever it
    /// collected.
    ///
    /// # Errors
    ///
    /// A failed discovery call aborts the run, but only when
    /// `options.page_count` asks for discovery. A page range that runs past
    /// the largest page index aborts it with
    /// [`ScraperError::InvalidPageRange`] before any page is fetched.
    pub async fn run(&self, options: &RunOptions) -> Result<RunOutput, ScraperError> {
        let mut stats = RunStats::start(self.fetcher.policy().max_retries);
        let mut records = ResultSet::default();

        let page_count: u64 = if options.page_count > 0 {
            options.page_count.unsigned_abs()
        } else {
            let (discovery, retry) = self.discover_tracked().await;
            stats.record_discovery(&retry);
            let discovery = discovery?;
            stats.items_expected = discovery.total_items;
            u64::from(discovery.total_pages)
        };

        let first = options.first_page;
        let end = page_range_end(first, page_count)?;
        stats.pages_expected = Some(end - first);

        let chunk_size = u32::try_from(options.chunk_size.max(1)).unwrap_or(u32::MAX);
        let chunk_total = page_count.div_ceil(u64::from(chunk_size));
        let task = PageTask::new(
            self.fetcher.clone(),
            Arc::clone(&self.endpoints),
            options.enrichment(),
        );

        tracing::info!(
            pages = page_count,
            first_page = first,
            chunk_size,
            enrichment = options.enrichment_enabled,
            "starting run"
        );

        for (chunk_idx, chunk) in (1u64..).zip(chunk_ranges(first, end, chunk_size)) {
            stats.pages_requested += chunk.end - chunk.start;

            let outcomes = run_chunk(&task, chunk).await;
            for outcome in outcomes {
                records.extend(stats.absorb(outcome));
            }

            tracing::info!(
                chunk = chunk_idx,
                chunks = chunk_total,
                records = records.len(),
                errors = stats.errors.len(),
                "chunk settled"
            );

            let is_last = chunk_idx == chunk_total;
            if !is_last && !options.inter_chunk_delay.is_zero() {
                tokio::time::sleep(options.inter_chunk_delay).await;
            }
        }

        stats.finish();

        if stats.is_degraded() {
            tracing::warn!(
                pages_failed = stats.pages_failed,
                records_dropped = stats.records_dropped,
                errors = stats.errors.len(),
                "run completed with gaps"
            );
        } else {
            tracing::info!(records = records.len(), "run completed");
        }

        Ok(RunOutput { records, stats })
    }
}

/// Exclusive end of the page range `first..first + page_count`.
fn page_range_end(first: PageIndex, page_count: u64) -> Result<PageIndex, ScraperError> {
    u32::try_from(page_count)
        .ok()
        .and_then(|count| first.checked_add(count))
        .ok_or(ScraperError::InvalidPageRange {
            first_page: first,
            page_count,
        })
}

/// Splits `first..end` into consecutive ranges of at most `chunk_size` pages,
/// produced one at a time.
fn chunk_ranges(
    first: PageIndex,
    end: PageIndex,
    chunk_size: u32,
) -> impl Iterator<Item = Range<PageIndex>> {
    let step = usize::try_from(chunk_size.max(1)).unwrap_or(usize::MAX);
    (first..end)
        .step_by(step)
        .map(move |start| start..start.saturating_add(chunk_size).min(end))
}

/// Launches every page of `chunk` at once and waits for all of them.
///
/// Returned outcomes are in ascending page order.
async fn run_chunk(task: &PageTask, chunk: Range<PageIndex>) -> Vec<PageOutcome> {
    let in_flight = usize::try_from(chunk.end - chunk.start).unwrap_or(usize::MAX);
    let mut outcomes: Vec<PageOutcome> = stream::iter(chunk)
        .map(|page| task.run(page))
        .buffer_unordered(in_flight.max(1))
        .collect()
        .await;
    outcomes.sort_by_key(|outcome| outcome.page);
    outcomes
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
