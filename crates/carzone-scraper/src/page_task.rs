//! One page of work: fetch, map, optionally enrich.
//!
//! A page task never fails outward. Whatever happens, it resolves to a
//! [`PageOutcome`] describing what it produced and what went wrong, so one
//! bad page cannot take its chunk siblings down with it.

use std::sync::Arc;

use carzone_core::Record;
use futures::stream::{self, StreamExt};

use crate::catalog::CatalogEndpoints;
use crate::error::ScraperError;
use crate::mapper::{map_page, merge_details};
use crate::retry::{RetryState, RetryingFetcher};
use crate::stats::{AttemptSlots, ErrorEntry, PageIndex};

/// Per-record detail fetching settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrichment {
    /// Detail fetches in flight at once within one page. `1` is sequential.
    pub concurrency: usize,
}

/// Everything one page task reports back to the orchestrator.
#[derive(Debug)]
pub struct PageOutcome {
    pub page: PageIndex,
    pub url: String,
    /// Either every successfully mapped (and, if enabled, enriched) record of
    /// the page in API order, or empty when the page itself failed.
    pub records: Vec<Record>,
    pub slots: AttemptSlots,
    pub errors: Vec<ErrorEntry>,
    pub detail_requests: u64,
    pub records_dropped: u64,
    pub succeeded: bool,
}

impl PageOutcome {
    pub(crate) fn failed(
        page: PageIndex,
        url: String,
        err: &ScraperError,
        slots: AttemptSlots,
    ) -> Self {
        let error = ErrorEntry::from_error(page, url.clone(), err);
        Self {
            page,
            url,
            records: Vec::new(),
            slots,
            errors: vec![error],
            detail_requests: 0,
            records_dropped: 0,
            succeeded: false,
        }
    }
}

struct DetailResult {
    record: Result<Record, (String, ScraperError)>,
    retry: RetryState,
}

pub struct PageTask {
    fetcher: RetryingFetcher,
    endpoints: Arc<CatalogEndpoints>,
    enrichment: Option<Enrichment>,
}

impl PageTask {
    #[must_use]
    pub fn new(
        fetcher: RetryingFetcher,
        endpoints: Arc<CatalogEndpoints>,
        enrichment: Option<Enrichment>,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            enrichment,
        }
    }

    /// Fetches and maps page `page`.
    ///
    /// A page that cannot be fetched or mapped yields no records and one
    /// error entry. With enrichment on, a record whose detail fetch fails is
    /// dropped entirely; its siblings are kept.
    pub async fn run(&self, page: PageIndex) -> PageOutcome {
        let url = self.endpoints.page_url(page);
        let mut slots = AttemptSlots::default();

        let fetched = self.fetcher.fetch(&url).await;
        slots.charge(&fetched.retry);

        let body = match fetched.result {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(page, url = %url, error = %e, "page fetch failed — page contributes nothing");
                return PageOutcome::failed(page, url, &e, slots);
            }
        };

        let records = match map_page(&body) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(page, url = %url, error = %e, "page mapping failed — page contributes nothing");
                return PageOutcome::failed(page, url, &e, slots);
            }
        };

        let mut outcome = PageOutcome {
            page,
            url,
            records: Vec::new(),
            slots,
            errors: Vec::new(),
            detail_requests: 0,
            records_dropped: 0,
            succeeded: true,
        };

        match self.enrichment {
            Some(enrichment) => self.enrich(&mut outcome, records, enrichment).await,
            None => outcome.records = records,
        }

        tracing::debug!(
            page,
            records = outcome.records.len(),
            dropped = outcome.records_dropped,
            "page settled"
        );
        outcome
    }

    async fn enrich(&self, outcome: &mut PageOutcome, records: Vec<Record>, enrichment: Enrichment) {
        // `buffered` yields in input order regardless of completion order.
        let results: Vec<DetailResult> = stream::iter(records)
            .map(|record| self.fetch_details(record))
            .buffered(enrichment.concurrency.max(1))
            .collect()
            .await;

        for result in results {
            outcome.slots.charge(&result.retry);
            if result.retry.attempts > 0 {
                outcome.detail_requests += 1;
            }
            match result.record {
                Ok(record) => outcome.records.push(record),
                Err((url, e)) => {
                    tracing::warn!(
                        page = outcome.page,
                        url = %url,
                        error = %e,
                        "detail fetch failed — dropping record"
                    );
                    outcome.records_dropped += 1;
                    outcome
                        .errors
                        .push(ErrorEntry::from_error(outcome.page, url, &e));
                }
            }
        }
    }

    async fn fetch_details(&self, record: Record) -> DetailResult {
        let Some(reference) = record.public_reference().map(str::to_owned) else {
            return DetailResult {
                record: Err((
                    "(no publicReference)".to_owned(),
                    ScraperError::Mapping {
                        context: "detail enrichment".to_owned(),
                        reason: "record has no publicReference".to_owned(),
                    },
                )),
                retry: RetryState::default(),
            };
        };

        let url = self.endpoints.detail_url(&reference);
        let fetched = self.fetcher.fetch(&url).await;

        let record = fetched
            .result
            .and_then(|detail| merge_details(record, &detail))
            .map_err(|e| (url, e));

        DetailResult {
            record,
            retry: fetched.retry,
        }
    }
}

#[cfg(test)]
#[path = "page_task_test.rs"]
mod tests;
