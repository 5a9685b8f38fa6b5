//! Run statistics and the error log.
//!
//! [`RunStats`] has a single owner, the orchestrator. Page tasks never touch
//! it; each task hands back one [`PageOutcome`] which is folded in with
//! [`RunStats::absorb`] after the task's chunk settles.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::error::ScraperError;
use crate::page_task::PageOutcome;
use crate::retry::RetryState;

/// Page number in the catalog API's own numbering.
pub type PageIndex = u32;

/// One contained failure: what was being fetched and why it was given up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub page: PageIndex,
    pub url: String,
    /// Last HTTP status seen, when the failure came from one.
    pub status: Option<u16>,
    pub cause: String,
}

impl ErrorEntry {
    pub(crate) fn from_error(page: PageIndex, url: String, err: &ScraperError) -> Self {
        Self {
            page,
            url,
            status: err.status(),
            cause: err.to_string(),
        }
    }
}

/// Failed-attempt tally indexed by attempt ordinal.
///
/// Slot `i` counts how many fetches failed on their `i`-th attempt
/// (0-based), so a fetch that failed three times charges slots 0, 1 and 2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptSlots(Vec<u64>);

impl AttemptSlots {
    #[must_use]
    pub fn new(slots: usize) -> Self {
        Self(vec![0; slots])
    }

    /// Charges the failed attempts recorded in `state`.
    pub fn charge(&mut self, state: &RetryState) {
        let failed = usize::try_from(state.failed_attempts).unwrap_or(usize::MAX);
        if self.0.len() < failed {
            self.0.resize(failed, 0);
        }
        for slot in self.0.iter_mut().take(failed) {
            *slot += 1;
        }
    }

    pub fn merge(&mut self, other: &AttemptSlots) {
        if self.0.len() < other.0.len() {
            self.0.resize(other.0.len(), 0);
        }
        for (mine, theirs) in self.0.iter_mut().zip(&other.0) {
            *mine += theirs;
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

/// Aggregate outcome of one orchestration run.
///
/// Returned by value once the run finishes; never shared between runs.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Page count reported by discovery, or the explicit page count requested.
    pub pages_expected: Option<u32>,
    /// Listing count reported by discovery, when the API provides one.
    pub items_expected: Option<u64>,
    /// Page tasks launched.
    pub pages_requested: u32,
    pub pages_succeeded: u32,
    pub pages_failed: u32,
    pub detail_requests: u64,
    /// Records removed because their detail fetch failed.
    pub records_dropped: u64,
    /// Records that made it into the result set.
    pub items_received: u64,
    pub retries_by_slot: AttemptSlots,
    /// Failed attempts charged to each page, including its detail fetches.
    pub failed_attempts_by_page: BTreeMap<PageIndex, u32>,
    /// Contained failures in page order.
    pub errors: Vec<ErrorEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStats {
    pub(crate) fn start(max_retries: u32) -> Self {
        Self {
            pages_expected: None,
            items_expected: None,
            pages_requested: 0,
            pages_succeeded: 0,
            pages_failed: 0,
            detail_requests: 0,
            records_dropped: 0,
            items_received: 0,
            retries_by_slot: AttemptSlots::new(usize::try_from(max_retries).unwrap_or(0)),
            failed_attempts_by_page: BTreeMap::new(),
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record_discovery(&mut self, state: &RetryState) {
        self.retries_by_slot.charge(state);
    }

    /// Folds one settled page into the totals and hands back its records.
    pub(crate) fn absorb(&mut self, outcome: PageOutcome) -> Vec<crate::Record> {
        let PageOutcome {
            page,
            records,
            slots,
            errors,
            detail_requests,
            records_dropped,
            succeeded,
            ..
        } = outcome;

        if succeeded {
            self.pages_succeeded += 1;
        } else {
            self.pages_failed += 1;
        }
        self.detail_requests += detail_requests;
        self.records_dropped += records_dropped;
        self.items_received += records.len() as u64;

        let failed = u32::try_from(slots.total()).unwrap_or(u32::MAX);
        if failed > 0 {
            *self.failed_attempts_by_page.entry(page).or_insert(0) += failed;
        }
        self.retries_by_slot.merge(&slots);
        self.errors.extend(errors);

        records
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run, once finished.
    #[must_use]
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }

    #[must_use]
    pub fn total_retries(&self) -> u64 {
        self.retries_by_slot.total()
    }

    /// `true` when the run yielded less than it expected to.
    ///
    /// A degraded run still completed; it just has gaps worth inspecting.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        let missing_pages = self
            .pages_expected
            .is_some_and(|expected| self.pages_succeeded < expected);
        let missing_items = self
            .items_expected
            .is_some_and(|expected| self.items_received < expected);
        !self.errors.is_empty() || missing_pages || missing_items
    }

    /// Human-readable run report, one line per entry.
    #[must_use]
    pub fn report(&self) -> Vec<String> {
        let or_unknown = |v: Option<String>| v.unwrap_or_else(|| "unknown".to_owned());

        let mut lines = vec![
            format!(
                "pages: {} requested / {} expected ({} succeeded, {} failed)",
                self.pages_requested,
                or_unknown(self.pages_expected.map(|n| n.to_string())),
                self.pages_succeeded,
                self.pages_failed
            ),
            format!(
                "items: {} received / {} expected",
                self.items_received,
                or_unknown(self.items_expected.map(|n| n.to_string()))
            ),
        ];

        if self.detail_requests > 0 || self.records_dropped > 0 {
            lines.push(format!(
                "details: {} fetched, {} records dropped",
                self.detail_requests, self.records_dropped
            ));
        }

        let mut slots = String::from("retries by attempt:");
        for (idx, count) in self.retries_by_slot.as_slice().iter().enumerate() {
            let _ = write!(slots, " #{}={count}", idx + 1);
        }
        lines.push(slots);

        if let Some(elapsed) = self.elapsed() {
            #[allow(clippy::cast_precision_loss)]
            let secs = elapsed.num_milliseconds() as f64 / 1000.0;
            lines.push(format!("elapsed: {secs:.1}s"));
        }

        lines.push(format!("errors: {}", self.errors.len()));
        for entry in &self.errors {
            lines.push(format!("  page {}: {} ({})", entry.page, entry.url, entry.cause));
        }

        lines
    }
}
