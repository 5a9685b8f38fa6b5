use std::path::PathBuf;
use std::time::Duration;

/// Resolved settings for one harvesting process.
///
/// Built from environment variables by [`crate::load_app_config`]; the CLI
/// may override individual fields before a run starts.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listing endpoint. Also answers the page-count discovery call when
    /// requested without a `page` parameter.
    pub base_url: String,
    /// Detail endpoint root; `/{publicReference}` is appended per record.
    pub detail_base_url: String,
    /// Number of pages to fetch. Zero or negative means "ask the API".
    pub page_count: i64,
    /// Index of the first page in the API's numbering (0 or 1).
    pub first_page: u32,
    /// Pages fetched concurrently per chunk.
    pub chunk_size: usize,
    pub inter_chunk_delay_ms: u64,
    /// Total attempts allowed for one logical fetch.
    pub max_retries: u32,
    /// Fixed wait between attempts of the same fetch.
    pub retry_delay_ms: u64,
    pub enrichment_enabled: bool,
    /// Detail fetches in flight at once inside a single page.
    pub detail_concurrency: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub log_level: String,
    pub output_path: PathBuf,
}

impl AppConfig {
    #[must_use]
    pub fn inter_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.inter_chunk_delay_ms)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Returns `true` when the page count must be learned from the API.
    #[must_use]
    pub fn autodetect_pages(&self) -> bool {
        self.page_count <= 0
    }
}
