pub mod catalog;
pub mod error;
pub mod mapper;
pub mod orchestrator;
pub mod page_task;
pub mod result_set;
pub mod retry;
pub mod stats;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use carzone_core::{FieldValue, Record};
pub use catalog::CatalogEndpoints;
pub use error::ScraperError;
pub use mapper::{map_listing, map_page, merge_details};
pub use orchestrator::{Discovery, Orchestrator, RunOptions, RunOutput};
pub use result_set::ResultSet;
pub use retry::{FetchOutcome, RetryPolicy, RetryState, RetryingFetcher};
pub use stats::{AttemptSlots, ErrorEntry, PageIndex, RunStats};
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use types::DiscoveryResponse;
