//! Catalog API response shapes that are decoded into typed structs.
//!
//! Listing items and detail payloads stay as `serde_json::Value` and are
//! flattened by [`crate::mapper`]; only the discovery envelope has a fixed
//! shape worth deserializing.
//!
//! ## Observed listing envelope
//!
//! ```text
//! {
//!   "totalPages": 175,
//!   "totalResults": 3490,
//!   "results": [ {..banner..}, { "items": [ { "summary": { .. } }, .. ] } ]
//! }
//! ```
//!
//! The item list sits in the *second* element of `results`; the first is
//! promotional content.

use serde::Deserialize;

/// Page-count envelope returned by the unpaged listing endpoint.
#[derive(Debug, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(rename = "totalPages")]
    pub total_pages: u32,

    /// Total listings in the catalog. Absent on some responses.
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<u64>,
}
