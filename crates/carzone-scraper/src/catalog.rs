//! URL construction for the catalog's listing, discovery and detail endpoints.

use reqwest::Url;

use crate::error::ScraperError;
use crate::stats::PageIndex;

/// Listing and detail endpoint roots for one catalog.
///
/// Both URLs are validated once at construction so per-request URL building
/// cannot fail.
#[derive(Debug, Clone)]
pub struct CatalogEndpoints {
    base: Url,
    detail_base: Url,
}

impl CatalogEndpoints {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if either URL does not parse
    /// or cannot carry path segments (e.g. `mailto:`).
    pub fn new(base_url: &str, detail_base_url: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            base: parse_base(base_url)?,
            detail_base: parse_base(detail_base_url)?,
        })
    }

    /// The unpaged listing URL. Its response carries `totalPages`.
    #[must_use]
    pub fn discovery_url(&self) -> String {
        self.base.to_string()
    }

    /// Listing URL for one page, e.g. `https://host/rest/1.0/Car/stock?page=3`.
    #[must_use]
    pub fn page_url(&self, page: PageIndex) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());
        url.to_string()
    }

    /// Detail URL for one listing: the detail root with the percent-encoded
    /// `public_reference` appended as a final path segment.
    #[must_use]
    pub fn detail_url(&self, public_reference: &str) -> String {
        let mut url = self.detail_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(public_reference);
        }
        url.to_string()
    }
}

fn parse_base(raw: &str) -> Result<Url, ScraperError> {
    let url = Url::parse(raw).map_err(|e| ScraperError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ScraperError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "URL cannot carry path segments".to_owned(),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
