use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection failure, timeout, or an unreadable/malformed body.
    /// Ends the current fetch without further attempts.
    #[error("transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// One attempt answered with a status outside 2xx. Retried after a delay.
    #[error("unexpected HTTP status {status} from {url}")]
    NonSuccessStatus { status: u16, url: String },

    #[error("gave up on {url} after {attempts} attempts (last status {last_status})")]
    RetryExhausted {
        url: String,
        last_status: u16,
        attempts: u32,
    },

    #[error("mapping error for {context}: {reason}")]
    Mapping { context: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("page discovery failed for {url}: {reason}")]
    Discovery { url: String, reason: String },

    /// `first_page + page_count` does not fit the page index type.
    #[error("page range starting at {first_page} with {page_count} pages exceeds the page index range")]
    InvalidPageRange { first_page: u32, page_count: u64 },

    #[error("invalid catalog URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ScraperError {
    /// The HTTP status behind this error, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ScraperError::NonSuccessStatus { status, .. } => Some(*status),
            ScraperError::RetryExhausted { last_status, .. } => Some(*last_status),
            ScraperError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
