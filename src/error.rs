use thiserror::Error;

/// Errors raised while scraping listings or talking to the calendar.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// An expected structural element was missing from a page.
    #[error("Parse failure: {0}")]
    Parse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or HTTP status failure on a page or detail fetch.
    #[error("Fetch failed for {url}: {reason}")]
    UpstreamFetch { url: String, reason: String },

    #[error("No integers found in string: {0:?}")]
    NoIntegerFound(String),

    /// A `data-screening` attribute that is not valid screening JSON.
    #[error("Malformed screening payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Calendar service error: {0}")]
    Calendar(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
