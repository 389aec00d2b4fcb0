use thiserror::Error;

/// Failure of a single upstream price fetch.
///
/// Any of these aborts the scrape that triggered the fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Short label used for the fetch error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::UpstreamStatus(_) => "status",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// A price string that could not be parsed as a float.
#[derive(Debug, Clone, Error)]
#[error("invalid price {price:?} for {symbol}: {source}")]
pub struct PriceParseError {
    pub symbol: String,
    pub price: String,
    #[source]
    pub source: InvalidPrice,
}

/// Why a price string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPrice {
    #[error(transparent)]
    Syntax(#[from] std::num::ParseFloatError),

    /// Parsed, but overflowed to infinity or is NaN.
    #[error("value is out of range")]
    NotFinite,
}

/// Failure of a whole scrape, reported to the scraper as a 500.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to fetch prices: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to render metrics: {0}")]
    Render(#[from] std::fmt::Error),
}
