//! Upstream ticker price fetcher.

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::FetchError;

/// One `{symbol, price}` entry of the ticker response.
///
/// The price is kept as the decimal string the API returned; parsing is
/// left to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub price: String,
}

impl PriceRecord {
    pub fn new(symbol: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: price.into(),
        }
    }
}

/// Fetches ticker prices for a list of symbols in a single request.
#[derive(Debug, Clone)]
pub struct PriceFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl PriceFetcher {
    /// Create a fetcher for the configured upstream.
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid upstream URL {}: {}", config.base_url, e))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, base_url })
    }

    /// Build the request URL: `<base_url>?symbols=<urlencoded JSON array>`.
    pub fn request_url(&self, symbols: &[String]) -> Result<Url, FetchError> {
        let encoded = serde_json::to_string(symbols)?;
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("symbols", &encoded);
        Ok(url)
    }

    /// Fetch current prices for `symbols`.
    ///
    /// Issues exactly one GET. Any status other than 200 is an error and
    /// its body is discarded unread.
    pub async fn fetch_prices(&self, symbols: &[String]) -> Result<Vec<PriceRecord>, FetchError> {
        let url = self.request_url(symbols)?;
        debug!(%url, count = symbols.len(), "Fetching prices");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UpstreamStatus(status));
        }

        let body = response.bytes().await?;
        let records: Vec<PriceRecord> = serde_json::from_slice(&body)?;

        debug!(count = records.len(), "Fetched prices");
        Ok(records)
    }
}
