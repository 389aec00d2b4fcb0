//! Scrape pipeline: resolve symbols, fetch, publish, render.

use std::sync::Arc;

use tracing::debug;

use crate::cache::PriceCache;
use crate::config::ExporterConfig;
use crate::error::{FetchError, ScrapeError};
use crate::fetcher::{PriceFetcher, PriceRecord};
use crate::publisher::MetricPublisher;
use crate::registry::{FetchErrorLabels, SharedRegistry};
use crate::symbols::SymbolResolver;

/// Runs one fetch-and-publish cycle per scrape.
///
/// Without a configured cache TTL every scrape hits the upstream API.
#[derive(Debug)]
pub struct Scraper {
    resolver: SymbolResolver,
    fetcher: PriceFetcher,
    publisher: MetricPublisher,
    registry: SharedRegistry,
    cache: Option<PriceCache>,
}

impl Scraper {
    /// Create a scraper publishing into `registry`.
    pub fn new(config: &ExporterConfig, registry: SharedRegistry) -> anyhow::Result<Self> {
        Ok(Self {
            resolver: SymbolResolver::new(config.upstream.symbols_env.clone()),
            fetcher: PriceFetcher::new(&config.upstream)?,
            publisher: MetricPublisher::new(registry.prices().clone()),
            cache: config.cache.ttl().map(PriceCache::new),
            registry,
        })
    }

    /// Registry this scraper publishes into.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Fetch and publish current prices, then render the registry.
    ///
    /// On a fetch failure the price gauges are left untouched and nothing
    /// is rendered.
    pub async fn scrape(&self) -> Result<String, ScrapeError> {
        let metrics = self.registry.exporter_metrics();
        metrics.scrapes.inc();

        let symbols = self.resolver.resolve();

        let records = match self.prices(&symbols).await {
            Ok(records) => records,
            Err(e) => {
                metrics
                    .fetch_errors
                    .get_or_create(&FetchErrorLabels {
                        kind: e.kind().to_string(),
                    })
                    .inc();
                return Err(e.into());
            }
        };

        let summary = self.publisher.publish(&records);
        if !summary.skipped.is_empty() {
            metrics
                .price_parse_errors
                .inc_by(summary.skipped.len() as u64);
        }

        debug!(
            symbols = symbols.len(),
            published = summary.published,
            skipped = summary.skipped.len(),
            "Scrape completed"
        );

        Ok(self.registry.render()?)
    }

    async fn prices(&self, symbols: &[String]) -> Result<Vec<PriceRecord>, FetchError> {
        if let Some(cache) = &self.cache
            && let Some(records) = cache.get(symbols)
        {
            debug!("Serving prices from cache");
            return Ok(records);
        }

        let records = self.fetcher.fetch_prices(symbols).await?;

        if let Some(cache) = &self.cache {
            cache.put(symbols, records.clone());
        }

        Ok(records)
    }
}

/// Shareable scraper handle.
pub type SharedScraper = Arc<Scraper>;
