//! Metric registry holding the price gauges and exporter self-metrics.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use tracing::warn;

use crate::config::PrometheusConfig;
use crate::process::ProcessCollector;

/// Content type of [`PriceRegistry::render`] output.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Help text of the price gauge.
pub const PRICE_HELP: &str = "Current cryptocurrency prices from Binance";

/// Labels of one price series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct SymbolLabels {
    pub symbol: String,
}

/// Labels of the fetch error counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct FetchErrorLabels {
    pub kind: String,
}

/// Price gauge family, one `f64` gauge per symbol.
pub type PriceGauges = Family<SymbolLabels, Gauge<f64, AtomicU64>>;

/// Counters describing the exporter's own activity.
#[derive(Debug, Clone, Default)]
pub struct ExporterMetrics {
    /// Scrapes handled.
    pub scrapes: Counter,
    /// Failed upstream fetches, by error kind.
    pub fetch_errors: Family<FetchErrorLabels, Counter>,
    /// Price records skipped because the price did not parse.
    pub price_parse_errors: Counter,
}

/// Process-wide registry, constructed once at startup and shared by `Arc`.
///
/// Gauges are never removed: a symbol dropped from the configuration keeps
/// its last published value until the process restarts.
#[derive(Debug)]
pub struct PriceRegistry {
    registry: Registry,
    prices: PriceGauges,
    exporter: ExporterMetrics,
}

impl PriceRegistry {
    /// Create and populate a registry.
    pub fn new(config: &PrometheusConfig) -> Self {
        let mut registry = Registry::default();

        let prices = PriceGauges::default();
        registry.register(config.metric_name.as_str(), PRICE_HELP, prices.clone());

        let exporter = ExporterMetrics::default();
        let sub = registry.sub_registry_with_prefix("binance_exporter");
        sub.register("scrapes", "Scrapes handled", exporter.scrapes.clone());
        sub.register(
            "fetch_errors",
            "Failed upstream price fetches",
            exporter.fetch_errors.clone(),
        );
        sub.register(
            "price_parse_errors",
            "Price records skipped because the price did not parse",
            exporter.price_parse_errors.clone(),
        );

        if config.process_metrics {
            match ProcessCollector::new() {
                Some(collector) => registry.register_collector(Box::new(collector)),
                None => warn!("Process metrics unavailable on this platform"),
            }
        }

        Self {
            registry,
            prices,
            exporter,
        }
    }

    /// Price gauge family.
    pub fn prices(&self) -> &PriceGauges {
        &self.prices
    }

    /// Exporter self-metrics.
    pub fn exporter_metrics(&self) -> &ExporterMetrics {
        &self.exporter
    }

    /// Render every registered metric in text exposition format.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut output = String::new();
        encode(&mut output, &self.registry)?;
        Ok(output)
    }
}

/// Shareable registry handle.
pub type SharedRegistry = Arc<PriceRegistry>;
