//! Publishing of fetched prices into the gauge family.

use tracing::{trace, warn};

use crate::error::{InvalidPrice, PriceParseError};
use crate::fetcher::PriceRecord;
use crate::registry::{PriceGauges, SymbolLabels};

/// Outcome of one [`MetricPublisher::publish`] call.
#[derive(Debug, Default)]
pub struct PublishSummary {
    /// Gauges set in this batch.
    pub published: usize,
    /// Records skipped because their price did not parse.
    pub skipped: Vec<PriceParseError>,
}

/// Writes price records into the price gauges.
///
/// This is the only writer of price gauge values.
#[derive(Debug, Clone)]
pub struct MetricPublisher {
    gauges: PriceGauges,
}

impl MetricPublisher {
    pub fn new(gauges: PriceGauges) -> Self {
        Self { gauges }
    }

    /// Set one gauge per record.
    ///
    /// A record whose price does not parse is logged and skipped; the rest
    /// of the batch is still published.
    pub fn publish(&self, records: &[PriceRecord]) -> PublishSummary {
        let mut summary = PublishSummary::default();

        for record in records {
            match parse_price(record) {
                Ok(value) => {
                    self.gauges
                        .get_or_create(&SymbolLabels {
                            symbol: record.symbol.clone(),
                        })
                        .set(value);
                    trace!(symbol = %record.symbol, value, "Price published");
                    summary.published += 1;
                }
                Err(e) => {
                    warn!(symbol = %e.symbol, error = %e.source, "Error parsing price");
                    summary.skipped.push(e);
                }
            }
        }

        summary
    }
}

/// Parse a record's price as a base-10 float.
///
/// Values that overflow to infinity, as well as `inf`/`NaN` literals, are
/// rejected: they cannot be rendered as valid sample values.
pub fn parse_price(record: &PriceRecord) -> Result<f64, PriceParseError> {
    let invalid = |source: InvalidPrice| PriceParseError {
        symbol: record.symbol.clone(),
        price: record.price.clone(),
        source,
    };

    let value = record
        .price
        .parse::<f64>()
        .map_err(|e| invalid(e.into()))?;
    if !value.is_finite() {
        return Err(invalid(InvalidPrice::NotFinite));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrometheusConfig;
    use crate::registry::PriceRegistry;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Log sink shared with a scoped fmt subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn warnings(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .filter(|l| l.contains("WARN"))
                .map(str::to_string)
                .collect()
        }
    }

    fn publish_capturing(
        publisher: &MetricPublisher,
        records: &[PriceRecord],
    ) -> (PublishSummary, CapturedLogs) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let summary = tracing::subscriber::with_default(subscriber, || publisher.publish(records));
        (summary, logs)
    }

    fn registry() -> PriceRegistry {
        PriceRegistry::new(&PrometheusConfig {
            process_metrics: false,
            ..Default::default()
        })
    }

    fn value_of(registry: &PriceRegistry, symbol: &str) -> f64 {
        registry
            .prices()
            .get_or_create(&SymbolLabels {
                symbol: symbol.to_string(),
            })
            .get()
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(
            parse_price(&PriceRecord::new("BTCUSDT", "65000.12000000")).unwrap(),
            65000.12
        );
        assert_eq!(parse_price(&PriceRecord::new("X", "1e3")).unwrap(), 1000.0);
        assert!(parse_price(&PriceRecord::new("X", "abc")).is_err());
        assert!(parse_price(&PriceRecord::new("X", "")).is_err());
        assert!(parse_price(&PriceRecord::new("X", "1,5")).is_err());
    }

    #[test]
    fn test_parse_price_rejects_non_finite() {
        for price in ["1e400", "-1e400", "inf", "-Infinity", "NaN"] {
            let err = parse_price(&PriceRecord::new("BIG", price)).unwrap_err();
            assert_eq!(err.source, InvalidPrice::NotFinite, "{price}");
        }
    }

    #[test]
    fn test_publish_all_valid() {
        let registry = registry();
        let publisher = MetricPublisher::new(registry.prices().clone());

        let (summary, logs) = publish_capturing(
            &publisher,
            &[
                PriceRecord::new("BTCUSDT", "65000.12"),
                PriceRecord::new("ETHUSDT", "3100.5"),
                PriceRecord::new("BNBUSDT", "580.00000000"),
            ],
        );

        assert_eq!(summary.published, 3);
        assert!(summary.skipped.is_empty());
        assert!(logs.warnings().is_empty());
        assert_eq!(value_of(&registry, "BTCUSDT"), 65000.12);
        assert_eq!(value_of(&registry, "ETHUSDT"), 3100.5);
        assert_eq!(value_of(&registry, "BNBUSDT"), 580.0);
    }

    #[test]
    fn test_publish_skips_malformed_record() {
        let registry = registry();
        let publisher = MetricPublisher::new(registry.prices().clone());

        let (summary, logs) = publish_capturing(
            &publisher,
            &[
                PriceRecord::new("BTCUSDT", "65000.12"),
                PriceRecord::new("XXXUSDT", "abc"),
                PriceRecord::new("ETHUSDT", "3100.5"),
            ],
        );

        assert_eq!(summary.published, 2);
        assert_eq!(summary.skipped.len(), 1);
        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("XXXUSDT"));
        assert_eq!(summary.skipped[0].symbol, "XXXUSDT");
        assert_eq!(value_of(&registry, "BTCUSDT"), 65000.12);
        assert_eq!(value_of(&registry, "ETHUSDT"), 3100.5);

        let output = registry.render().unwrap();
        assert!(!output.contains("XXXUSDT"));
    }

    #[test]
    fn test_publish_skips_out_of_range_prices() {
        let registry = registry();
        let publisher = MetricPublisher::new(registry.prices().clone());

        let (summary, logs) = publish_capturing(
            &publisher,
            &[
                PriceRecord::new("BIG", "1e400"),
                PriceRecord::new("INF", "inf"),
                PriceRecord::new("BTCUSDT", "65000.12"),
            ],
        );

        assert_eq!(summary.published, 1);
        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(logs.warnings().len(), 2);

        let output = registry.render().unwrap();
        assert!(!output.contains("symbol=\"BIG\""));
        assert!(!output.contains("symbol=\"INF\""));
        assert!(!output.contains(" inf"));
        assert!(output.contains("binance_crypto_price{symbol=\"BTCUSDT\"} 65000.12"));
    }

    #[test]
    fn test_publish_overwrites_previous_value() {
        let registry = registry();
        let publisher = MetricPublisher::new(registry.prices().clone());

        publisher.publish(&[PriceRecord::new("BTCUSDT", "60000")]);
        publisher.publish(&[PriceRecord::new("BTCUSDT", "61000.5")]);

        assert_eq!(value_of(&registry, "BTCUSDT"), 61000.5);
    }

    #[test]
    fn test_failed_parse_keeps_previous_value() {
        let registry = registry();
        let publisher = MetricPublisher::new(registry.prices().clone());

        publisher.publish(&[PriceRecord::new("BTCUSDT", "60000")]);
        let summary = publisher.publish(&[PriceRecord::new("BTCUSDT", "n/a")]);

        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(value_of(&registry, "BTCUSDT"), 60000.0);
    }

    #[test]
    fn test_publish_is_idempotent() {
        let registry = registry();
        let publisher = MetricPublisher::new(registry.prices().clone());
        let batch = [
            PriceRecord::new("BTCUSDT", "65000.12"),
            PriceRecord::new("ETHUSDT", "3100.5"),
        ];

        publisher.publish(&batch);
        let first = registry.render().unwrap();
        publisher.publish(&batch);
        let second = registry.render().unwrap();

        assert_eq!(first, second);
        assert_eq!(value_of(&registry, "BTCUSDT"), 65000.12);
    }

    #[test]
    fn test_publish_empty_batch() {
        let registry = registry();
        let publisher = MetricPublisher::new(registry.prices().clone());

        let summary = publisher.publish(&[]);

        assert_eq!(summary.published, 0);
        assert!(summary.skipped.is_empty());
    }
}
