//! Prometheus exporter for Binance ticker prices.
//!
//! Every scrape of the `/metrics` endpoint fetches the current prices of the
//! configured symbols from the Binance REST API and publishes them as the
//! `binance_crypto_price{symbol="..."}` gauge, rendered together with the
//! exporter's own counters and process metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   HTTP Server   │────>│     Scraper     │────>│  Price Fetcher  │──> Binance API
//! │   (/metrics)    │<────│ (fetch/publish) │     │   (one GET)     │
//! └─────────────────┘     └────────┬────────┘     └─────────────────┘
//!                                  v
//!                         ┌─────────────────┐
//!                         │  PriceRegistry  │
//!                         │ (gauges/render) │
//!                         └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! SYMBOLS=BTCUSDT,SOLUSDT binance-price-exporter --config config.json5
//! ```
//!
//! Without `SYMBOLS`, the exporter tracks `BTCUSDT`, `ETHUSDT` and `BNBUSDT`.
//! Gauges of symbols removed from `SYMBOLS` keep their last value until the
//! process restarts.
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod process;
pub mod publisher;
pub mod registry;
pub mod scrape;
pub mod symbols;

pub use config::ExporterConfig;
pub use error::{FetchError, PriceParseError, ScrapeError};
pub use fetcher::{PriceFetcher, PriceRecord};
pub use http::HttpServer;
pub use publisher::MetricPublisher;
pub use registry::{PriceRegistry, SharedRegistry};
pub use scrape::{Scraper, SharedScraper};
pub use symbols::SymbolResolver;
