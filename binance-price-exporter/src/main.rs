//! Prometheus exporter for Binance ticker prices.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use binance_price_exporter::config::LogFormat;
use binance_price_exporter::{ExporterConfig, HttpServer, PriceRegistry, Scraper};

/// Prometheus exporter for Binance ticker prices.
#[derive(Parser, Debug)]
#[command(name = "binance-price-exporter")]
#[command(about = "Export Binance ticker prices as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error). Overrides config.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    if let Some(listen) = args.listen {
        config.prometheus.listen = listen;
        config.validate()?;
    }

    // Initialize logging
    let level_name = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let log_level = level_name.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("binance_price_exporter={}", log_level).parse()?)
        .add_directive(format!("tower_http={}", log_level).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Starting Binance price exporter");

    let listen_addr: SocketAddr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let registry = Arc::new(PriceRegistry::new(&config.prometheus));
    let scraper = Arc::new(Scraper::new(&config, registry)?);

    info!(
        base_url = %config.upstream.base_url,
        symbols_env = %config.upstream.symbols_env,
        cache_ttl_secs = config.cache.ttl_secs,
        "Scraper ready"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(scraper, listen_addr, config.prometheus.path.clone());
    let mut http_task = tokio::spawn(async move { http_server.run(shutdown_rx).await });

    // Serve until a signal arrives or the server exits on its own (bind failure)
    tokio::select! {
        result = &mut http_task => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!("HTTP server error: {}", e);
                    Err(e)
                }
                Err(e) => Err(anyhow::anyhow!("HTTP server task failed: {}", e)),
            };
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate_signal() => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    shutdown_tx.send(true)?;

    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    info!("Exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn terminate_signal() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}
