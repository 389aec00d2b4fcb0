//! HTTP server for the Prometheus metrics endpoint.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::ScrapeError;
use crate::registry;
use crate::scrape::SharedScraper;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    scraper: SharedScraper,
}

/// Create the HTTP router.
fn create_router(scraper: SharedScraper, metrics_path: &str) -> Router {
    let state = AppState { scraper };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handler for the metrics endpoint. Every request triggers a scrape.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.scraper.scrape().await {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, registry::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            if matches!(e, ScrapeError::Render(_)) {
                error!(error = %e, "Failed to render metrics");
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("{}\n", e),
            )
                .into_response()
        }
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    scraper: SharedScraper,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(scraper: SharedScraper, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            scraper,
            listen_addr,
            metrics_path,
        }
    }

    /// Bind the listener and serve until the shutdown signal is received.
    ///
    /// A bind failure is returned immediately.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let router = create_router(self.scraper, &self.metrics_path);
        let addr = listener.local_addr().unwrap_or(self.listen_addr);

        info!(
            addr = %addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
