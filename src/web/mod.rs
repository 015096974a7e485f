//! Web layer module
//!
//! Serves the addon protocol over HTTP. Handlers only read the committed
//! catalog through [`CatalogService`]; nothing here triggers a fetch.

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::CatalogCache;
use crate::config::WebConfig;
use crate::services::CatalogService;

pub mod handlers;
pub mod manifest;

pub use manifest::Manifest;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub cache: Arc<CatalogCache>,
    pub manifest: Arc<Manifest>,
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

        Ok(Self {
            app: Self::create_router(state),
            addr,
        })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]);

        Router::new()
            .route("/manifest.json", get(handlers::manifest))
            .route("/catalog/{type}/{id}", get(handlers::catalog))
            .route(
                "/catalog/{type}/{id}/{extra}",
                get(handlers::catalog_with_extra),
            )
            .route("/meta/{type}/{id}", get(handlers::meta))
            .route("/stream/{type}/{id}", get(handlers::stream))
            .route("/health", get(handlers::health))
            // Middleware (applied in reverse order)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Serve until the token is cancelled, then drain in-flight requests
    pub async fn serve_with_cancellation(self, cancellation_token: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("Failed to bind to {}", self.addr))?;
        info!("Web server listening on http://{}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                cancellation_token.cancelled().await;
                info!("Web server received cancellation signal, shutting down gracefully");
            })
            .await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}
