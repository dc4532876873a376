//! HTTP surface for the quote service.
//!
//! ## Endpoints
//!
//! - `GET /health`: liveness (never requires the API key)
//! - `GET /quotes`: stored quotes, oldest first
//! - `GET /latest`: newest quote, generated on demand when none exist
//! - `POST /generate-now`, `POST /quotes/generate`: generate and store now
//! - `POST /schedule/{hour}/{minute}`, `POST /schedule` (`{"time":"HH:MM"}`):
//!   replace the daily schedule
//! - `GET /current-schedule`, `GET /schedule`: report the daily schedule
//!
//! When an API key is configured every route except `/health` requires a
//! matching `X-API-Key` header.

pub mod auth;
pub mod handlers;

use crate::config::ServerConfig;
use crate::error::{Result, ServiceError};
use crate::scheduler::Scheduler;
use crate::service::QuoteService;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Quote history and generation.
    pub service: Arc<QuoteService>,
    /// Daily schedule owner.
    pub scheduler: Arc<Scheduler<QuoteService>>,
    /// Expected `X-API-Key` value, when enforcement is on.
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        service: Arc<QuoteService>,
        scheduler: Arc<Scheduler<QuoteService>>,
        api_key: Option<&str>,
    ) -> Self {
        Self {
            service,
            scheduler,
            api_key: api_key.map(Arc::from),
        }
    }
}

/// Build the router with auth, logging and CORS layers applied.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/quotes", get(handlers::list_quotes))
        .route("/latest", get(handlers::latest_quote))
        .route("/generate-now", post(handlers::generate_now))
        .route("/quotes/generate", post(handlers::generate_now))
        .route("/schedule/{hour}/{minute}", post(handlers::set_schedule_path))
        .route(
            "/schedule",
            post(handlers::set_schedule_body).get(handlers::current_schedule),
        )
        .route("/current-schedule", get(handlers::current_schedule))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(auth::log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// QuoteServer
// ---------------------------------------------------------------------------

/// Running HTTP server.
pub struct QuoteServer {
    /// The address the server is listening on.
    addr: SocketAddr,
    /// Handle to the background server task.
    handle: JoinHandle<()>,
    /// Triggers graceful shutdown.
    shutdown: CancellationToken,
}

impl QuoteServer {
    /// Start the HTTP server.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign)
    /// and begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(state: AppState, config: &ServerConfig) -> Result<Self> {
        let app = router(state);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServiceError::Server(format!("bind {bind_addr} failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServiceError::Server(format!("failed to get local addr: {e}")))?;

        info!("quote server listening on http://{addr}");

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await });
            if let Err(e) = serve.await {
                error!("quote server error: {e}");
            }
        });

        Ok(Self {
            addr,
            handle,
            shutdown,
        })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Stop accepting connections and wait for open requests to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the server task panicked.
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        self.handle
            .await
            .map_err(|e| ServiceError::Server(format!("server task failed: {e}")))?;
        info!("quote server stopped");
        Ok(())
    }
}
