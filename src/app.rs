//! Service bootstrap: wires config, generator, history, scheduler and server.

use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::generator::{QuoteGenerator, QuoteSource};
use crate::scheduler::Scheduler;
use crate::server::{AppState, QuoteServer};
use crate::service::QuoteService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// A running service instance.
pub struct App {
    service: Arc<QuoteService>,
    scheduler: Arc<Scheduler<QuoteService>>,
    server: QuoteServer,
}

impl App {
    /// Start with the production [`QuoteGenerator`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the server cannot
    /// bind.
    pub async fn start(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        if config.generator.api_key.is_empty() {
            warn!("API_KEY is not set; generation requests will likely fail and use fallbacks");
        }
        let source = Arc::new(QuoteGenerator::new(config.generator.clone()));
        Self::start_with_source(config, source, Arc::new(SystemClock)).await
    }

    /// Start with an arbitrary quote source and clock.
    ///
    /// Installs the configured default schedule before serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind.
    pub async fn start_with_source(
        config: ServiceConfig,
        source: Arc<dyn QuoteSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let service = Arc::new(QuoteService::new(source, Arc::clone(&clock)));
        let scheduler = Arc::new(Scheduler::new(Arc::clone(&service), clock));
        scheduler
            .set(config.schedule.default)
            .await
            .map_err(|e| ServiceError::Server(format!("cannot install default schedule: {e}")))?;
        info!("scheduler started with default schedule {}", config.schedule.default);

        let state = AppState::new(
            Arc::clone(&service),
            Arc::clone(&scheduler),
            config.auth.required_key(),
        );
        let server = match QuoteServer::start(state, &config.server).await {
            Ok(server) => server,
            Err(e) => {
                scheduler.shutdown().await;
                return Err(e);
            }
        };

        Ok(Self {
            service,
            scheduler,
            server,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    pub fn service(&self) -> &Arc<QuoteService> {
        &self.service
    }

    pub fn scheduler(&self) -> &Arc<Scheduler<QuoteService>> {
        &self.scheduler
    }

    /// Stop the server, then the scheduler.
    ///
    /// The scheduler is shut down even if the server task failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the server task failed.
    pub async fn stop(self) -> Result<()> {
        let stopped = self.server.stop().await;
        self.scheduler.shutdown().await;
        stopped
    }
}

/// Run until Ctrl-C (or SIGTERM on unix), then shut down.
///
/// # Errors
///
/// Returns an error if startup fails.
pub async fn run(config: ServiceConfig) -> Result<()> {
    let app = App::start(config).await?;
    info!("quote service ready on http://{}", app.addr());
    shutdown_signal().await;
    info!("shutdown requested");
    app.stop().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
