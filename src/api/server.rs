//! API Server
//!
//! Router assembly, middleware stack, and graceful shutdown.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::config::{ServerConfig, TaixiuConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taixiu={level},tower_http={level}")));

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Create the application with its middleware stack
pub fn build_app(state: Arc<AppState>, config: &ServerConfig) -> axum::Router {
    create_router(state)
        // Request ID middleware (first for tracing)
        .layer(axum::middleware::from_fn(request_id_middleware))
        // CORS layer (before timeout to handle preflight)
        .layer(create_cors_layer(config.allowed_origins.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

/// HTTP front end of the settlement service
pub struct ApiServer {
    config: TaixiuConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: TaixiuConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Bind and serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.socket_addr()?;
        let app = build_app(self.state.clone(), &self.config.server);

        self.log_server_info(&addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.server.host.parse::<std::net::IpAddr>()?,
            self.config.server.port,
        )))
    }

    fn log_server_info(&self, addr: &SocketAddr) {
        info!("Server configuration:");
        info!("   Listen: {}", addr);
        info!("   Version: {}", self.state.version);
        info!("   CORS: {:?}", self.config.server.allowed_origins);
        info!("   Request timeout: {}s", self.config.server.request_timeout_secs);
        info!("   Starting balance: {}", self.config.game.start_balance);
        info!("   Metrics enabled: {}", self.config.monitoring.enable_metrics);
        info!(
            "   Admin top-up: {}",
            if self.state.admin_token.is_some() { "enabled" } else { "disabled" }
        );
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
