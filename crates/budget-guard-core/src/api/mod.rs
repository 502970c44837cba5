//! HTTP push endpoint
//!
//! Pub/Sub push subscriptions deliver budget alerts here.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::alerting::MessageHandler;
use crate::error::{Error, Result};

/// HTTP API server
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(handler: Arc<MessageHandler>) -> Self {
        Self {
            state: AppState { handler },
        }
    }

    /// Start the HTTP server, stopping on Ctrl+C or SIGTERM
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = create_router(self.state);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::internal(e.to_string()))?;

        info!("HTTP server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::internal(e.to_string()))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    // Cloud Run stops instances with SIGTERM
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}
