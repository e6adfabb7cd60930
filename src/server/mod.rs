pub mod routes;

use crate::config::ServerConfig;
use crate::utils::error::{AlertError, Result};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub use routes::{router, BANNER};

/// A bound listener plus the route table, ready to serve.
pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AlertError::ServerError {
                message: format!("failed to bind {}: {}", addr, e),
            })?;

        Ok(Self {
            listener,
            router: router(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!("🚀 Listening on http://{}", addr);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AlertError::ServerError {
                message: e.to_string(),
            })?;

        tracing::info!("Server on {} stopped", addr);
        Ok(())
    }

    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
