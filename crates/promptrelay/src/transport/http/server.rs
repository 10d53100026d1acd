//! HTTP server implementation.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::service::ChatService;

use super::routes::routes;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Start the HTTP server with provided service.
///
/// Returns once a shutdown signal has been received and in-flight requests
/// have drained.
pub async fn serve(config: ServerConfig, service: Arc<ChatService>) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    serve_on(listener, service, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub(crate) async fn serve_on<F>(
    listener: TcpListener,
    service: Arc<ChatService>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = routes(Arc::clone(&service));
    let actual_addr = listener.local_addr()?;

    info!("Server is running on http://{}", actual_addr);

    let draining = Arc::clone(&service);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            // Refuse anything still queued for a worker slot while connections drain.
            draining.begin_shutdown();
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is an unrecoverable
/// configuration error that should fail fast at startup.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler - is tokio runtime configured correctly?");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler - is tokio runtime configured correctly?")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permit::PermitPool;
    use crate::service::tests::MockHandler;

    #[test]
    fn server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
    }

    #[tokio::test]
    async fn graceful_shutdown_closes_admission() {
        let service = Arc::new(ChatService::new(
            Arc::new(MockHandler::echo()),
            PermitPool::new(1),
        ));
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve_on(listener, Arc::clone(&service), async move {
            let _ = rx.await;
        }));

        assert!(!service.is_shutting_down());
        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert!(service.is_shutting_down());
    }
}
