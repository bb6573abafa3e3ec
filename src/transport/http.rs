//! Streamable HTTP transport for the MCP server.
//!
//! Each HTTP session gets its own clone of the gateway service; all of them
//! share the same pool.

use crate::db::PoolRegistry;
use crate::error::{DbError, DbResult};
use crate::mcp::GatewayService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// How long open streams may keep the server alive after a shutdown signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    service: GatewayService,
    registry: Arc<PoolRegistry>,
    host: String,
    port: u16,
    /// MCP endpoint path, e.g. `/mcp`
    endpoint: String,
}

impl HttpTransport {
    pub fn new(
        service: GatewayService,
        registry: Arc<PoolRegistry>,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            service,
            registry,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Resolves once shutdown has begun and then either the grace period ran out
/// or a second signal arrived.
async fn force_after_shutdown(shutdown: &Notify) {
    shutdown.notified().await;
    info!(
        timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
        "Draining open sessions (send signal again to force exit)"
    );

    tokio::select! {
        _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => warn!("Graceful shutdown timed out"),
        _ = wait_for_signal() => warn!("Second signal received, stopping now"),
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();

        let prototype = self.service.clone();
        let service = StreamableHttpService::new(
            move || Ok(prototype.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service rejects "/", so the root endpoint uses a fallback.
        let app = if self.endpoint == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.endpoint, service)
        };

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            DbError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available or choose another with --http-port",
            )
        })?;
        info!(addr = %bind_addr, endpoint = %self.endpoint, "MCP endpoint ready");

        let shutdown_notify = Arc::new(Notify::new());
        let notify = Arc::clone(&shutdown_notify);
        let shutdown_signal = async move {
            wait_for_signal().await;
            notify.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        self.registry.close_all().await;
                        return Err(DbError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = force_after_shutdown(&shutdown_notify) => {}
        }

        info!("Closing database connections");
        self.registry.close_all().await;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionString;

    async fn transport(host: &str, port: u16, endpoint: &str) -> HttpTransport {
        let registry = Arc::new(PoolRegistry::default());
        let conn = ConnectionString::parse("sqlite::memory:").unwrap();
        let pool = registry.get_pool(&conn).await.unwrap();
        let service = GatewayService::new(pool, conn.resource_base().unwrap());
        HttpTransport::new(service, registry, host, port, endpoint)
    }

    #[tokio::test]
    async fn test_http_transport_creation() {
        let transport = transport("127.0.0.1", 8080, "/mcp").await;
        assert_eq!(transport.name(), "http");
        assert_eq!(transport.bind_addr(), "127.0.0.1:8080");
        assert_eq!(transport.endpoint(), "/mcp");
    }

    #[tokio::test]
    async fn test_http_transport_root_endpoint() {
        let transport = transport("0.0.0.0", 3000, "/").await;
        assert_eq!(transport.bind_addr(), "0.0.0.0:3000");
        assert_eq!(transport.endpoint(), "/");
    }

    #[tokio::test]
    async fn test_bind_failure_is_connection_error() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let transport = transport("127.0.0.1", port, "/mcp").await;
        let err = transport.run().await.unwrap_err();
        assert!(matches!(err, DbError::Connection { .. }));
    }
}
