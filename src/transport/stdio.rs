//! Stdio transport for the MCP server.
//!
//! Standard input/output is the default mode: the client spawns the gateway
//! and speaks JSON-RPC over its pipes.

use crate::db::PoolRegistry;
use crate::error::{DbError, DbResult};
use crate::mcp::GatewayService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::{info, warn};

/// Serves one MCP session over stdin/stdout.
pub struct StdioTransport {
    service: GatewayService,
    registry: Arc<PoolRegistry>,
}

impl StdioTransport {
    /// `registry` is closed once the session ends.
    pub fn new(service: GatewayService, registry: Arc<PoolRegistry>) -> Self {
        Self { service, registry }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        let running_service = self
            .service
            .clone()
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(quit_reason) => {
                        info!(reason = ?quit_reason, "Stdio transport completed");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        self.registry.close_all().await;
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        info!("Closing all database connections");
        self.registry.close_all().await;

        if shutdown_requested {
            // A pending blocking stdin read would otherwise keep the runtime alive.
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
