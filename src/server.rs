//! Tunnel server implementation
//!
//! Main entry point for running ntunnel over HTTP.

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::action::ActionRouter;
use crate::config::TunnelConfig;
use crate::engine::{Connector, MySqlConnector};
use crate::error::{TunnelError, TunnelResult};
use crate::handler::TunnelState;
use crate::router::create_router;

/// The ntunnel HTTP server
pub struct TunnelServer<C = MySqlConnector> {
    config: TunnelConfig,
    state: Arc<TunnelState<C>>,
}

impl TunnelServer<MySqlConnector> {
    /// Create a server backed by MySQL
    pub fn new(config: TunnelConfig) -> Self {
        Self::with_connector(config, MySqlConnector)
    }

    /// Create a server builder
    pub fn builder() -> TunnelServerBuilder {
        TunnelServerBuilder::default()
    }
}

impl<C: Connector> TunnelServer<C> {
    /// Create a server with a custom database connector
    pub fn with_connector(config: TunnelConfig, connector: C) -> Self {
        let router = ActionRouter::new(config.clone(), connector);
        Self {
            config,
            state: Arc::new(TunnelState::new(router)),
        }
    }

    pub fn config(&self) -> &TunnelConfig {
        &self.config
    }

    /// The axum router, for embedding or testing without a listener
    pub fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
    }

    /// Start serving requests
    ///
    /// # Errors
    /// Returns error if the listener cannot bind or the server fails
    pub async fn serve(&self) -> TunnelResult<()> {
        let addr = &self.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TunnelError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

        self.serve_on(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve_on(&self, listener: TcpListener) -> TunnelResult<()> {
        let addr = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| self.config.bind_address.clone());
        tracing::info!("ntunnel listening on {}", addr);
        tracing::info!("   POST /   - Tunnel requests (actn=C|Q)");
        if self.config.allow_test_menu {
            tracing::info!("   GET  /   - Diagnostic page");
        }
        tracing::debug!("read keywords: {}", self.config.read_keywords.join(", "));

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Builder for the TunnelServer
#[derive(Debug, Default)]
pub struct TunnelServerBuilder {
    config: TunnelConfig,
}

impl TunnelServerBuilder {
    /// Start from a loaded configuration
    pub fn config(mut self, config: TunnelConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the bind address
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_address = addr.into();
        self
    }

    /// Enable or disable the diagnostic page
    pub fn test_menu(mut self, enabled: bool) -> Self {
        self.config.allow_test_menu = enabled;
        self
    }

    /// Set the request body limit
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config.max_body_bytes = limit;
        self
    }

    /// Build a MySQL-backed server
    pub fn build(self) -> TunnelServer {
        TunnelServer::new(self.config)
    }

    /// Build a server with a custom connector
    pub fn build_with<C: Connector>(self, connector: C) -> TunnelServer<C> {
        TunnelServer::with_connector(self.config, connector)
    }
}
