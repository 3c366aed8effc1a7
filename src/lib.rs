//! # ntunnel: HTTP tunnel for MySQL
//!
//! Accepts form-encoded HTTP requests carrying connection parameters and SQL,
//! runs the SQL on MySQL and answers in the desktop client's binary block
//! protocol.
//!
//! ## Architecture
//!
//! ```text
//! HTTP form → ActionRouter → QueryExecutor → Session (sqlx MySQL)
//!                                   ↓
//!                     protocol::frames → one response body
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ntunnel::TunnelServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = TunnelServer::builder()
//!         .bind("0.0.0.0:8000")
//!         .build();
//!
//!     server.serve().await?;
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod handler;
pub mod page;
pub mod protocol;
pub mod router;
pub mod server;

pub use action::{Action, ActionRouter, TunnelReply, TunnelRequest};
pub use config::TunnelConfig;
pub use error::{TunnelError, TunnelResult};
pub use server::TunnelServer;

pub mod prelude {
    pub use crate::action::{Action, ActionRouter, TunnelReply, TunnelRequest};
    pub use crate::config::TunnelConfig;
    pub use crate::engine::{ConnectParams, Connector, ExecOutput, MySqlConnector, QueryOutput, Session};
    pub use crate::error::*;
    pub use crate::executor::{QueryExecutor, StatementKind};
    pub use crate::protocol::{FieldType, StatementOutcome, Value};
    pub use crate::server::TunnelServer;
}
