//! Query executor.
//!
//! Drives one request against the database collaborator and frames the
//! outcome:
//!
//! ```text
//! Idle → Connecting ─┬─ ConnectFailed → ErrorFrame(2000)
//!                    └─ Connected → (Classifying → Reading | Writing → Framing)* → Done
//! ```
//!
//! Only a connect failure aborts the request. A failing statement is framed
//! with errno 1000 and the batch moves on.

use bytes::{Bytes, BytesMut};

use crate::engine::{ConnectParams, Connector, Session};
use crate::error::TunnelError;
use crate::protocol::{errno, frames, StatementOutcome, PROTO_INFO};

/// Reported when `SELECT VERSION()` fails during a connection test.
const UNKNOWN_VERSION: &str = "Unknown";

/// Whether a statement is run as a result-set read or as a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

impl StatementKind {
    /// A statement is a read when its trimmed text starts with one of
    /// `read_keywords` as a whole token, ignoring case.
    pub fn classify<S: AsRef<str>>(sql: &str, read_keywords: &[S]) -> Self {
        let sql = sql.trim_start();
        let is_read = read_keywords.iter().any(|keyword| {
            let keyword = keyword.as_ref();
            let Some(prefix) = sql.get(..keyword.len()) else {
                return false;
            };
            let at_boundary = sql[keyword.len()..]
                .chars()
                .next()
                .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
            prefix.eq_ignore_ascii_case(keyword) && at_boundary
        });

        if is_read {
            StatementKind::Read
        } else {
            StatementKind::Write
        }
    }
}

/// Runs connection tests and statement batches for the action router.
#[derive(Debug, Clone)]
pub struct QueryExecutor<C> {
    connector: C,
    read_keywords: Vec<String>,
}

impl<C: Connector> QueryExecutor<C> {
    pub fn new(connector: C, read_keywords: Vec<String>) -> Self {
        Self {
            connector,
            read_keywords,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open, ping and describe the server.
    ///
    /// Success yields the header followed by the connection-info frame.
    pub async fn test_connection(&self, params: &ConnectParams) -> Bytes {
        let mut session = match self.connect(params).await {
            Ok(session) => session,
            Err(e) => return connect_failure(&e),
        };

        let version = match session.server_version().await {
            Ok(version) => version,
            Err(e) => {
                tracing::debug!("server version unavailable: {}", e);
                UNKNOWN_VERSION.to_string()
            }
        };

        let mut buf = BytesMut::new();
        frames::header(&mut buf, errno::OK);
        frames::conn_info(&mut buf, &session.host_info(), PROTO_INFO, &version);

        release(session).await;
        buf.freeze()
    }

    /// Execute a statement batch on one connection.
    ///
    /// Blank statements are skipped; the separator after the last executed
    /// statement is `0x00`, every other one is `0x01`.
    pub async fn execute_batch(&self, params: &ConnectParams, statements: &[String]) -> Bytes {
        let mut session = match self.connect(params).await {
            Ok(session) => session,
            Err(e) => return connect_failure(&e),
        };

        let statements: Vec<&str> = statements
            .iter()
            .map(|sql| sql.trim())
            .filter(|sql| !sql.is_empty())
            .collect();

        let mut buf = BytesMut::new();
        frames::header(&mut buf, errno::OK);

        for (i, sql) in statements.iter().enumerate() {
            let outcome = self.run_statement(&mut session, sql).await;
            frames::statement(&mut buf, &outcome);
            frames::separator(&mut buf, i + 1 < statements.len());
        }

        release(session).await;
        buf.freeze()
    }

    async fn connect(&self, params: &ConnectParams) -> Result<C::Session, TunnelError> {
        tracing::debug!("connecting to {}:{} as {}", params.host, params.port, params.user);
        let mut session = self.connector.open(params).await?;
        if let Err(e) = session.ping().await {
            release(session).await;
            return Err(e);
        }
        Ok(session)
    }

    async fn run_statement(&self, session: &mut C::Session, sql: &str) -> StatementOutcome {
        let kind = StatementKind::classify(sql, &self.read_keywords);
        tracing::debug!("running {:?} statement ({} bytes)", kind, sql.len());

        match kind {
            StatementKind::Read => match session.query(sql).await {
                Ok(output) => {
                    let mut rows = Vec::with_capacity(output.rows.len());
                    for (index, row) in output.rows.into_iter().enumerate() {
                        match row {
                            Ok(values) => rows.push(values),
                            Err(e) => tracing::warn!("dropping row {}: {}", index, e),
                        }
                    }
                    StatementOutcome::ResultSet {
                        columns: output.columns,
                        rows,
                    }
                }
                Err(e) => failed(e),
            },
            StatementKind::Write => match session.execute(sql).await {
                Ok(output) => StatementOutcome::Affected {
                    rows_affected: output.rows_affected.unwrap_or(0),
                    last_insert_id: output.last_insert_id.unwrap_or(0),
                },
                Err(e) => failed(e),
            },
        }
    }
}

fn failed(e: TunnelError) -> StatementOutcome {
    tracing::debug!("statement failed: {}", e);
    StatementOutcome::Failed {
        message: e.frame_message(),
    }
}

fn connect_failure(e: &TunnelError) -> Bytes {
    tracing::info!("connect failed: {}", e);
    let mut buf = BytesMut::new();
    frames::error_frame(&mut buf, errno::CONNECT, &e.frame_message());
    buf.freeze()
}

async fn release<S: Session>(session: S) {
    if let Err(e) = session.close().await {
        tracing::warn!("failed to close session: {}", e);
    }
}
