//! Database collaborator for ntunnel.
//!
//! The executor only sees the [`Connector`] and [`Session`] traits. The
//! shipped implementation talks to MySQL through sqlx; tests plug in a
//! scripted one.

use std::future::Future;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, TypeInfo, ValueRef};

use crate::error::{TunnelError, TunnelResult};
use crate::protocol::frames::ColumnInfo;
use crate::protocol::Value;

/// Connection parameters taken from one request.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Default schema; empty means none.
    pub database: String,
}

impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

/// A scanned row, or the reason it could not be decoded.
pub type ScannedRow = TunnelResult<Vec<Value>>;

/// Columns and rows of a completed read.
#[derive(Debug, Default)]
pub struct QueryOutput {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<ScannedRow>,
}

/// Counters of a completed write. Drivers may not report either.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub rows_affected: Option<u64>,
    pub last_insert_id: Option<u64>,
}

/// Opens database sessions.
pub trait Connector: Send + Sync + 'static {
    type Session: Session;

    fn open(&self, params: &ConnectParams) -> impl Future<Output = TunnelResult<Self::Session>> + Send;
}

/// One open database connection, owned by a single request.
pub trait Session: Send {
    /// Liveness check right after connecting.
    fn ping(&mut self) -> impl Future<Output = TunnelResult<()>> + Send;

    /// Human-readable transport description, e.g. `localhost via TCP/IP`.
    fn host_info(&self) -> String;

    fn server_version(&mut self) -> impl Future<Output = TunnelResult<String>> + Send;

    /// Run a statement that returns rows.
    fn query(&mut self, sql: &str) -> impl Future<Output = TunnelResult<QueryOutput>> + Send;

    /// Run a statement that does not return rows.
    fn execute(&mut self, sql: &str) -> impl Future<Output = TunnelResult<ExecOutput>> + Send;

    fn close(self) -> impl Future<Output = TunnelResult<()>> + Send;
}

/// Driver options for one request.
///
/// The session keeps the server's own `sql_mode` and `time_zone`: sqlx would
/// otherwise turn on `PIPES_AS_CONCAT` and `NO_ENGINE_SUBSTITUTION` and pin
/// the zone to UTC.
pub fn connect_options(params: &ConnectParams) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&params.host)
        .port(params.port)
        .username(&params.user)
        .password(&params.password)
        .charset("utf8mb4")
        .pipes_as_concat(false)
        .no_engine_subsitution(false)
        .timezone(None::<String>);
    if params.database.is_empty() {
        options
    } else {
        options.database(&params.database)
    }
}

/// sqlx-backed MySQL connector. Every `open` makes a fresh connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl Connector for MySqlConnector {
    type Session = MySqlSession;

    async fn open(&self, params: &ConnectParams) -> TunnelResult<MySqlSession> {
        let conn = connect_options(params)
            .connect()
            .await
            .map_err(|e| TunnelError::Connection(e.to_string()))?;

        Ok(MySqlSession {
            conn,
            host: params.host.clone(),
        })
    }
}

pub struct MySqlSession {
    conn: MySqlConnection,
    host: String,
}

impl Session for MySqlSession {
    async fn ping(&mut self) -> TunnelResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| TunnelError::Connection(e.to_string()))
    }

    fn host_info(&self) -> String {
        format!("{} via TCP/IP", self.host)
    }

    async fn server_version(&mut self) -> TunnelResult<String> {
        sqlx::query_scalar::<_, String>("SELECT VERSION()")
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| TunnelError::Query(e.to_string()))
    }

    async fn query(&mut self, sql: &str) -> TunnelResult<QueryOutput> {
        // Describe prepares the statement to learn column metadata, including
        // for empty results. Some statements cannot be prepared; their
        // metadata then comes from the rows themselves.
        let described = match (&mut self.conn).describe(sql).await {
            Ok(describe) => Some(
                describe
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        let mut info = ColumnInfo::new(col.name()).type_name(col.type_info().name());
                        info.not_null = describe.nullable(i).map(|nullable| !nullable);
                        info
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(e) => {
                tracing::debug!("describe failed, using row metadata: {}", e);
                None
            }
        };

        // A plain &str runs over the text protocol, so every value arrives as text.
        let rows: Vec<MySqlRow> = (&mut self.conn)
            .fetch_all(sql)
            .await
            .map_err(|e| TunnelError::Query(e.to_string()))?;

        let columns = described.unwrap_or_else(|| {
            rows.first()
                .map(|row| {
                    row.columns()
                        .iter()
                        .map(|col| ColumnInfo::new(col.name()).type_name(col.type_info().name()))
                        .collect()
                })
                .unwrap_or_default()
        });

        let rows = rows.iter().map(scan_row).collect();
        Ok(QueryOutput { columns, rows })
    }

    async fn execute(&mut self, sql: &str) -> TunnelResult<ExecOutput> {
        let result = (&mut self.conn)
            .execute(sql)
            .await
            .map_err(|e| TunnelError::Query(e.to_string()))?;

        Ok(ExecOutput {
            rows_affected: Some(result.rows_affected()),
            last_insert_id: Some(result.last_insert_id()),
        })
    }

    async fn close(self) -> TunnelResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| TunnelError::Connection(e.to_string()))
    }
}

/// Decode every column of a row into a [`Value`].
fn scan_row(row: &MySqlRow) -> ScannedRow {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| scan_value(row, i, col.type_info().name()))
        .collect()
}

fn scan_value(row: &MySqlRow, i: usize, type_name: &str) -> TunnelResult<Value> {
    let raw = row.try_get_raw(i).map_err(scan_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let text = row.try_get_unchecked::<Vec<u8>, _>(i).map_err(scan_error)?;
    Ok(value_from_text(type_name, text))
}

/// Typed value for one text-protocol cell.
///
/// Numbers keep the server's spelling (ZEROFILL, `TINYINT(1)` reported as
/// `BOOLEAN`, float notation). Only temporal columns are parsed; values
/// chrono cannot hold, such as zero dates, stay as text.
pub fn value_from_text(type_name: &str, text: Vec<u8>) -> Value {
    let temporal = match std::str::from_utf8(&text) {
        Ok(s) => match type_name.to_ascii_uppercase().as_str() {
            "DATETIME" | "TIMESTAMP" => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(Value::Timestamp),
            "DATE" => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Value::Date),
            _ => None,
        },
        Err(_) => None,
    };

    temporal.unwrap_or_else(|| match String::from_utf8(text) {
        Ok(s) => Value::Text(s),
        Err(e) => Value::Bytes(e.into_bytes()),
    })
}

fn scan_error(e: sqlx::Error) -> TunnelError {
    TunnelError::Scan(e.to_string())
}
