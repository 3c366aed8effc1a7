//! Scripted in-memory database used by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ntunnel::engine::{ConnectParams, Connector, ExecOutput, QueryOutput, Session};
use ntunnel::protocol::frames::ColumnInfo;
use ntunnel::protocol::Value;
use ntunnel::{TunnelError, TunnelResult};

/// Scripted answer to one SQL text.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows {
        columns: Vec<ColumnInfo>,
        /// `Err` entries simulate rows that fail to decode.
        rows: Vec<Result<Vec<Value>, String>>,
    },
    Affected(ExecOutput),
    Fail(String),
}

/// What the fake saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String, u16, String),
    Ping,
    Version,
    Query(String),
    Execute(String),
    Close,
}

#[derive(Debug, Default)]
struct Script {
    open_error: Option<String>,
    ping_error: Option<String>,
    version: Option<String>,
    replies: HashMap<String, Reply>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    script: Arc<Script>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeConnector {
    pub fn builder() -> FakeBuilder {
        FakeBuilder::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// SQL texts that reached the session, with the method used.
    pub fn statements(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Query(_) | Call::Execute(_)))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct FakeBuilder {
    script: Script,
}

impl FakeBuilder {
    pub fn unreachable(mut self, message: &str) -> Self {
        self.script.open_error = Some(message.to_string());
        self
    }

    pub fn ping_fails(mut self, message: &str) -> Self {
        self.script.ping_error = Some(message.to_string());
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.script.version = Some(version.to_string());
        self
    }

    pub fn reply(mut self, sql: &str, reply: Reply) -> Self {
        self.script.replies.insert(sql.to_string(), reply);
        self
    }

    pub fn rows(self, sql: &str, columns: Vec<ColumnInfo>, rows: Vec<Vec<Value>>) -> Self {
        let rows = rows.into_iter().map(Ok).collect();
        self.reply(sql, Reply::Rows { columns, rows })
    }

    pub fn affected(self, sql: &str, rows_affected: Option<u64>, last_insert_id: Option<u64>) -> Self {
        self.reply(
            sql,
            Reply::Affected(ExecOutput {
                rows_affected,
                last_insert_id,
            }),
        )
    }

    pub fn fails(self, sql: &str, message: &str) -> Self {
        self.reply(sql, Reply::Fail(message.to_string()))
    }

    pub fn build(self) -> FakeConnector {
        FakeConnector {
            script: Arc::new(self.script),
            calls: Arc::default(),
        }
    }
}

pub struct FakeSession {
    host: String,
    script: Arc<Script>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeSession {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, sql: &str) -> Reply {
        self.script
            .replies
            .get(sql)
            .cloned()
            .unwrap_or_else(|| Reply::Fail(format!("Unknown statement '{}'", sql)))
    }
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn open(&self, params: &ConnectParams) -> TunnelResult<FakeSession> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Open(params.host.clone(), params.port, params.user.clone()));
        if let Some(message) = &self.script.open_error {
            return Err(TunnelError::Connection(message.clone()));
        }
        Ok(FakeSession {
            host: params.host.clone(),
            script: Arc::clone(&self.script),
            calls: Arc::clone(&self.calls),
        })
    }
}

impl Session for FakeSession {
    async fn ping(&mut self) -> TunnelResult<()> {
        self.record(Call::Ping);
        match &self.script.ping_error {
            Some(message) => Err(TunnelError::Connection(message.clone())),
            None => Ok(()),
        }
    }

    fn host_info(&self) -> String {
        format!("{} via TCP/IP", self.host)
    }

    async fn server_version(&mut self) -> TunnelResult<String> {
        self.record(Call::Version);
        self.script
            .version
            .clone()
            .ok_or_else(|| TunnelError::Query("VERSION() unavailable".to_string()))
    }

    async fn query(&mut self, sql: &str) -> TunnelResult<QueryOutput> {
        self.record(Call::Query(sql.to_string()));
        match self.lookup(sql) {
            Reply::Rows { columns, rows } => Ok(QueryOutput {
                columns,
                rows: rows
                    .into_iter()
                    .map(|r| r.map_err(TunnelError::Scan))
                    .collect(),
            }),
            Reply::Affected(_) => Ok(QueryOutput::default()),
            Reply::Fail(message) => Err(TunnelError::Query(message)),
        }
    }

    async fn execute(&mut self, sql: &str) -> TunnelResult<ExecOutput> {
        self.record(Call::Execute(sql.to_string()));
        match self.lookup(sql) {
            Reply::Affected(output) => Ok(output),
            Reply::Rows { .. } => Ok(ExecOutput::default()),
            Reply::Fail(message) => Err(TunnelError::Query(message)),
        }
    }

    async fn close(self) -> TunnelResult<()> {
        self.record(Call::Close);
        Ok(())
    }
}

/// The first value column of `SELECT 1`.
pub fn select_one() -> (Vec<ColumnInfo>, Vec<Vec<Value>>) {
    (
        vec![ColumnInfo::new("1").type_name("BIGINT").not_null(true)],
        vec![vec![Value::Int(1)]],
    )
}

pub fn params(host: &str) -> ConnectParams {
    ConnectParams {
        host: host.to_string(),
        port: 3306,
        user: "root".to_string(),
        password: "secret".to_string(),
        database: "test".to_string(),
    }
}
