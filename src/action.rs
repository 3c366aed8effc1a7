//! Action router.
//!
//! Validates the inbound form and dispatches to the connection test or the
//! query executor. Everything that goes wrong before the database is
//! touched ends here as an error frame with errno 202, or as the diagnostic
//! page when the test menu is enabled.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::{Bytes, BytesMut};

use crate::config::TunnelConfig;
use crate::engine::{ConnectParams, Connector};
use crate::error::TunnelError;
use crate::executor::QueryExecutor;
use crate::page::{render_diagnostic_page, SystemFacts};
use crate::protocol::frames;

/// Fields that must be present for any action to run.
const REQUIRED_FIELDS: [&str; 4] = ["actn", "host", "port", "login"];

/// Decoded form fields of one request, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TunnelRequest {
    fields: Vec<(String, String)>,
}

impl TunnelRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` body or query string.
    pub fn from_form(input: &[u8]) -> Self {
        Self {
            fields: url::form_urlencoded::parse(input).into_owned().collect(),
        }
    }

    /// Add a field (builder style).
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All statements, accepting both `q` and `q[]` spellings.
    pub fn statements(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(k, _)| k == "q" || k == "q[]")
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Action code sent in `actn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ConnectionTest,
    Query,
}

impl Action {
    pub fn from_code(code: &str) -> Result<Self, TunnelError> {
        match code {
            "C" => Ok(Action::ConnectionTest),
            "Q" => Ok(Action::Query),
            other => Err(TunnelError::InvalidAction(other.to_string())),
        }
    }
}

/// What the transport should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelReply {
    /// Binary tunnel frames.
    Frames(Bytes),
    /// The HTML diagnostic page.
    Page(String),
}

impl TunnelReply {
    fn error(e: &TunnelError) -> Self {
        let mut buf = BytesMut::new();
        frames::error_frame(&mut buf, e.errno(), &e.frame_message());
        TunnelReply::Frames(buf.freeze())
    }
}

/// Dispatches requests. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct ActionRouter<C> {
    config: TunnelConfig,
    executor: QueryExecutor<C>,
}

impl<C: Connector> ActionRouter<C> {
    pub fn new(config: TunnelConfig, connector: C) -> Self {
        let executor = QueryExecutor::new(connector, config.read_keywords.clone());
        Self { config, executor }
    }

    pub fn config(&self) -> &TunnelConfig {
        &self.config
    }

    pub async fn dispatch(&self, request: &TunnelRequest) -> TunnelReply {
        if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !request.has(f)) {
            tracing::debug!("missing parameter '{}'", missing);
            return self.fallback(TunnelError::InvalidParameters(missing.to_string()));
        }

        let action = match Action::from_code(request.get("actn").unwrap_or_default()) {
            Ok(action) => action,
            Err(e) => {
                tracing::info!("rejected {}", e);
                return TunnelReply::error(&e);
            }
        };

        let params = match self.connect_params(request) {
            Ok(params) => params,
            Err(e) => return TunnelReply::error(&e),
        };

        match action {
            Action::ConnectionTest => {
                tracing::info!("connection test for {}@{}:{}", params.user, params.host, params.port);
                TunnelReply::Frames(self.executor.test_connection(&params).await)
            }
            Action::Query => {
                let statements = decode_statements(request);
                tracing::info!(
                    "executing {} statement(s) for {}@{}:{}",
                    statements.len(),
                    params.user,
                    params.host,
                    params.port
                );
                TunnelReply::Frames(self.executor.execute_batch(&params, &statements).await)
            }
        }
    }

    fn fallback(&self, e: TunnelError) -> TunnelReply {
        if self.config.allow_test_menu {
            TunnelReply::Page(render_diagnostic_page(&SystemFacts::current()))
        } else {
            TunnelReply::error(&e)
        }
    }

    /// Build connection parameters; empty `host`/`port` take the configured defaults.
    pub fn connect_params(&self, request: &TunnelRequest) -> Result<ConnectParams, TunnelError> {
        let host = match request.get("host") {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => self.config.default_host.clone(),
        };
        let port = match request.get("port") {
            Some(p) if !p.is_empty() => p
                .trim()
                .parse::<u16>()
                .map_err(|_| TunnelError::InvalidParameters(format!("port '{}'", p)))?,
            _ => self.config.default_port,
        };

        Ok(ConnectParams {
            host,
            port,
            user: request.get("login").unwrap_or_default().to_string(),
            password: request.get("password").unwrap_or_default().to_string(),
            database: request.get("db").unwrap_or_default().to_string(),
        })
    }
}

/// Statements in order, base64-decoded when `encodeBase64=1`.
///
/// A value that is not valid base64 (or not UTF-8 once decoded) is kept as sent.
pub fn decode_statements(request: &TunnelRequest) -> Vec<String> {
    let statements = request.statements();
    if request.get("encodeBase64") != Some("1") {
        return statements;
    }

    statements
        .into_iter()
        .map(|q| {
            match BASE64
                .decode(q.trim())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
            {
                Some(sql) => sql,
                None => {
                    tracing::warn!("statement is not valid base64, using it verbatim");
                    q
                }
            }
        })
        .collect()
}
