//! HTTP request handlers for ntunnel
//!
//! Both methods feed the Action Router; only the parameter source differs.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::action::{ActionRouter, TunnelReply, TunnelRequest};
use crate::engine::Connector;

/// Content type of binary tunnel responses. Clients read the body as raw bytes.
pub const FRAMES_CONTENT_TYPE: &str = "text/plain; charset=x-user-defined";

/// Content type of the diagnostic page.
pub const PAGE_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// Shared state for the tunnel. Read-only after startup.
pub struct TunnelState<C> {
    pub router: ActionRouter<C>,
}

impl<C: Connector> TunnelState<C> {
    pub fn new(router: ActionRouter<C>) -> Self {
        Self { router }
    }
}

impl IntoResponse for TunnelReply {
    fn into_response(self) -> Response {
        match self {
            TunnelReply::Frames(body) => ([(header::CONTENT_TYPE, FRAMES_CONTENT_TYPE)], body).into_response(),
            TunnelReply::Page(html) => ([(header::CONTENT_TYPE, PAGE_CONTENT_TYPE)], html).into_response(),
        }
    }
}

/// `GET /`: parameters come from the query string.
pub async fn tunnel_get<C: Connector>(
    State(state): State<Arc<TunnelState<C>>>,
    RawQuery(query): RawQuery,
) -> TunnelReply {
    let request = TunnelRequest::from_form(query.unwrap_or_default().as_bytes());
    state.router.dispatch(&request).await
}

/// `POST /`: parameters come from the url-encoded body.
pub async fn tunnel_post<C: Connector>(
    State(state): State<Arc<TunnelState<C>>>,
    body: Bytes,
) -> TunnelReply {
    let request = TunnelRequest::from_form(&body);
    state.router.dispatch(&request).await
}
