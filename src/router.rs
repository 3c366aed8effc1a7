//! HTTP router for ntunnel

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::engine::Connector;
use crate::handler::{TunnelState, tunnel_get, tunnel_post};

/// Create the tunnel router. Everything is served from `/`.
pub fn create_router<C: Connector>(state: Arc<TunnelState<C>>) -> Router {
    // Tracing layer for request logging
    let trace = TraceLayer::new_for_http();
    let body_limit = DefaultBodyLimit::max(state.router.config().max_body_bytes);

    Router::new()
        .route("/", get(tunnel_get::<C>).post(tunnel_post::<C>))
        .layer(body_limit)
        .layer(trace)
        .with_state(state)
}
