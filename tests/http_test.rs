//! HTTP transport through the axum router.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{select_one, FakeConnector};
use ntunnel::handler::{FRAMES_CONTENT_TYPE, PAGE_CONTENT_TYPE};
use ntunnel::protocol::decoder::{ConnectionResponse, QueryResponse};
use ntunnel::protocol::{decode_connection_response, decode_query_response};
use ntunnel::{TunnelConfig, TunnelServer};
use pretty_assertions::assert_eq;
use tower::ServiceExt;

fn app(fake: FakeConnector, test_menu: bool) -> Router {
    let config = TunnelConfig::builder().test_menu(test_menu).build();
    TunnelServer::with_connector(config, fake).router()
}

fn post(form: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (String, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (content_type, body.to_vec())
}

#[tokio::test]
async fn test_post_connection_test() {
    let fake = FakeConnector::builder().version("8.0.36").build();

    let (content_type, body) = send(
        app(fake, true),
        post("actn=C&host=db&port=3306&login=root&password=p%40ss"),
    )
    .await;

    assert_eq!(content_type, FRAMES_CONTENT_TYPE);
    let ConnectionResponse::Connected { info, .. } = decode_connection_response(&body).unwrap() else {
        panic!("expected success");
    };
    assert_eq!(info.server_version, "8.0.36");
}

#[tokio::test]
async fn test_post_query_batch() {
    let (columns, rows) = select_one();
    let fake = FakeConnector::builder()
        .rows("SELECT 1", columns, rows)
        .affected("DELETE FROM t", Some(4), None)
        .build();

    let (content_type, body) = send(
        app(fake, true),
        post("actn=Q&host=db&port=3306&login=root&q=SELECT+1&q=DELETE+FROM+t"),
    )
    .await;

    assert_eq!(content_type, FRAMES_CONTENT_TYPE);
    let QueryResponse::Statements { statements, .. } = decode_query_response(&body).unwrap() else {
        panic!("expected statements");
    };
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[1].header.affected_rows, 4);
}

#[tokio::test]
async fn test_bare_get_serves_page() {
    let (content_type, body) = send(app(FakeConnector::builder().build(), true), get("/")).await;

    assert_eq!(content_type, PAGE_CONTENT_TYPE);
    assert!(String::from_utf8(body).unwrap().starts_with("<!DOCTYPE html>"));
}

#[tokio::test]
async fn test_bare_get_without_test_menu() {
    let (content_type, body) = send(app(FakeConnector::builder().build(), false), get("/")).await;

    assert_eq!(content_type, FRAMES_CONTENT_TYPE);
    let ConnectionResponse::Error { header, message } = decode_connection_response(&body).unwrap() else {
        panic!("expected error");
    };
    assert_eq!(header.errno, 202);
    assert_eq!(message, "invalid parameters");
}

#[tokio::test]
async fn test_get_with_query_string() {
    let fake = FakeConnector::builder().unreachable("Unknown MySQL server host 'nope'").build();

    let (content_type, body) = send(
        app(fake, true),
        get("/?actn=C&host=nope&port=3306&login=root"),
    )
    .await;

    assert_eq!(content_type, FRAMES_CONTENT_TYPE);
    let ConnectionResponse::Error { header, message } = decode_connection_response(&body).unwrap() else {
        panic!("expected error");
    };
    assert_eq!(header.errno, 2000);
    assert_eq!(message, "Unknown MySQL server host 'nope'");
}

#[tokio::test]
async fn test_large_batches_are_accepted() {
    let insert = format!("INSERT INTO t VALUES ('{}')", "x".repeat(3 * 1024 * 1024));
    let fake = FakeConnector::builder().affected(&insert, Some(1), Some(7)).build();
    let form = format!(
        "actn=Q&host=db&port=3306&login=root&q={}",
        url::form_urlencoded::byte_serialize(insert.as_bytes()).collect::<String>()
    );

    let (content_type, body) = send(app(fake.clone(), true), post(&form)).await;

    assert_eq!(content_type, FRAMES_CONTENT_TYPE);
    let QueryResponse::Statements { statements, .. } = decode_query_response(&body).unwrap() else {
        panic!("expected statements");
    };
    assert_eq!(statements[0].header.insert_id, 7);
    assert_eq!(fake.statements().len(), 1);
}

#[tokio::test]
async fn test_body_limit_is_configurable() {
    let fake = FakeConnector::builder().build();
    let config = TunnelConfig::builder().max_body_bytes(1024).build();
    let app = TunnelServer::with_connector(config, fake.clone()).router();
    let form = format!("actn=Q&host=db&port=3306&login=root&q={}", "x".repeat(4096));

    let response = app.oneshot(post(&form)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(fake.calls().is_empty());
}
