use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use api_ingress::request_id::{self, RequestIdValue};

fn app() -> Router {
    request_id::wrap(Router::new().route("/echo", get(echo)))
}

async fn echo(Extension(RequestIdValue(id)): Extension<RequestIdValue>) -> Json<Value> {
    Json(json!({ "request_id": id }))
}

async fn call(app: &Router, request: Request<Body>) -> (Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get(request_id::HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (header, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn generated_id_reaches_handler_and_response() {
    let (header, body) = call(&app(), Request::get("/echo").body(Body::empty()).unwrap()).await;
    let header = header.expect("x-request-id should be generated");
    assert!(!header.is_empty());
    assert_eq!(body["request_id"], header.as_str());
}

#[tokio::test]
async fn incoming_id_is_kept() {
    let request = Request::get("/echo")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let (header, body) = call(&app(), request).await;
    assert_eq!(header.as_deref(), Some("abc-123"));
    assert_eq!(body["request_id"], "abc-123");
}

#[tokio::test]
async fn each_request_gets_a_fresh_id() {
    let app = app();
    let (first, _) = call(&app, Request::get("/echo").body(Body::empty()).unwrap()).await;
    let (second, _) = call(&app, Request::get("/echo").body(Body::empty()).unwrap()).await;
    assert_ne!(first, second);
}
