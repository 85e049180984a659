//! `x-request-id` for every request: kept when the client sends one,
//! generated otherwise, echoed on the response and recorded on the
//! `http_request` span together with status and latency.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderName, Request, Response};
use axum::middleware::{from_fn, Next};
use axum::Router;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, OnResponse, TraceLayer};
use tracing::{field, Span};

pub const HEADER: &str = "x-request-id";

/// The request id as seen by handlers, via `Extension<RequestIdValue>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestIdValue(pub String);

#[derive(Clone, Copy, Default)]
pub struct NanoIdGenerator;

impl MakeRequestId for NanoIdGenerator {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        nanoid::nanoid!().parse().ok().map(RequestId::new)
    }
}

fn id_of<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
}

async fn expose(mut req: Request<Body>, next: Next) -> axum::response::Response {
    let id = id_of(&req).to_owned();
    Span::current().record("request_id", field::display(&id));
    req.extensions_mut().insert(RequestIdValue(id));
    next.run(req).await
}

fn request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %id_of(req),
        status = field::Empty,
        latency_ms = field::Empty,
    )
}

#[derive(Clone, Copy, Default)]
struct RecordOutcome;

impl<B> OnResponse<B> for RecordOutcome {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status().as_u16();
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        span.record("status", status);
        span.record("latency_ms", latency_ms);
        tracing::debug!(parent: span, status, latency_ms, "request completed");
    }
}

type SpanLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    fn(&Request<Body>) -> Span,
    DefaultOnRequest,
    RecordOutcome,
>;

fn span_layer() -> SpanLayer {
    TraceLayer::new_for_http()
        .make_span_with(request_span as fn(&Request<Body>) -> Span)
        .on_response(RecordOutcome)
}

/// Apply the request id and span layers. The id is set before the span
/// opens, so the span always carries it.
pub fn wrap(router: Router) -> Router {
    let header = HeaderName::from_static(HEADER);
    router
        .layer(from_fn(expose))
        .layer(span_layer())
        .layer(PropagateRequestIdLayer::new(header.clone()))
        .layer(SetRequestIdLayer::new(header, NanoIdGenerator))
}
