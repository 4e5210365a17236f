use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags each request with an id, logs it on completion at a level matching the
/// status class and echoes the id back in `x-request-id`.
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_owned())
        .unwrap_or_else(|| uri.path().to_owned());

    let span = tracing::info_span!("request", request_id = %request_id, method = %method, path = %matched_path);

    let mut response = next.run(req).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    span.in_scope(|| match status {
        500..=599 => tracing::error!(status, duration_ms, uri = %uri, "request failed"),
        400..=499 => tracing::warn!(status, duration_ms, uri = %uri, "request rejected"),
        _ => tracing::info!(status, duration_ms, uri = %uri, "request completed"),
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
