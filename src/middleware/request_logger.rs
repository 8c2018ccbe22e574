use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_BODY_LOG_SIZE: usize = 1024; // 1KB limit for body logging
// axum's default extractor body limit.
const MAX_BUFFERED_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Logs each request and its response, tagging both with a generated request id.
/// `State(log_body)` turns on size-limited body logging.
pub async fn request_logger_middleware(
    State(log_body): State<bool>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&request_id).ok();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    if let Some(value) = &header_value {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    if log_body {
        let (parts, body) = req.into_parts();
        let bytes = match axum::body::to_bytes(body, MAX_BUFFERED_BODY_SIZE).await {
            Ok(bytes) => bytes,
            Err(_) => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    uri = %uri,
                    "Request body too large or failed to read"
                );
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
        };

        let body_str = body_for_log(&bytes);

        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            body_size = bytes.len(),
            body = %body_str,
            "Incoming request"
        );

        req = Request::from_parts(parts, Body::from(bytes));
    } else {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            "Incoming request"
        );
    }

    let mut response = next.run(req).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        latency_ms = start.elapsed().as_millis(),
        "Outgoing response"
    );

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Renders at most `MAX_BODY_LOG_SIZE` bytes of the body.
fn body_for_log(bytes: &[u8]) -> String {
    if bytes.len() > MAX_BODY_LOG_SIZE {
        let head = String::from_utf8_lossy(&bytes[..MAX_BODY_LOG_SIZE]);
        return format!("{}... [truncated, {} bytes]", head, bytes.len());
    }

    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(json) => json.to_string(),
        Err(_) => format!("[non-json, {} bytes]", bytes.len()),
    }
}
