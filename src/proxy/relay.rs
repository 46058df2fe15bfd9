//! Response construction for the three `/proxy` handling paths.

use super::classify::segment_content_type;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use tracing::warn;

pub const MPEGURL: &str = "application/vnd.apple.mpegurl";

/// Open CORS headers shared by every `/proxy` response.
pub fn insert_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Range, Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Length, Content-Range"),
    );
}

/// Rewritten playlist, status mirrored from upstream.
pub fn manifest_response(status: StatusCode, body: String) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(MPEGURL));
    insert_cors_headers(&mut headers);

    (status, headers, body).into_response()
}

/// Media segment relay: Content-Type derived from the URL, range headers
/// forwarded, `Accept-Ranges: bytes` forced when upstream omits it.
pub fn segment_response(target: &str, upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(segment_content_type(target)),
    );
    insert_cors_headers(&mut headers);
    copy_header(upstream.headers(), &mut headers, header::CONTENT_RANGE);
    copy_header(upstream.headers(), &mut headers, header::CONTENT_LENGTH);

    let accept_ranges = upstream
        .headers()
        .get(header::ACCEPT_RANGES)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("bytes"));
    headers.insert(header::ACCEPT_RANGES, accept_ranges);

    (status, headers, stream_body(target, upstream)).into_response()
}

/// Generic relay: upstream Content-Type as-is.
pub fn passthrough_response(target: &str, upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = HeaderMap::new();
    copy_header(upstream.headers(), &mut headers, header::CONTENT_TYPE);
    copy_header(upstream.headers(), &mut headers, header::CONTENT_RANGE);
    copy_header(upstream.headers(), &mut headers, header::CONTENT_LENGTH);
    insert_cors_headers(&mut headers);

    (status, headers, stream_body(target, upstream)).into_response()
}

/// Upstream answered with a non-success status: mirror it with a short reason.
pub fn upstream_status_response(status: StatusCode) -> Response {
    let mut headers = HeaderMap::new();
    insert_cors_headers(&mut headers);
    let reason = status.canonical_reason().unwrap_or("Unknown");

    (status, headers, format!("Upstream error: {reason}")).into_response()
}

/// Relay chunks as they arrive; hyper only polls the stream when the client
/// socket can take more, so nothing is buffered beyond one chunk.
fn stream_body(target: &str, upstream: reqwest::Response) -> Body {
    let target = target.to_string();
    let stream = upstream.bytes_stream().inspect_err(move |e| {
        warn!("Upstream body interrupted for {}: {}", target, e);
    });
    Body::from_stream(stream)
}

fn copy_header(from: &HeaderMap, to: &mut HeaderMap, name: header::HeaderName) {
    if let Some(value) = from.get(&name) {
        to.insert(name, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_headers_are_open() {
        let mut headers = HeaderMap::new();
        insert_cors_headers(&mut headers);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
                .to_str()
                .unwrap()
                .contains("Range")
        );
        assert!(
            headers[header::ACCESS_CONTROL_EXPOSE_HEADERS]
                .to_str()
                .unwrap()
                .contains("Content-Range")
        );
    }

    #[test]
    fn manifest_response_keeps_status_and_type() {
        let resp = manifest_response(StatusCode::OK, "#EXTM3U\n".to_string());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], MPEGURL);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn upstream_status_is_mirrored() {
        let resp = upstream_status_response(StatusCode::FORBIDDEN);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
