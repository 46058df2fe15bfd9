use crate::{
    error::{RelayError, Result},
    hls::rewrite_manifest,
    metrics,
    proxy::{
        ProxyParams, ProxyRequestContext, ResponseKind, classify, classify::segment_content_type,
        relay, upstream,
    },
    server::state::AppState,
};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, header},
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// Relay a manifest, segment or other asset from upstream under our own origin
///
/// The upstream status is mirrored, including 206 for ranged requests.
pub async fn proxy(
    Query(params): Query<ProxyParams>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let start = Instant::now();
    let result = handle(params, &state, &headers).await;

    let status = match &result {
        Ok(response) => response.status(),
        Err(e) => {
            if matches!(e, RelayError::UpstreamFetchError(_)) {
                metrics::record_upstream_error("proxy");
            }
            e.status()
        }
    };
    metrics::record_request("proxy", status.as_u16());
    metrics::record_duration("proxy", start);

    result
}

async fn handle(params: ProxyParams, state: &AppState, headers: &HeaderMap) -> Result<Response> {
    let ctx = ProxyRequestContext::from_params(params, &state.config.upstream)?;

    info!("Proxy fetching: {}", preview(ctx.target.as_str()));

    let upstream = upstream::fetch(
        &state.http_client,
        &ctx,
        &state.config.upstream.user_agent,
        headers.get(header::RANGE),
    )
    .await?;

    let status = upstream.status();
    if !status.is_success() {
        warn!("Upstream answered {} for {}", status, ctx.target);
        return Ok(relay::upstream_status_response(status));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = match classify(&ctx, &content_type) {
        ResponseKind::Manifest => {
            let body = upstream.text().await?;
            info!("Manifest from {}: {} bytes", preview(ctx.target.as_str()), body.len());
            let rewritten = rewrite_manifest(&body, &ctx.target, &ctx.referer, &ctx.origin);
            relay::manifest_response(status, rewritten)
        }
        ResponseKind::Segment => {
            info!(
                "Segment ({}): ...{}",
                segment_content_type(ctx.target.as_str()),
                tail(ctx.target.as_str())
            );
            relay::segment_response(ctx.target.as_str(), upstream)
        }
        ResponseKind::Passthrough => relay::passthrough_response(ctx.target.as_str(), upstream),
    };

    Ok(response)
}

/// First 80 characters of a URL for log lines
fn preview(url: &str) -> &str {
    match url.char_indices().nth(80) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}

/// Last 20 characters of a URL for segment log lines
fn tail(url: &str) -> &str {
    let count = url.chars().count();
    match url.char_indices().nth(count.saturating_sub(20)) {
        Some((idx, _)) => &url[idx..],
        None => url,
    }
}
