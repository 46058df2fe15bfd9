//! Upstream fetch for proxied resources.
//!
//! Single attempt, no timeout: a client abort drops the response future and
//! with it the upstream connection.

use super::ProxyRequestContext;
use axum::http::{HeaderValue, header};
use reqwest::{Client, Response};
use tracing::{debug, warn};

/// Fetch the proxy target with the spoofed browser header set.
///
/// The inbound `Range` header, when present, is forwarded verbatim so that
/// players can seek.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] on transport failure. Non-2xx
/// statuses are returned as a normal [`Response`].
pub async fn fetch(
    client: &Client,
    ctx: &ProxyRequestContext,
    user_agent: &str,
    range: Option<&HeaderValue>,
) -> Result<Response, reqwest::Error> {
    let mut request = client
        .get(ctx.target.clone())
        .header(header::USER_AGENT, user_agent)
        .header(header::REFERER, ctx.referer.as_str())
        .header(header::ORIGIN, ctx.origin.as_str())
        .header(header::ACCEPT, "*/*")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");

    if let Some(range) = range {
        debug!("Forwarding Range {:?} to {}", range, ctx.target);
        request = request.header(header::RANGE, range.clone());
    }

    request.send().await.inspect_err(|e| {
        warn!("Upstream fetch failed for {}: {}", ctx.target, e);
    })
}
