use crate::{
    error::Result,
    metrics,
    proxy::proxy_path,
    resolver::{StreamQuery, TitleQuery},
    server::state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::info;

/// Resolve a title and return its streams and subtitle tracks as `/proxy` URLs
pub async fn list_streams(
    Query(params): Query<StreamQuery>,
    State(state): State<AppState>,
) -> Result<Response> {
    let start = Instant::now();
    let query = TitleQuery::try_from(params).inspect_err(|_| {
        metrics::record_request("streams", 400);
    })?;

    info!("Fetching streams for: {}", query.title);

    let mut resolved = state.resolver.resolve(&query).await.inspect_err(|e| {
        metrics::record_request("streams", e.status().as_u16());
        metrics::record_duration("streams", start);
    })?;

    let upstream = &state.config.upstream;
    let (default_referer, default_origin) = (upstream.referer(), upstream.origin());
    let referer = resolved.headers.referer_or(&default_referer).to_string();
    let origin = resolved.headers.origin_or(&default_origin).to_string();

    for stream in &mut resolved.streams {
        stream.file = proxy_path(&stream.file, &referer, &origin, true);
    }
    for track in &mut resolved.tracks {
        track.file = proxy_path(&track.file, &referer, &origin, false);
    }

    metrics::record_request("streams", 200);
    metrics::record_duration("streams", start);

    Ok(Json(resolved).into_response())
}
