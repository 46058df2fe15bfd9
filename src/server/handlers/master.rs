use crate::{
    config::Config,
    error::RelayError,
    hls::master::scheme_for_host,
    metrics,
    proxy::relay::MPEGURL,
    resolver::{StreamQuery, TitleQuery},
    server::state::AppState,
};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{error, info};

/// Serve a multivariant playlist whose variants are `/proxy` URLs
///
/// Failures are still `#EXTM3U` bodies so players abort instead of hanging.
pub async fn serve_master(
    Query(params): Query<StreamQuery>,
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();

    let query = match TitleQuery::try_from(params) {
        Ok(query) => query,
        Err(_) => {
            metrics::record_request("master", 400);
            return playlist_error(StatusCode::BAD_REQUEST, "Missing parameters");
        }
    };

    info!("Generating master playlist for: {}", query.title);

    let resolved = match state.resolver.resolve(&query).await {
        Ok(resolved) if !resolved.streams.is_empty() => resolved,
        Ok(_) | Err(RelayError::NoStreamsFound) => {
            metrics::record_request("master", 500);
            metrics::record_duration("master", start);
            return playlist_error(StatusCode::INTERNAL_SERVER_ERROR, "No streams found");
        }
        Err(e) => {
            error!("Master playlist resolution failed for '{}': {}", query.title, e);
            metrics::record_request("master", 500);
            metrics::record_duration("master", start);
            return playlist_error(StatusCode::INTERNAL_SERVER_ERROR, "Server Error");
        }
    };

    let base = public_base(&state.config, &uri, &headers);
    let upstream = &state.config.upstream;
    let playlist = state
        .master
        .build(&resolved, &base, &upstream.referer(), &upstream.origin());

    metrics::record_request("master", 200);
    metrics::record_duration("master", start);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, MPEGURL),
            (header::CONTENT_DISPOSITION, "inline; filename=\"master.m3u8\""),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        playlist,
    )
        .into_response()
}

/// Absolute prefix for variant URLs: configured base, else scheme + request
/// authority (Host header, or the URI authority on HTTP/2).
fn public_base(config: &Config, uri: &Uri, headers: &HeaderMap) -> String {
    if let Some(base) = &config.public_base_url {
        return base.clone();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_else(|| format!("localhost:{}", config.port));

    format!("{}://{}", scheme_for_host(&host), host)
}

fn playlist_error(status: StatusCode, reason: &str) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, MPEGURL),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        format!("#EXTM3U\n#EXT-X-ERROR: {reason}"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use axum::http::HeaderValue;

    fn config(public_base_url: Option<&str>) -> Config {
        Config {
            port: 3000,
            is_dev: true,
            public_base_url: public_base_url.map(str::to_string),
            upstream: UpstreamConfig::default(),
        }
    }

    fn host(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn configured_base_wins() {
        let uri: Uri = "https://h2.example.com/api/master.m3u8".parse().unwrap();
        assert_eq!(
            public_base(&config(Some("https://public.example.org")), &uri, &host("a:1")),
            "https://public.example.org"
        );
    }

    #[test]
    fn host_header_used_for_http1() {
        let uri: Uri = "/api/master.m3u8".parse().unwrap();
        assert_eq!(
            public_base(&config(None), &uri, &host("relay.example.com")),
            "https://relay.example.com"
        );
        assert_eq!(
            public_base(&config(None), &uri, &host("127.0.0.1:3000")),
            "http://127.0.0.1:3000"
        );
    }

    #[test]
    fn uri_authority_used_without_host_header() {
        let uri: Uri = "https://relay.example.com/api/master.m3u8?tmdbId=1"
            .parse()
            .unwrap();
        assert_eq!(
            public_base(&config(None), &uri, &HeaderMap::new()),
            "https://relay.example.com"
        );
    }

    #[test]
    fn localhost_is_last_resort() {
        let uri: Uri = "/api/master.m3u8".parse().unwrap();
        assert_eq!(
            public_base(&config(None), &uri, &HeaderMap::new()),
            "http://localhost:3000"
        );
    }
}
