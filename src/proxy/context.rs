use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};
use serde::Deserialize;
use url::Url;

/// Raw `/proxy` query parameters (already percent-decoded by the extractor)
#[derive(Debug, Default, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
    pub referer: Option<String>,
    pub origin: Option<String>,
    #[serde(rename = "type")]
    pub format: Option<String>,
}

/// Per-request view of a `/proxy` call with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRequestContext {
    pub target: Url,
    pub referer: String,
    pub origin: String,
    /// `type=m3u8` on the request forces manifest handling
    pub force_manifest: bool,
}

impl ProxyRequestContext {
    /// Validate the query and fill missing Referer/Origin from the provider defaults.
    ///
    /// # Errors
    /// - [`RelayError::BadRequest`] when `url` is absent or empty
    /// - [`RelayError::InvalidTarget`] when `url` is not an absolute http(s) URL
    pub fn from_params(params: ProxyParams, upstream: &UpstreamConfig) -> Result<Self> {
        let raw = params
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| RelayError::BadRequest("Missing url parameter".to_string()))?;

        let target = parse_target(raw.trim())?;

        let referer = params
            .referer
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| upstream.referer());
        let origin = params
            .origin
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| upstream.origin());

        Ok(Self {
            target,
            referer,
            origin,
            force_manifest: params
                .format
                .is_some_and(|f| f.eq_ignore_ascii_case("m3u8")),
        })
    }
}

/// Accept only absolute `http://` and `https://` URLs with a host.
fn parse_target(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw).map_err(|_| RelayError::InvalidTarget(raw.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(RelayError::InvalidTarget(format!(
                "scheme '{scheme}' not allowed, only http/https"
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(RelayError::InvalidTarget(format!("no host in {raw}")));
    }

    Ok(parsed)
}
