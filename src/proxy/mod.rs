//! The `/proxy` pipeline: request context, response classification,
//! upstream fetch and byte relay.

pub mod classify;
pub mod context;
pub mod relay;
pub mod upstream;

pub use classify::{ResponseKind, classify};
pub use context::{ProxyParams, ProxyRequestContext};

/// Build a same-origin `/proxy` path tunnelling `target` with the given
/// Referer/Origin context. `manifest_hint` appends `type=m3u8`.
pub fn proxy_path(target: &str, referer: &str, origin: &str, manifest_hint: bool) -> String {
    let mut path = format!(
        "/proxy?url={}&referer={}&origin={}",
        urlencoding::encode(target),
        urlencoding::encode(referer),
        urlencoding::encode(origin)
    );
    if manifest_hint {
        path.push_str("&type=m3u8");
    }
    path
}
