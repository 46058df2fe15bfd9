use crate::proxy::proxy_path;
use tracing::{debug, info};
use url::Url;

/// Rewrite every URI line of an HLS playlist into a same-origin `/proxy` URL.
///
/// Directive (`#`) and blank lines pass through verbatim. URI lines are
/// resolved against `fetch_url`, so relative, scheme-relative and absolute
/// references all end up absolute. A line that cannot be resolved is left
/// as-is. The output always has the same number of lines as the input.
pub fn rewrite_manifest(body: &str, fetch_url: &Url, referer: &str, origin: &str) -> String {
    let mut rewritten = 0usize;

    let lines: Vec<String> = body
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return line.to_string();
            }

            match fetch_url.join(trimmed) {
                Ok(absolute) => {
                    rewritten += 1;
                    proxy_path(absolute.as_str(), referer, origin, false)
                }
                Err(e) => {
                    debug!("Leaving unresolvable manifest line {:?}: {}", trimmed, e);
                    line.to_string()
                }
            }
        })
        .collect();

    info!("Rewrote {} URI lines in manifest from {}", rewritten, fetch_url);

    lines.join("\n")
}
