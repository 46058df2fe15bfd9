use super::ProxyRequestContext;

/// Extensions routed through the segment path (matched at the very end of the URL)
const SEGMENT_EXTENSIONS: &[&str] = &[
    "ts", "m4s", "mp4", "jpg", "png", "html", "js", "css", "txt", "webp",
];

/// How a proxied upstream response is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// HLS playlist: buffered and rewritten
    Manifest,
    /// Media segment or static asset: streamed with a derived Content-Type
    Segment,
    /// Anything else: streamed with the upstream Content-Type
    Passthrough,
}

/// Classify an upstream response. Manifest detection wins over segment detection.
pub fn classify(ctx: &ProxyRequestContext, upstream_content_type: &str) -> ResponseKind {
    let target = ctx.target.as_str();

    if ctx.force_manifest
        || upstream_content_type.to_ascii_lowercase().contains("mpegurl")
        || target.contains(".m3u8")
    {
        ResponseKind::Manifest
    } else if is_segment_url(target) {
        ResponseKind::Segment
    } else {
        ResponseKind::Passthrough
    }
}

fn is_segment_url(url: &str) -> bool {
    if url.contains("/seg-") {
        return true;
    }

    url.rsplit_once('.').is_some_and(|(_, ext)| {
        SEGMENT_EXTENSIONS
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(candidate))
    })
}

/// Content-Type for the segment path, derived from the URL alone.
pub fn segment_content_type(url: &str) -> &'static str {
    if url.contains(".m4s") || url.contains(".mp4") {
        "video/iso.segment"
    } else if url.contains(".aac") || url.contains(".mp3") {
        "audio/aac"
    } else {
        "video/mp2t"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn ctx(url: &str, force_manifest: bool) -> ProxyRequestContext {
        ProxyRequestContext {
            target: Url::parse(url).unwrap(),
            referer: "https://api.videasy.net/".to_string(),
            origin: "https://api.videasy.net".to_string(),
            force_manifest,
        }
    }

    #[test]
    fn type_hint_forces_manifest() {
        assert_eq!(
            classify(&ctx("https://cdn.example.com/seg-1.ts", true), "video/mp2t"),
            ResponseKind::Manifest
        );
    }

    #[test]
    fn mpegurl_content_type_is_manifest() {
        assert_eq!(
            classify(
                &ctx("https://cdn.example.com/playlist", false),
                "application/vnd.apple.mpegURL"
            ),
            ResponseKind::Manifest
        );
        assert_eq!(
            classify(&ctx("https://cdn.example.com/playlist", false), "audio/x-mpegurl"),
            ResponseKind::Manifest
        );
    }

    #[test]
    fn m3u8_in_url_is_manifest() {
        assert_eq!(
            classify(
                &ctx("https://cdn.example.com/index.m3u8?token=abc", false),
                "text/plain"
            ),
            ResponseKind::Manifest
        );
    }

    #[test]
    fn segment_patterns() {
        for url in [
            "https://cdn.example.com/hls/seg-12-v1-a1.jpg?t=1",
            "https://cdn.example.com/a/000.ts",
            "https://cdn.example.com/a/chunk.M4S",
            "https://cdn.example.com/a/frag.mp4",
            "https://cdn.example.com/a/disguised.webp",
            "https://cdn.example.com/a/subs.txt",
        ] {
            assert_eq!(
                classify(&ctx(url, false), "application/octet-stream"),
                ResponseKind::Segment,
                "{url}"
            );
        }
    }

    #[test]
    fn extension_must_end_the_url() {
        assert_eq!(
            classify(
                &ctx("https://cdn.example.com/a/000.ts?token=1", false),
                "video/mp2t"
            ),
            ResponseKind::Passthrough
        );
    }

    #[test]
    fn everything_else_is_passthrough() {
        assert_eq!(
            classify(&ctx("https://cdn.example.com/subs/en.vtt", false), "text/vtt"),
            ResponseKind::Passthrough
        );
    }

    #[test]
    fn segment_content_type_by_suffix() {
        assert_eq!(segment_content_type("https://a/b/000.ts"), "video/mp2t");
        assert_eq!(segment_content_type("https://a/seg-1.jpg"), "video/mp2t");
        assert_eq!(segment_content_type("https://a/b/1.m4s"), "video/iso.segment");
        assert_eq!(segment_content_type("https://a/b/init.mp4"), "video/iso.segment");
        assert_eq!(segment_content_type("https://a/seg-1.aac"), "audio/aac");
        assert_eq!(segment_content_type("https://a/seg-1.mp3"), "audio/aac");
    }
}
