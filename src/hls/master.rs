//! Multivariant playlist synthesis from resolved stream variants.

use crate::proxy::proxy_path;
use crate::resolver::ResolvedSource;
use std::fmt::Write;
use tracing::info;

/// Bandwidth assumed for qualities missing from the table, in bits/sec
pub const DEFAULT_BANDWIDTH: u64 = 3_000_000;

/// Fixed quality → bandwidth estimates (bits/sec)
#[derive(Clone, Debug)]
pub struct BandwidthTable {
    entries: Vec<(u32, u64)>,
    fallback: u64,
}

impl BandwidthTable {
    pub fn lookup(&self, quality: u32) -> u64 {
        self.entries
            .iter()
            .find(|(q, _)| *q == quality)
            .map(|(_, bw)| *bw)
            .unwrap_or(self.fallback)
    }
}

impl Default for BandwidthTable {
    fn default() -> Self {
        Self {
            entries: vec![
                (360, 800_000),
                (480, 1_400_000),
                (720, 2_800_000),
                (1080, 5_000_000),
                (4096, 10_000_000),
            ],
            fallback: DEFAULT_BANDWIDTH,
        }
    }
}

/// Width for a given height under a fixed 16:9 assumption.
pub fn width_for_quality(quality: u32) -> u32 {
    (16.0 / 9.0 * f64::from(quality)).round() as u32
}

/// `http` for loopback hosts, `https` for everything else (TLS is terminated
/// in front of the relay in deployment).
pub fn scheme_for_host(host: &str) -> &'static str {
    if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    }
}

/// Builds `#EXT-X-STREAM-INF` playlists whose variants point back at `/proxy`.
#[derive(Clone, Debug, Default)]
pub struct MasterPlaylistBuilder {
    bandwidth: BandwidthTable,
}

impl MasterPlaylistBuilder {
    pub fn new(bandwidth: BandwidthTable) -> Self {
        Self { bandwidth }
    }

    /// Render the master playlist.
    ///
    /// `base` is the absolute prefix for variant URLs, e.g. `https://relay.example.com`.
    /// `default_referer`/`default_origin` stand in for empty resolved headers.
    pub fn build(
        &self,
        resolved: &ResolvedSource,
        base: &str,
        default_referer: &str,
        default_origin: &str,
    ) -> String {
        let referer = resolved.headers.referer_or(default_referer);
        let origin = resolved.headers.origin_or(default_origin);

        let mut streams: Vec<_> = resolved.streams.iter().collect();
        streams.sort_by(|a, b| b.quality.cmp(&a.quality));

        let mut playlist = String::with_capacity(256 * (streams.len() + 1));
        let _ = writeln!(playlist, "#EXTM3U");
        let _ = writeln!(playlist, "#EXT-X-VERSION:3");

        for stream in streams {
            let _ = writeln!(
                playlist,
                "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{},NAME=\"{}p\"",
                self.bandwidth.lookup(stream.quality),
                width_for_quality(stream.quality),
                stream.quality,
                stream.quality
            );
            let _ = writeln!(
                playlist,
                "{}{}",
                base.trim_end_matches('/'),
                proxy_path(&stream.file, referer, origin, true)
            );
        }

        info!(
            "Built master playlist with {} variants for {}",
            resolved.streams.len(),
            resolved.provider
        );

        playlist
    }
}
