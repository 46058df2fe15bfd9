//! Prometheus metrics for relay traffic.
//!
//! The recorder is installed once per process; repeated router builds
//! (tests, restarts in-process) reuse the same handle.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::warn;

/// How often histogram samples are folded into their summaries
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the global Prometheus recorder if it is not installed yet.
pub fn init() {
    HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder unavailable: {}", e);
            None
        }
    });
}

/// Render the current metrics in Prometheus text exposition format.
pub fn render() -> String {
    HANDLE
        .get()
        .and_then(|h| h.as_ref())
        .map(|h| h.render())
        .unwrap_or_default()
}

/// Drain buffered histogram samples into the exporter's summaries.
///
/// Without this, every recorded duration is retained until the next scrape.
pub fn run_upkeep() {
    if let Some(handle) = HANDLE.get().and_then(|h| h.as_ref()) {
        handle.run_upkeep();
    }
}

/// Run [`run_upkeep`] every `period` for the lifetime of the runtime.
///
/// Returns `None` when no recorder is installed.
pub fn spawn_upkeep(period: Duration) -> Option<JoinHandle<()>> {
    let handle = HANDLE.get()?.as_ref()?.clone();

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            handle.run_upkeep();
        }
    }))
}

pub fn record_request(endpoint: &'static str, status: u16) {
    counter!(
        "hls_relay_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_duration(endpoint: &'static str, start: Instant) {
    histogram!("hls_relay_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(endpoint: &'static str) {
    counter!("hls_relay_upstream_errors_total", "endpoint" => endpoint).increment(1);
}
