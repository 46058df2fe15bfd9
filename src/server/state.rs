use crate::{
    config::Config,
    error::{RelayError, Result},
    hls::MasterPlaylistBuilder,
    resolver::SourceResolver,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Shared HTTP client for connection pooling
    pub http_client: Client,
    /// Provider chain used by the stream endpoints
    pub resolver: Arc<SourceResolver>,
    /// Master playlist renderer with its bandwidth table
    pub master: Arc<MasterPlaylistBuilder>,
    /// Process start, reported by the health endpoint
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        // No request timeout; a client abort cancels the upstream fetch
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to create HTTP client: {e}")))?;

        let resolver = SourceResolver::from_config(&config.upstream, http_client.clone());

        Ok(Self {
            config: Arc::new(config),
            http_client,
            resolver: Arc::new(resolver),
            master: Arc::new(MasterPlaylistBuilder::default()),
            started_at: Instant::now(),
        })
    }
}
