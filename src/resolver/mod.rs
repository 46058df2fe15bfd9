//! Stream resolution: title metadata → decrypted, normalized stream list.

pub mod decrypt;
pub mod model;
pub mod provider;
pub mod quality;

pub use model::{
    EpisodeRef, MediaType, PlaybackHeaders, ResolvedSource, StreamQuery, StreamVariant,
    SubtitleTrack, TitleQuery,
};
pub use provider::{EncryptedListingProvider, ProviderOutcome, StreamProvider};

use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};
use reqwest::Client;
use tracing::{info, warn};

/// Tries providers in order; the first one with usable streams wins.
pub struct SourceResolver {
    providers: Vec<Box<dyn StreamProvider>>,
}

impl SourceResolver {
    pub fn new(providers: Vec<Box<dyn StreamProvider>>) -> Self {
        Self { providers }
    }

    /// One [`EncryptedListingProvider`] per configured source, in configured order.
    pub fn from_config(upstream: &UpstreamConfig, client: Client) -> Self {
        let providers = upstream
            .sources
            .iter()
            .map(|source| {
                Box::new(EncryptedListingProvider::new(
                    source.as_str(),
                    upstream,
                    client.clone(),
                )) as Box<dyn StreamProvider>
            })
            .collect();

        Self::new(providers)
    }

    /// Resolve `query` into a stream list sorted by quality, highest first.
    ///
    /// Soft failures move on to the next provider. Once every provider is
    /// exhausted the last hard failure is returned, or
    /// [`RelayError::NoStreamsFound`] when there was none.
    pub async fn resolve(&self, query: &TitleQuery) -> Result<ResolvedSource> {
        let mut last_failure = None;

        for provider in &self.providers {
            match provider.resolve(query).await {
                ProviderOutcome::Found(mut source) => {
                    source.sort_streams();
                    info!(
                        "Resolved {} streams for '{}' via {}",
                        source.streams.len(),
                        query.title,
                        provider.id()
                    );
                    return Ok(source);
                }
                ProviderOutcome::Skipped(reason) => {
                    info!("Provider {} skipped '{}': {}", provider.id(), query.title, reason);
                }
                ProviderOutcome::Failed(e) => {
                    warn!("Provider {} failed for '{}': {}", provider.id(), query.title, e);
                    last_failure = Some(e);
                }
            }
        }

        Err(last_failure.unwrap_or(RelayError::NoStreamsFound))
    }
}
