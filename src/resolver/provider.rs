use super::decrypt::{DecryptClient, Decrypted, DecryptedSources};
use super::model::{PlaybackHeaders, ResolvedSource, StreamVariant, SubtitleTrack, TitleQuery};
use super::quality::quality_from_json;
use crate::config::UpstreamConfig;
use crate::error::RelayError;
use async_trait::async_trait;
use axum::http::header;
use reqwest::Client;
use tracing::{debug, info};

/// Result of asking one provider for a title
#[derive(Debug)]
pub enum ProviderOutcome {
    /// Usable streams; resolution stops here
    Found(ResolvedSource),
    /// Soft failure (empty body, malformed decrypt result, no variants)
    Skipped(String),
    /// Hard failure reaching the provider or the decrypt service
    Failed(RelayError),
}

/// A source of encrypted stream listings
///
/// Implementations are tried in order by [`SourceResolver`](super::SourceResolver);
/// the first one returning [`ProviderOutcome::Found`] wins.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Identifier used in logs
    fn id(&self) -> &str;

    async fn resolve(&self, query: &TitleQuery) -> ProviderOutcome;
}

/// Provider whose `sources-with-title` listing is decrypted by an external service
#[derive(Clone, Debug)]
pub struct EncryptedListingProvider {
    source_id: String,
    provider_name: String,
    base_url: String,
    headers: PlaybackHeaders,
    client: Client,
    decryptor: DecryptClient,
}

impl EncryptedListingProvider {
    pub fn new(source_id: impl Into<String>, upstream: &UpstreamConfig, client: Client) -> Self {
        Self {
            source_id: source_id.into(),
            provider_name: upstream.provider_name.clone(),
            base_url: upstream.origin(),
            headers: PlaybackHeaders {
                user_agent: upstream.user_agent.clone(),
                referer: upstream.referer(),
                origin: upstream.origin(),
            },
            decryptor: DecryptClient::new(client.clone(), upstream.decrypt_url.clone()),
            client,
        }
    }

    /// Listing URL for `query`; TV adds episode and season identifiers.
    pub fn listing_url(&self, query: &TitleQuery) -> String {
        let mut url = format!(
            "{}/{}/sources-with-title?mediaType={}&year={}&tmdbId={}&imdbId={}&title={}",
            self.base_url,
            self.source_id,
            query.media_type.as_str(),
            urlencoding::encode(query.year.as_deref().unwrap_or_default()),
            urlencoding::encode(&query.tmdb_id),
            urlencoding::encode(query.imdb_id.as_deref().unwrap_or_default()),
            urlencoding::encode(&query.title),
        );

        if let Some(ep) = query.episode {
            url.push_str(&format!("&episodeId={}&seasonId={}", ep.episode, ep.season));
        }

        url
    }

    fn normalize(&self, payload: DecryptedSources) -> ProviderOutcome {
        let Some(sources) = payload.sources else {
            return ProviderOutcome::Skipped("decrypt result has no sources".to_string());
        };

        let streams: Vec<StreamVariant> = sources
            .into_iter()
            .filter_map(|item| match item.url {
                Some(url) if !url.is_empty() => {
                    Some(StreamVariant::hls(url, quality_from_json(&item.quality)))
                }
                _ => {
                    debug!("Dropping source entry without url from {}", self.source_id);
                    None
                }
            })
            .collect();

        if streams.is_empty() {
            return ProviderOutcome::Skipped("no stream variants".to_string());
        }

        let tracks = payload
            .subtitles
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sub| {
                sub.url
                    .map(|url| SubtitleTrack::captions(url, sub.language.unwrap_or_default()))
            })
            .collect();

        let mut resolved = ResolvedSource {
            provider: self.provider_name.clone(),
            streams,
            tracks,
            headers: self.headers.clone(),
        };
        resolved.sort_streams();

        ProviderOutcome::Found(resolved)
    }
}

#[async_trait]
impl StreamProvider for EncryptedListingProvider {
    fn id(&self) -> &str {
        &self.source_id
    }

    async fn resolve(&self, query: &TitleQuery) -> ProviderOutcome {
        let url = self.listing_url(query);
        info!("Requesting listing: {}", url);

        let response = match self
            .client
            .get(&url)
            .header(header::USER_AGENT, self.headers.user_agent.as_str())
            .header(header::REFERER, self.headers.referer.as_str())
            .header(header::ORIGIN, self.headers.origin.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ProviderOutcome::Failed(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return ProviderOutcome::Skipped(format!("listing returned {status}"));
        }

        let ciphertext = match response.text().await {
            Ok(text) => text,
            Err(e) => return ProviderOutcome::Failed(e.into()),
        };
        debug!("Listing response length: {}", ciphertext.len());

        if ciphertext.trim().is_empty() {
            return ProviderOutcome::Skipped("empty listing response".to_string());
        }

        match self.decryptor.decrypt(&ciphertext, &query.tmdb_id).await {
            Ok(Decrypted::Payload(payload)) => self.normalize(payload),
            Ok(Decrypted::Malformed(reason)) => ProviderOutcome::Skipped(reason),
            Err(e) => ProviderOutcome::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::decrypt::{RawSource, RawSubtitle};
    use crate::resolver::model::{EpisodeRef, MediaType};
    use serde_json::json;

    fn provider() -> EncryptedListingProvider {
        EncryptedListingProvider::new("myflixerzupcloud", &UpstreamConfig::default(), Client::new())
    }

    fn query() -> TitleQuery {
        TitleQuery {
            tmdb_id: "27205".into(),
            imdb_id: Some("tt1375666".into()),
            title: "Inception & Co".into(),
            year: Some("2010".into()),
            media_type: MediaType::Movie,
            episode: None,
        }
    }

    #[test]
    fn movie_listing_url() {
        assert_eq!(
            provider().listing_url(&query()),
            "https://api.videasy.net/myflixerzupcloud/sources-with-title?mediaType=movie\
             &year=2010&tmdbId=27205&imdbId=tt1375666&title=Inception%20%26%20Co"
        );
    }

    #[test]
    fn tv_listing_url_appends_episode_and_season() {
        let mut q = query();
        q.media_type = MediaType::Tv;
        q.episode = Some(EpisodeRef {
            season: 3,
            episode: 7,
        });
        let url = provider().listing_url(&q);
        assert!(url.contains("mediaType=tv"));
        assert!(url.ends_with("&episodeId=7&seasonId=3"));
    }

    #[test]
    fn normalize_sorts_and_maps_tracks() {
        let payload = DecryptedSources {
            sources: Some(vec![
                RawSource {
                    url: Some("https://a/480.m3u8".into()),
                    quality: json!("480p"),
                },
                RawSource {
                    url: Some("https://a/auto.m3u8".into()),
                    quality: json!("auto"),
                },
                RawSource {
                    url: None,
                    quality: json!("720p"),
                },
            ]),
            subtitles: Some(vec![RawSubtitle {
                url: Some("https://a/en.vtt".into()),
                language: Some("English".into()),
            }]),
        };

        let ProviderOutcome::Found(resolved) = provider().normalize(payload) else {
            panic!("expected streams");
        };
        let qualities: Vec<u32> = resolved.streams.iter().map(|s| s.quality).collect();
        assert_eq!(qualities, vec![1080, 480]);
        assert_eq!(resolved.provider, "AVideasy");
        assert_eq!(resolved.tracks, vec![SubtitleTrack::captions("https://a/en.vtt", "English")]);
        assert_eq!(resolved.headers.referer, "https://api.videasy.net/");
    }

    #[test]
    fn normalize_without_sources_is_skipped() {
        let outcome = provider().normalize(DecryptedSources::default());
        assert!(matches!(outcome, ProviderOutcome::Skipped(_)));

        let outcome = provider().normalize(DecryptedSources {
            sources: Some(vec![]),
            subtitles: None,
        });
        assert!(matches!(outcome, ProviderOutcome::Skipped(_)));
    }
}
