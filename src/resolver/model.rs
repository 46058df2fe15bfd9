use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};

/// Kind of title being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

/// Query parameters accepted by `/api/streams` and `/api/master.m3u8`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    pub tmdb_id: Option<String>,
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
}

/// Season/episode pair, only present for TV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeRef {
    pub season: u32,
    pub episode: u32,
}

/// Validated identity of the title to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleQuery {
    pub tmdb_id: String,
    pub imdb_id: Option<String>,
    pub title: String,
    pub year: Option<String>,
    pub media_type: MediaType,
    pub episode: Option<EpisodeRef>,
}

impl TryFrom<StreamQuery> for TitleQuery {
    type Error = RelayError;

    fn try_from(q: StreamQuery) -> Result<Self> {
        let (Some(tmdb_id), Some(title)) = (non_empty(q.tmdb_id), non_empty(q.title)) else {
            return Err(RelayError::BadRequest(
                "Missing required parameters".to_string(),
            ));
        };

        let media_type = match non_empty(q.media_type).as_deref() {
            None | Some("movie") => MediaType::Movie,
            Some("tv") => MediaType::Tv,
            Some(other) => {
                return Err(RelayError::BadRequest(format!(
                    "Unsupported type '{other}', expected movie or tv"
                )));
            }
        };

        let episode = match media_type {
            MediaType::Movie => None,
            MediaType::Tv => Some(EpisodeRef {
                season: parse_index("season", q.season)?,
                episode: parse_index("episode", q.episode)?,
            }),
        };

        Ok(Self {
            tmdb_id,
            imdb_id: non_empty(q.imdb_id),
            title,
            year: non_empty(q.year),
            media_type,
            episode,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_index(name: &str, value: Option<String>) -> Result<u32> {
    let raw = non_empty(value)
        .ok_or_else(|| RelayError::BadRequest(format!("Missing {name} for tv content")))?;
    raw.parse()
        .map_err(|_| RelayError::BadRequest(format!("Invalid {name} '{raw}'")))
}

/// Headers the upstream requires when fetching resolved URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackHeaders {
    #[serde(rename = "user-agent")]
    pub user_agent: String,
    pub referer: String,
    pub origin: String,
}

impl PlaybackHeaders {
    /// Referer for proxied fetches; `fallback` when the provider left it empty.
    pub fn referer_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.referer.is_empty() { fallback } else { &self.referer }
    }

    /// Origin for proxied fetches; `fallback` when the provider left it empty.
    pub fn origin_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.origin.is_empty() { fallback } else { &self.origin }
    }
}

/// One quality rendition of the title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamVariant {
    pub file: String,
    pub quality: u32,
    #[serde(rename = "type")]
    pub codec: String,
}

impl StreamVariant {
    pub fn hls(file: impl Into<String>, quality: u32) -> Self {
        Self {
            file: file.into(),
            quality,
            codec: "hls".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleTrack {
    pub file: String,
    pub kind: String,
    pub label: String,
}

impl SubtitleTrack {
    pub fn captions(file: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind: "captions".to_string(),
            label: label.into(),
        }
    }
}

/// Result of a successful resolution; streams are ordered by quality, highest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSource {
    #[serde(rename = "source")]
    pub provider: String,
    pub streams: Vec<StreamVariant>,
    pub tracks: Vec<SubtitleTrack>,
    pub headers: PlaybackHeaders,
}

impl ResolvedSource {
    pub fn sort_streams(&mut self) {
        self.streams.sort_by(|a, b| b.quality.cmp(&a.quality));
    }
}
