use std::env;

/// Desktop browser User-Agent the upstream provider expects to see.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const DEFAULT_PROVIDER_NAME: &str = "AVideasy";
const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.videasy.net";
const DEFAULT_PROVIDER_SOURCES: &str = "myflixerzupcloud";
const DEFAULT_DECRYPT_URL: &str = "https://enc-dec.app/api/dec-videasy";

/// Upstream provider settings, fixed for the lifetime of the process
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamConfig {
    /// Label reported as `source` in resolved results
    pub provider_name: String,
    /// Provider site root, e.g. `https://api.videasy.net`
    pub base_url: String,
    /// Ordered source identifiers tried by the resolver; first success wins
    pub sources: Vec<String>,
    /// Decryption collaborator endpoint (JSON POST)
    pub decrypt_url: String,
    /// User-Agent sent on every upstream request
    pub user_agent: String,
}

impl UpstreamConfig {
    /// Default Referer presented to the upstream (the provider's own site)
    pub fn referer(&self) -> String {
        format!("{}/", self.origin())
    }

    /// Default Origin presented to the upstream
    pub fn origin(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            sources: vec![DEFAULT_PROVIDER_SOURCES.to_string()],
            decrypt_url: DEFAULT_DECRYPT_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Absolute prefix for self-referencing URLs in master playlists.
    /// When unset the prefix is derived from the request's Host header.
    pub public_base_url: Option<String>,
    pub upstream: UpstreamConfig,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, PORT defaults to 3000. In PROD mode, PORT is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        let defaults = UpstreamConfig::default();

        let sources: Vec<String> = env::var("PROVIDER_SOURCES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.sources);

        if sources.is_empty() {
            return Err("PROVIDER_SOURCES must name at least one source".into());
        }

        let upstream = UpstreamConfig {
            provider_name: env::var("PROVIDER_NAME").unwrap_or(defaults.provider_name),
            base_url: env::var("PROVIDER_BASE_URL").unwrap_or(defaults.base_url),
            sources,
            decrypt_url: env::var("DECRYPT_URL").unwrap_or(defaults.decrypt_url),
            user_agent: env::var("UPSTREAM_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        Ok(Config {
            port,
            is_dev,
            public_base_url,
            upstream,
        })
    }
}
