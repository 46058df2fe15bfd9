//! Client for the external decryption service.
//!
//! The provider's listing response is opaque ciphertext; the service turns it
//! into `{ "result": { "sources": [...], "subtitles": [...] } }`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Serialize)]
struct DecryptRequest<'a> {
    text: &'a str,
    id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecryptResponse {
    pub result: Option<DecryptedSources>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecryptedSources {
    pub sources: Option<Vec<RawSource>>,
    pub subtitles: Option<Vec<RawSubtitle>>,
}

#[derive(Debug, Deserialize)]
pub struct RawSource {
    pub url: Option<String>,
    #[serde(default)]
    pub quality: Value,
}

#[derive(Debug, Deserialize)]
pub struct RawSubtitle {
    pub url: Option<String>,
    pub language: Option<String>,
}

/// Outcome of a decrypt call that reached the service
#[derive(Debug)]
pub enum Decrypted {
    Payload(DecryptedSources),
    /// The service answered but not with a usable `result` object
    Malformed(String),
}

#[derive(Clone, Debug)]
pub struct DecryptClient {
    client: Client,
    endpoint: String,
}

impl DecryptClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// POST the ciphertext together with the title's TMDB id.
    ///
    /// # Errors
    ///
    /// Transport failures only; an unparseable body is [`Decrypted::Malformed`].
    pub async fn decrypt(&self, ciphertext: &str, tmdb_id: &str) -> Result<Decrypted, reqwest::Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&DecryptRequest {
                text: ciphertext,
                id: tmdb_id,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Decrypt service answered {} with {} bytes", status, body.len());

        match serde_json::from_str::<DecryptResponse>(&body) {
            Ok(DecryptResponse {
                result: Some(result),
            }) => Ok(Decrypted::Payload(result)),
            Ok(_) => Ok(Decrypted::Malformed("missing result".to_string())),
            Err(e) => Ok(Decrypted::Malformed(format!(
                "invalid JSON from decrypt service ({status}): {e}"
            ))),
        }
    }
}
