//! Error taxonomy for the relay and its HTTP rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A required query parameter was missing or empty
    #[error("{0}")]
    BadRequest(String),

    /// The proxy target is not an absolute http(s) URL
    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    /// Every configured provider was tried without a usable result
    #[error("No streams found")]
    NoStreamsFound,

    /// Transport failure reaching a provider, the decrypt service or a proxied resource
    #[error("{0}")]
    UpstreamFetchError(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::BadRequest(_) | RelayError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            RelayError::NoStreamsFound => StatusCode::NOT_FOUND,
            RelayError::UpstreamFetchError(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        }

        let message = match &self {
            RelayError::NoStreamsFound => "No streams found for this title".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn bad_request_produces_400() {
        let resp = RelayError::BadRequest("Missing url parameter".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Missing url parameter");
    }

    #[tokio::test]
    async fn no_streams_produces_404_with_message() {
        let resp = RelayError::NoStreamsFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await["error"],
            "No streams found for this title"
        );
    }

    #[test]
    fn invalid_target_is_client_error() {
        let err = RelayError::InvalidTarget("ftp://example.com".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_is_server_error() {
        assert_eq!(
            RelayError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
