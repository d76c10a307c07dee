use axum::Json;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::ApiError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required option {0} is missing")]
    Missing(&'static str),
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Download timeout")]
    Timeout,
    #[error("Download failed")]
    Failed(Option<i32>),
    #[error("Download failed")]
    MissingOutput,
    #[error("Download failed")]
    Spawn(#[source] std::io::Error),
    #[error("Download failed")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error {code}: {description}")]
    Api { code: u16, description: String },
    #[error("Telegram rate limit persisted after {0} attempt(s)")]
    RateLimited(u32),
    #[error("Unexpected Telegram response [{0}]")]
    InvalidResponse(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Missing parameters")]
    MissingParameters,
    #[error("Invalid JSON body")]
    InvalidBody(#[source] serde_json::Error),
    #[error("Invalid URL")]
    InvalidUrl,
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Telegram(#[from] TelegramError),
    #[error("Job queue is closed")]
    QueueClosed,
}

impl IntoResponse for EndpointError {
    fn into_response(self) -> Response<Body> {
        tracing::warn!(
            "Something Happened when processing this endpoint: {:?}",
            self
        );

        let status = match self {
            EndpointError::Unauthorized => StatusCode::UNAUTHORIZED,
            EndpointError::MissingParameters
            | EndpointError::InvalidBody(_)
            | EndpointError::InvalidUrl => StatusCode::BAD_REQUEST,
            EndpointError::Download(_) | EndpointError::Telegram(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            EndpointError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
        };

        (
            status,
            Json(ApiError {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_errors_keep_public_messages() {
        assert_eq!(DownloadError::Timeout.to_string(), "Download timeout");
        assert_eq!(DownloadError::Failed(Some(1)).to_string(), "Download failed");
        assert_eq!(DownloadError::MissingOutput.to_string(), "Download failed");
    }

    #[tokio::test]
    async fn io_failures_do_not_leak_os_messages() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/tmp/secret: denied");
        let error = EndpointError::from(DownloadError::from(io));

        assert_eq!(error.to_string(), "Download failed");
        assert!(std::error::Error::source(&error).is_some());

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "Download failed");
    }

    #[test]
    fn status_codes() {
        let cases = [
            (EndpointError::Unauthorized, StatusCode::UNAUTHORIZED),
            (EndpointError::MissingParameters, StatusCode::BAD_REQUEST),
            (EndpointError::InvalidUrl, StatusCode::BAD_REQUEST),
            (
                EndpointError::Download(DownloadError::Timeout),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                EndpointError::Telegram(TelegramError::RateLimited(3)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (EndpointError::QueueClosed, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
