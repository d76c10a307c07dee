use crate::models::{WakeBody, WakeRequest, WakeResponse};
use crate::state::AppState;
use crate::util::errors::EndpointError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Fetches the requested video and delivers it to the requested chat. The
/// response is only sent once delivery finished or failed.
pub async fn wake(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WakeResponse>, EndpointError> {
    let body: WakeBody = serde_json::from_slice(&body).map_err(EndpointError::InvalidBody)?;
    let request = body
        .into_request()
        .ok_or(EndpointError::MissingParameters)?;

    validate_url(&request.url)?;

    run_job(&state, Uuid::new_v4(), &request).await?;

    Ok(Json(WakeResponse::success()))
}

fn validate_url(url: &str) -> Result<(), EndpointError> {
    let parsed = Url::parse(url).map_err(|_| EndpointError::InvalidUrl)?;

    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        _ => Err(EndpointError::InvalidUrl),
    }
}

#[tracing::instrument(skip(state, request), fields(url = %request.url, chat = %request.chat_id))]
async fn run_job(state: &AppState, job: Uuid, request: &WakeRequest) -> Result<(), EndpointError> {
    let _permit = state
        .jobs
        .acquire()
        .await
        .map_err(|_| EndpointError::QueueClosed)?;

    tracing::info!(
        "Started job using [{}] -> [{}]",
        state.downloader.get_name(),
        state.sink.get_name()
    );

    let video = state.downloader.download(&request.url).await?;

    state.sink.send_video(&request.chat_id, &video).await?;

    tracing::info!("Finished job");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_web_urls_are_accepted() {
        assert!(validate_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_ok());
        assert!(validate_url("http://youtu.be/dQw4w9WgXcQ").is_ok());

        for url in ["file:///etc/passwd", "ftp://host/file", "not a url", "--exec=rm"] {
            assert!(
                matches!(validate_url(url), Err(EndpointError::InvalidUrl)),
                "{url} should be rejected"
            );
        }
    }
}
