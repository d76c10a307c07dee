use crate::middlewares;
use crate::state::AppState;
use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing;
use std::sync::Arc;
use tower::ServiceBuilder;

pub mod global;
pub mod wake;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/wake", routing::post(wake::wake))
        .route_layer(ServiceBuilder::new().layer(from_fn_with_state(
            state.clone(),
            middlewares::auth::authenticate,
        )))
        .route("/health", routing::get(global::health))
        .route("/", routing::get(global::landing))
        .layer(from_fn(middlewares::log::request))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiError, ChatTarget, HealthResponse, WakeResponse};
    use crate::util::errors::{DownloadError, TelegramError};
    use crate::util::source::{DownloadedVideo, Downloader, VideoSink};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    const SECRET: &str = "wake-secret";

    #[derive(Default)]
    struct FakeDownloader {
        timeout: bool,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
        last_path: Mutex<Option<PathBuf>>,
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        fn get_name(&self) -> &'static str {
            "fake-downloader"
        }

        async fn download(&self, _url: &str) -> Result<DownloadedVideo, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.timeout {
                return Err(DownloadError::Timeout);
            }

            let dir = TempDir::new()?;
            let path = dir.path().join("video.mp4");
            std::fs::write(&path, b"fake video")?;
            *self.last_path.lock().unwrap() = Some(path.clone());

            Ok(DownloadedVideo::new(dir, path, 10))
        }
    }

    #[derive(Default)]
    struct FakeSink {
        reject: bool,
        sent: Mutex<Vec<ChatTarget>>,
    }

    #[async_trait]
    impl VideoSink for FakeSink {
        fn get_name(&self) -> &'static str {
            "fake-sink"
        }

        async fn send_video(
            &self,
            chat: &ChatTarget,
            video: &DownloadedVideo,
        ) -> Result<(), TelegramError> {
            assert!(video.path().exists());
            if self.reject {
                return Err(TelegramError::Api {
                    code: 400,
                    description: "Bad Request: chat not found".into(),
                });
            }
            self.sent.lock().unwrap().push(chat.clone());
            Ok(())
        }
    }

    fn app(downloader: Arc<FakeDownloader>, sink: Arc<FakeSink>) -> Router {
        app_with_jobs(downloader, sink, 2)
    }

    fn app_with_jobs(downloader: Arc<FakeDownloader>, sink: Arc<FakeSink>, jobs: usize) -> Router {
        router(Arc::new(AppState::new(SECRET, downloader, sink, jobs)))
    }

    async fn wait_for_calls(downloader: &FakeDownloader, expected: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while downloader.calls.load(Ordering::SeqCst) < expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "download {expected} never started"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn wake_request(auth: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/wake")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn read<T: DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn valid_body() -> String {
        json!({ "url": "https://youtu.be/dQw4w9WgXcQ", "chatId": 123456 }).to_string()
    }

    #[tokio::test]
    async fn wake_downloads_sends_and_cleans_up() {
        let downloader = Arc::new(FakeDownloader::default());
        let sink = Arc::new(FakeSink::default());

        let response = app(downloader.clone(), sink.clone())
            .oneshot(wake_request(Some("Bearer wake-secret"), &valid_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read::<WakeResponse>(response).await, WakeResponse::success());
        assert_eq!(*sink.sent.lock().unwrap(), vec![ChatTarget::Id(123456)]);

        let path = downloader.last_path.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn wrong_or_missing_token_is_unauthorized() {
        for auth in [None, Some("Bearer nope"), Some("wake-secret"), Some("Basic wake-secret")] {
            let downloader = Arc::new(FakeDownloader::default());
            let response = app(downloader.clone(), Arc::default())
                .oneshot(wake_request(auth, &valid_body()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(read::<ApiError>(response).await.error, "Unauthorized");
            assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn missing_parameters_are_rejected() {
        let bodies = [
            json!({ "url": "https://youtu.be/x" }),
            json!({ "chatId": 1 }),
            json!({ "url": "", "chatId": 1 }),
            json!({ "url": "https://youtu.be/x", "chatId": "" }),
            json!({}),
        ];

        for body in bodies {
            let response = app(Arc::default(), Arc::default())
                .oneshot(wake_request(Some("Bearer wake-secret"), &body.to_string()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(read::<ApiError>(response).await.error, "Missing parameters");
        }
    }

    #[tokio::test]
    async fn malformed_json_and_bad_urls_are_rejected() {
        let response = app(Arc::default(), Arc::default())
            .oneshot(wake_request(Some("Bearer wake-secret"), "{ nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read::<ApiError>(response).await.error, "Invalid JSON body");

        let body = json!({ "url": "file:///etc/passwd", "chatId": 1 }).to_string();
        let response = app(Arc::default(), Arc::default())
            .oneshot(wake_request(Some("Bearer wake-secret"), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read::<ApiError>(response).await.error, "Invalid URL");
    }

    #[tokio::test]
    async fn download_timeout_is_a_server_error() {
        let downloader = Arc::new(FakeDownloader {
            timeout: true,
            ..Default::default()
        });
        let sink = Arc::new(FakeSink::default());

        let response = app(downloader, sink.clone())
            .oneshot(wake_request(Some("Bearer wake-secret"), &valid_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read::<ApiError>(response).await.error, "Download timeout");
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_delivery_still_removes_the_file() {
        let downloader = Arc::new(FakeDownloader::default());
        let sink = Arc::new(FakeSink {
            reject: true,
            ..Default::default()
        });

        let response = app(downloader.clone(), sink)
            .oneshot(wake_request(Some("Bearer wake-secret"), &valid_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read::<ApiError>(response).await.error,
            "Telegram API error 400: Bad Request: chat not found"
        );

        let path = downloader.last_path.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn extra_jobs_wait_for_a_free_slot() {
        let gate = Arc::new(Notify::new());
        let downloader = Arc::new(FakeDownloader {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let sink = Arc::new(FakeSink::default());
        let app = app_with_jobs(downloader.clone(), sink.clone(), 1);

        let first = tokio::spawn(
            app.clone()
                .oneshot(wake_request(Some("Bearer wake-secret"), &valid_body())),
        );
        wait_for_calls(&downloader, 1).await;

        let second = tokio::spawn(
            app.clone()
                .oneshot(wake_request(Some("Bearer wake-secret"), &valid_body())),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
        assert!(!second.is_finished());

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(read::<HealthResponse>(response).await.available_jobs, 0);

        gate.notify_one();
        let response = first.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        wait_for_calls(&downloader, 2).await;
        gate.notify_one();
        let response = second.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn health_and_landing_need_no_auth() {
        let app = app(Arc::default(), Arc::default());

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health = read::<HealthResponse>(response).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.available_jobs, 2);

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&text).starts_with("tubewake v"));
    }
}
