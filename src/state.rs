use crate::util::source::{Downloader, VideoSink};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;

pub struct AppState {
    pub authorization: String,
    pub downloader: Arc<dyn Downloader>,
    pub sink: Arc<dyn VideoSink>,
    pub jobs: Semaphore,
    pub started: Instant,
}

impl AppState {
    pub fn new(
        authorization: impl Into<String>,
        downloader: Arc<dyn Downloader>,
        sink: Arc<dyn VideoSink>,
        max_jobs: usize,
    ) -> Self {
        Self {
            authorization: authorization.into(),
            downloader,
            sink,
            jobs: Semaphore::new(max_jobs.max(1)),
            started: Instant::now(),
        }
    }
}
