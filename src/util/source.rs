use super::errors::{DownloadError, TelegramError};
use crate::models::ChatTarget;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fetched video on local disk. The backing directory is removed when this
/// value is dropped, whatever happens to the request afterwards.
#[derive(Debug)]
pub struct DownloadedVideo {
    path: PathBuf,
    size: u64,
    _dir: TempDir,
}

impl DownloadedVideo {
    pub fn new(dir: TempDir, path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            _dir: dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[async_trait]
pub trait Downloader: Send + Sync + 'static {
    fn get_name(&self) -> &'static str;
    async fn download(&self, url: &str) -> Result<DownloadedVideo, DownloadError>;
}

#[async_trait]
pub trait VideoSink: Send + Sync + 'static {
    fn get_name(&self) -> &'static str;
    async fn send_video(
        &self,
        chat: &ChatTarget,
        video: &DownloadedVideo,
    ) -> Result<(), TelegramError>;
}
