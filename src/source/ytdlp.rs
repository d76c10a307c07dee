use crate::constants::{OUTPUT_FILE_NAME, STDERR_TAIL_BYTES};
use crate::util::config::YtdlpConfig;
use crate::util::errors::DownloadError;
use crate::util::source::{DownloadedVideo, Downloader};
use async_trait::async_trait;
use bytesize::ByteSize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time;

pub struct Ytdlp {
    binary: PathBuf,
    format: String,
    timeout: Duration,
    cookies: Option<PathBuf>,
    extra_args: Vec<String>,
    work_dir: Option<PathBuf>,
}

#[async_trait]
impl Downloader for Ytdlp {
    fn get_name(&self) -> &'static str {
        "yt-dlp"
    }

    #[tracing::instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<DownloadedVideo, DownloadError> {
        let dir = match &self.work_dir {
            Some(parent) => tempfile::Builder::new().prefix("tubewake-").tempdir_in(parent)?,
            None => tempfile::Builder::new().prefix("tubewake-").tempdir()?,
        };
        let output = dir.path().join(OUTPUT_FILE_NAME);

        let mut command = Command::new(&self.binary);
        command
            .args(self.build_args(&output, url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // own group so ffmpeg post-processing can be killed along with yt-dlp
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(DownloadError::Spawn)?;

        // drained concurrently so a chatty yt-dlp never blocks on a full pipe
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buffer = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buffer).await;
            }
            buffer
        });

        let status = match time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                tracing::warn!(
                    "yt-dlp did not finish within {}s, killing it",
                    self.timeout.as_secs()
                );
                kill_process_group(&child);
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(DownloadError::Timeout);
            }
        };

        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            tracing::warn!(
                "yt-dlp exited with {:?}: {}",
                status.code(),
                stderr_tail(&stderr)
            );
            return Err(DownloadError::Failed(status.code()));
        }

        let size = match tokio::fs::metadata(&output).await {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => metadata.len(),
            _ => {
                tracing::warn!(
                    "yt-dlp succeeded but produced no file at {}",
                    output.display()
                );
                return Err(DownloadError::MissingOutput);
            }
        };

        tracing::info!(
            "Downloaded {} [Size: {:.2}]",
            url,
            ByteSize::b(size).display().si()
        );

        Ok(DownloadedVideo::new(dir, output, size))
    }
}

impl Ytdlp {
    pub fn new(config: &YtdlpConfig) -> Self {
        Self {
            binary: config.binary().to_path_buf(),
            format: config.format().to_string(),
            timeout: config.timeout(),
            cookies: config.cookies.clone(),
            extra_args: config.extra_args.clone().unwrap_or_default(),
            work_dir: config.work_dir.clone(),
        }
    }

    pub fn build_args(&self, output: &Path, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-f".into(),
            self.format.as_str().into(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ];

        if let Some(cookies) = self.cookies.as_deref().filter(|path| path.is_file()) {
            args.push("--cookies".into());
            args.push(cookies.as_os_str().to_owned());
        }

        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(url.into());

        args
    }

    /// Returns the installed version, or `None` if the binary cannot be run.
    pub async fn version(&self) -> Option<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn cookies(&self) -> Option<&Path> {
        self.cookies.as_deref()
    }
}

#[cfg(unix)]
fn kill_process_group(child: &tokio::process::Child) {
    let Some(pid) = child.id() else {
        return;
    };

    // a negative pid signals every process in the group
    let result = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
    if result != 0 {
        tracing::debug!(
            "Failed to kill process group {}: {}",
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_: &tokio::process::Child) {}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
