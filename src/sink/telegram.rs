use crate::constants::OUTPUT_FILE_NAME;
use crate::models::{ChatTarget, TelegramResponse};
use crate::util::config::TelegramConfig;
use crate::util::errors::TelegramError;
use crate::util::source::{DownloadedVideo, VideoSink};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tokio::time;

const TOO_MANY_REQUESTS: u16 = 429;

/// Uploads finished videos through the Bot API `sendVideo` method.
pub struct Telegram {
    client: Client,
    // carries the bot token, never log it
    endpoint: String,
    caption: String,
    timeout: Duration,
    max_attempts: u32,
}

#[async_trait]
impl VideoSink for Telegram {
    fn get_name(&self) -> &'static str {
        "telegram"
    }

    #[tracing::instrument(skip(self, video), fields(size = video.size()))]
    async fn send_video(
        &self,
        chat: &ChatTarget,
        video: &DownloadedVideo,
    ) -> Result<(), TelegramError> {
        for attempt in 1..=self.max_attempts {
            // the file stream is consumed by each upload, so rebuild the form
            let form = self.form(chat, video).await?;

            let response = self
                .client
                .post(&self.endpoint)
                .multipart(form)
                .timeout(self.timeout)
                .send()
                .await?;

            let status = response.status();
            let body = response.bytes().await?;

            let Ok(parsed) = serde_json::from_slice::<TelegramResponse>(&body) else {
                return Err(TelegramError::InvalidResponse(status.to_string()));
            };

            if parsed.ok {
                tracing::info!("Delivered video to chat {} on attempt {}", chat, attempt);
                return Ok(());
            }

            let code = parsed.error_code.unwrap_or(status.as_u16());
            let retry_after = parsed.parameters.and_then(|params| params.retry_after);

            match (code, retry_after) {
                (TOO_MANY_REQUESTS, Some(seconds)) if attempt < self.max_attempts => {
                    tracing::warn!(
                        "Telegram rate limited attempt {}/{}, retrying in {}s",
                        attempt,
                        self.max_attempts,
                        seconds
                    );
                    time::sleep(Duration::from_secs(seconds)).await;
                }
                (TOO_MANY_REQUESTS, Some(_)) => {
                    return Err(TelegramError::RateLimited(attempt));
                }
                _ => {
                    return Err(TelegramError::Api {
                        code,
                        description: parsed
                            .description
                            .unwrap_or_else(|| status.to_string()),
                    });
                }
            }
        }

        Err(TelegramError::RateLimited(self.max_attempts))
    }
}

impl Telegram {
    pub fn new(config: &TelegramConfig, client: Client) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendVideo",
                config.api_url(),
                config.token.as_deref().unwrap_or_default()
            ),
            caption: config.caption().to_string(),
            timeout: config.timeout(),
            // one initial upload plus the configured retries
            max_attempts: config.max_retries().saturating_add(1),
        }
    }

    async fn form(&self, chat: &ChatTarget, video: &DownloadedVideo) -> Result<Form, TelegramError> {
        let file = tokio::fs::File::open(video.path()).await?;
        let part = Part::stream_with_length(file, video.size())
            .file_name(OUTPUT_FILE_NAME)
            .mime_str("video/mp4")?;

        Ok(Form::new()
            .text("chat_id", chat.to_string())
            .text("caption", self.caption.clone())
            .text("supports_streaming", "true")
            .part("video", part))
    }
}
