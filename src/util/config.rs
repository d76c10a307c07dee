use crate::constants::{
    DEFAULT_ADDRESS, DEFAULT_CAPTION, DEFAULT_FORMAT, DEFAULT_PORT, DEFAULT_TELEGRAM_API,
    DEFAULT_TELEGRAM_RETRIES, DEFAULT_TELEGRAM_TIMEOUT_SECS, DEFAULT_YTDLP_BINARY,
    DEFAULT_YTDLP_TIMEOUT_SECS,
};
use crate::util::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub caption: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl TelegramConfig {
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_TELEGRAM_API)
            .trim_end_matches('/')
    }

    pub fn caption(&self) -> &str {
        self.caption.as_deref().unwrap_or(DEFAULT_CAPTION)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TELEGRAM_TIMEOUT_SECS))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_TELEGRAM_RETRIES)
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YtdlpConfig {
    pub binary: Option<PathBuf>,
    pub format: Option<String>,
    pub timeout_secs: Option<u64>,
    pub cookies: Option<PathBuf>,
    pub extra_args: Option<Vec<String>>,
    pub work_dir: Option<PathBuf>,
}

impl YtdlpConfig {
    pub fn binary(&self) -> &Path {
        self.binary
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_YTDLP_BINARY))
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_FORMAT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_YTDLP_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub port: Option<u16>,
    pub address: Option<String>,
    pub authorization: Option<String>,
    pub max_concurrent_jobs: Option<usize>,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub ytdlp: YtdlpConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Reads `./config.json` when present, then applies the process environment.
    pub fn new() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load(Path::new("./config.json"), &vars)
    }

    pub fn load(path: &Path, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str::<Config>(&raw)?
        } else {
            Config::default()
        };

        config.apply_env(vars)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        let get = |key: &str| vars.get(key).filter(|value| !value.is_empty()).cloned();

        if let Some(token) = get("TELEGRAM_TOKEN") {
            self.telegram.token = Some(token);
        }
        if let Some(secret) = get("KOYEB_SECRET") {
            self.authorization = Some(secret);
        }
        if let Some(port) = get("PORT") {
            self.port = Some(
                port.parse()
                    .map_err(|_| ConfigError::Invalid("PORT", port.clone()))?,
            );
        }
        if let Some(address) = get("ADDRESS") {
            self.address = Some(address);
        }
        if let Some(cookies) = get("YTDLP_COOKIES") {
            self.ytdlp.cookies = Some(PathBuf::from(cookies));
        }
        if let Some(binary) = get("YTDLP_BINARY") {
            self.ytdlp.binary = Some(PathBuf::from(binary));
        }
        if let Some(work_dir) = get("YTDLP_WORK_DIR") {
            self.ytdlp.work_dir = Some(PathBuf::from(work_dir));
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging = Some(LoggingConfig { level });
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.authorization.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Missing("KOYEB_SECRET"));
        }
        if self.telegram.token.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Missing("TELEGRAM_TOKEN"));
        }
        if self.max_concurrent_jobs == Some(0) {
            return Err(ConfigError::Invalid("maxConcurrentJobs", "0".into()));
        }
        Ok(())
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or(DEFAULT_ADDRESS)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn authorization(&self) -> &str {
        self.authorization.as_deref().unwrap_or_default()
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs.unwrap_or(1)
    }

    pub fn log_level(&self) -> tracing::Level {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.parse().ok())
            .unwrap_or(tracing::Level::INFO)
    }
}
