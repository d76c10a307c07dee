pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
pub const DEFAULT_CAPTION: &str = "您的視頻已準備好！";
pub const DEFAULT_TELEGRAM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TELEGRAM_RETRIES: u32 = 3;

pub const DEFAULT_YTDLP_BINARY: &str = "yt-dlp";
// Telegram bots cannot upload more than 50 MB
pub const DEFAULT_FORMAT: &str = "best[filesize<50M]";
pub const DEFAULT_YTDLP_TIMEOUT_SECS: u64 = 300;

pub const OUTPUT_FILE_NAME: &str = "video.mp4";
pub const STDERR_TAIL_BYTES: usize = 2048;
