use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Where a finished video is delivered. Telegram accepts either a numeric
/// chat id or a public `@username`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatTarget {
    Id(i64),
    Username(String),
}

impl ChatTarget {
    /// Numeric strings are treated as ids so `"-100123"` and `-100123` match.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(ChatTarget::Id),
            Value::String(string) => {
                let trimmed = string.trim();
                if trimmed.is_empty() {
                    None
                } else if let Ok(id) = trimmed.parse::<i64>() {
                    Some(ChatTarget::Id(id))
                } else {
                    Some(ChatTarget::Username(trimmed.to_string()))
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatTarget::Id(id) => write!(f, "{id}"),
            ChatTarget::Username(name) => f.write_str(name),
        }
    }
}

/// Raw body of `POST /wake`. Fields stay loose so a missing value can be
/// reported as missing instead of as a malformed body.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WakeBody {
    pub url: Option<Value>,
    pub chat_id: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WakeRequest {
    pub url: String,
    pub chat_id: ChatTarget,
}

impl WakeBody {
    pub fn into_request(self) -> Option<WakeRequest> {
        let url = match self.url? {
            Value::String(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => return None,
        };
        let chat_id = ChatTarget::parse(&self.chat_id?)?;

        Some(WakeRequest { url, chat_id })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WakeResponse {
    pub status: String,
}

impl WakeResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    pub available_jobs: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

// Telegram Bot API types: reduced to what we actually need

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TelegramResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TelegramResponse {
    pub ok: bool,
    pub error_code: Option<u16>,
    pub description: Option<String>,
    pub parameters: Option<TelegramResponseParameters>,
}
