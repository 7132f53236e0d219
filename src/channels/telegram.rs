//! Telegram Channel
//!
//! Bot API client for a single chat.

use super::{ChannelError, ChannelResult, ReportChannel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default Bot API base URL
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram caption limit
pub const DEFAULT_CAPTION_CAP: usize = 1024;

/// Telegram channel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub bot_token: Option<String>,
    /// Chat that receives reports
    pub chat_id: Option<String>,
    /// Bot API base URL
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
        }
    }
}

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

/// Telegram channel implementation
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    caption_cap: usize,
}

impl TelegramChannel {
    /// Create a new Telegram channel
    pub fn new(client: reqwest::Client, bot_token: String, chat_id: String) -> Self {
        Self {
            client,
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            bot_token,
            chat_id,
            caption_cap: DEFAULT_CAPTION_CAP,
        }
    }

    /// Build from configuration; token and chat are required
    pub fn from_config(client: reqwest::Client, config: &TelegramConfig) -> ChannelResult<Self> {
        let bot_token = config
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChannelError::InvalidConfig("telegram bot token not set".to_string()))?;
        let chat_id = config
            .chat_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ChannelError::InvalidConfig("telegram chat id not set".to_string()))?;
        Ok(Self::new(client, bot_token, chat_id).with_api_base(config.api_base.clone()))
    }

    /// Set a custom API base (e.g., for testing)
    pub fn with_api_base(mut self, url: String) -> Self {
        self.api_base = url;
        self
    }

    pub fn with_caption_cap(mut self, cap: usize) -> Self {
        self.caption_cap = cap;
        self
    }

    async fn call(&self, method: &str, body: Value) -> ChannelResult<Value> {
        let url = format!(
            "{}/bot{}/{method}",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            // reqwest errors include the URL, which carries the token.
            .map_err(|e| ChannelError::ConnectionFailed(e.without_url().to_string()))?;

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| {
                ChannelError::Other(format!("invalid Bot API response: {}", e.without_url()))
            })?;

        if parsed.ok {
            return Ok(parsed.result);
        }

        let description = parsed.description.unwrap_or_default();
        Err(match parsed.error_code {
            Some(401) => ChannelError::AuthenticationFailed(description),
            Some(429) => ChannelError::RateLimited(
                parsed.parameters.and_then(|p| p.retry_after).unwrap_or(1),
            ),
            Some(code) => {
                ChannelError::SendFailed(format!("{method} failed ({code}): {description}"))
            }
            None => ChannelError::SendFailed(format!("{method} failed: {description}")),
        })
    }

    fn message_id(result: &Value) -> ChannelResult<String> {
        result
            .get("message_id")
            .and_then(Value::as_i64)
            .map(|id| id.to_string())
            .ok_or_else(|| ChannelError::Other("response has no message_id".to_string()))
    }

    fn parse_id(id: &str) -> ChannelResult<i64> {
        id.parse()
            .map_err(|_| ChannelError::Other(format!("invalid message id: {id}")))
    }
}

#[async_trait]
impl ReportChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_message(&self, text: &str) -> ChannelResult<String> {
        tracing::debug!(chat_id = %self.chat_id, "Sending Telegram message");
        let result = self
            .call(
                "sendMessage",
                serde_json::json!({
                    "chat_id": self.chat_id,
                    "text": text,
                    "disable_web_page_preview": true,
                }),
            )
            .await?;
        Self::message_id(&result)
    }

    async fn edit_message(&self, id: &str, text: &str) -> ChannelResult<()> {
        let result = self
            .call(
                "editMessageText",
                serde_json::json!({
                    "chat_id": self.chat_id,
                    "message_id": Self::parse_id(id)?,
                    "text": text,
                    "disable_web_page_preview": true,
                }),
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            // Editing to identical text is not a failure.
            Err(ChannelError::SendFailed(msg)) if msg.contains("message is not modified") => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn delete_message(&self, id: &str) -> ChannelResult<()> {
        self.call(
            "deleteMessage",
            serde_json::json!({
                "chat_id": self.chat_id,
                "message_id": Self::parse_id(id)?,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn send_document(&self, url: &str, caption: &str) -> ChannelResult<String> {
        let fits = caption.chars().count() <= self.caption_cap;
        let mut body = serde_json::json!({
            "chat_id": self.chat_id,
            "photo": url,
        });
        if fits {
            body["caption"] = Value::String(caption.to_string());
        }

        let result = self.call("sendPhoto", body).await?;
        let id = Self::message_id(&result)?;

        // The photo is delivered; a lost caption must not make it look failed.
        if !fits {
            if let Err(e) = self.send_message(caption).await {
                tracing::warn!(
                    chat_id = %self.chat_id,
                    error = %e,
                    "Caption message failed after photo"
                );
            }
        }
        Ok(id)
    }
}
