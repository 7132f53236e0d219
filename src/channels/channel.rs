//! Channel Trait
//!
//! Interface the pipeline uses to talk to the user: one progress message
//! that is edited in place, and a final artifact.

use async_trait::async_trait;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur in channel operations
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rate limited: retry after {0}s")]
    RateLimited(u64),

    #[error("Channel error: {0}")]
    Other(String),
}

/// Messaging collaborator for one conversation.
#[async_trait]
pub trait ReportChannel: Send + Sync {
    /// Channel name for logs
    fn name(&self) -> &str;

    /// Send a text message, returning its id
    async fn send_message(&self, text: &str) -> ChannelResult<String>;

    /// Replace the text of a message sent earlier
    async fn edit_message(&self, id: &str, text: &str) -> ChannelResult<()>;

    /// Remove a message sent earlier
    async fn delete_message(&self, id: &str) -> ChannelResult<()>;

    /// Send a hosted document (the rendered image) with a caption
    async fn send_document(&self, url: &str, caption: &str) -> ChannelResult<String>;
}
