//! Messaging channels the pipeline reports through.

mod channel;
pub mod console;
pub mod telegram;

pub use channel::{ChannelError, ChannelResult, ReportChannel};
pub use console::ConsoleChannel;
pub use telegram::{TelegramChannel, TelegramConfig, DEFAULT_CAPTION_CAP, DEFAULT_TELEGRAM_API_BASE};
