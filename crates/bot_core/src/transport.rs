//! Outbound chat transport seam
//!
//! The engine talks to the chat backend exclusively through this trait. A real
//! deployment implements it over the Telegram Bot API (or any equivalent);
//! tests implement it with a recording mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keyboard::InlineKeyboardMarkup;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("chat {0} is not reachable")]
    Unreachable(String),

    #[error("message {0} is not found")]
    MessageNotFound(i64),

    #[error("transport rejected the request: {0}")]
    Rejected(String),
}

/// A command exposed in the transport-level command menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub command: String,
    pub description: String,
}

impl Command {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message to a chat, optionally with an inline keyboard.
    async fn reply(
        &self,
        chat_id: &str,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError>;

    /// Replace the inline keyboard of an already rendered message.
    async fn edit_message_reply_markup(
        &self,
        chat_id: &str,
        message_id: i64,
        markup: InlineKeyboardMarkup,
    ) -> Result<(), TransportError>;

    /// Acknowledge a callback query so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError>;

    async fn set_my_commands(&self, commands: &[Command]) -> Result<(), TransportError>;

    async fn delete_my_commands(&self) -> Result<(), TransportError>;
}
