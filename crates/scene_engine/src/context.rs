//! Request-scoped context
//!
//! One `Ctx` is built per inbound update and passed explicitly down the
//! controller -> chain -> handler call path. It replaces ambient
//! (async-local) "current user/session" access: each concurrently processed
//! update owns its own context and nothing leaks across users.

use std::sync::Arc;

use bot_core::{ChatTransport, InlineKeyboardMarkup, Update, UpdateKind, User};

use crate::error::{EngineError, Result};

pub struct Ctx {
    pub update: Update,
    pub user: User,
    pub transport: Arc<dyn ChatTransport>,
}

impl Ctx {
    pub fn new(update: Update, user: User, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            update,
            user,
            transport,
        }
    }

    /// Send a text reply to the user this update came from.
    pub async fn reply(&self, text: &str) -> Result<()> {
        self.transport.reply(&self.user.id, text, None).await?;
        Ok(())
    }

    pub async fn reply_with_keyboard(&self, text: &str, markup: InlineKeyboardMarkup) -> Result<()> {
        self.transport
            .reply(&self.user.id, text, Some(markup))
            .await?;
        Ok(())
    }

    /// Replace the keyboard of the message whose button was pressed.
    pub async fn edit_message_reply_markup(&self, markup: InlineKeyboardMarkup) -> Result<()> {
        let UpdateKind::CallbackQuery(query) = &self.update.kind else {
            return Err(EngineError::Internal(
                "cannot edit reply markup outside a callback query".into(),
            ));
        };
        let message_id = query.message_id.ok_or_else(|| {
            EngineError::Internal("callback query carries no message to edit".into())
        })?;
        self.transport
            .edit_message_reply_markup(&self.user.id, message_id, markup)
            .await?;
        Ok(())
    }

    /// Acknowledge the pressed button. No-op for non-callback updates.
    pub async fn answer_callback(&self) -> Result<()> {
        if let UpdateKind::CallbackQuery(query) = &self.update.kind {
            self.transport.answer_callback(&query.id).await?;
        }
        Ok(())
    }
}
