//! Inbound update model
//!
//! The engine only ever sees these shapes; how they are produced from a real
//! chat backend is the transport adapter's business.

use serde::{Deserialize, Serialize};

/// A chat end-user as the durable user store knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque per-end-user identifier (also used as the chat id for replies).
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            first_name: None,
        }
    }
}

/// One inbound update from the chat transport.
#[derive(Debug, Clone)]
pub struct Update {
    /// This bot's username, when the transport knows it. Used to decide
    /// whether `/cmd@other_bot` is addressed to us.
    pub me: Option<String>,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone)]
pub enum UpdateKind {
    Message(Message),
    CallbackQuery(CallbackQuery),
}

#[derive(Debug, Clone)]
pub struct Message {
    pub from: User,
    pub content: MessageContent,
}

#[derive(Debug, Clone)]
pub enum MessageContent {
    Text {
        text: String,
        entities: Vec<MessageEntity>,
    },
    Photo,
    Document,
    Other,
}

/// Data-free tag for [`MessageContent`], used by update filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    Photo,
    Document,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    BotCommand,
    Other,
}

/// A button press against a previously rendered inline keyboard.
#[derive(Debug, Clone)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub data: Option<String>,
    /// The message whose keyboard was pressed, when the transport reports it.
    pub message_id: Option<i64>,
}

impl Message {
    pub fn kind(&self) -> Kind {
        match self.content {
            MessageContent::Text { .. } => Kind::Text,
            MessageContent::Photo => Kind::Photo,
            MessageContent::Document => Kind::Document,
            MessageContent::Other => Kind::Other,
        }
    }
}

impl Update {
    /// Plain text message without command entities.
    pub fn text_message(from: User, text: impl Into<String>) -> Self {
        Self {
            me: None,
            kind: UpdateKind::Message(Message {
                from,
                content: MessageContent::Text {
                    text: text.into(),
                    entities: Vec::new(),
                },
            }),
        }
    }

    /// Text message whose first token is a bot command, e.g. `/cancel` or
    /// `/start@some_bot extra args`.
    pub fn command_message(from: User, text: impl Into<String>) -> Self {
        let text = text.into();
        let length = text.split_whitespace().next().map_or(0, str::len);
        Self {
            me: None,
            kind: UpdateKind::Message(Message {
                from,
                content: MessageContent::Text {
                    text,
                    entities: vec![MessageEntity {
                        kind: EntityKind::BotCommand,
                        offset: 0,
                        length,
                    }],
                },
            }),
        }
    }

    pub fn callback(from: User, id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            me: None,
            kind: UpdateKind::CallbackQuery(CallbackQuery {
                id: id.into(),
                from,
                data: Some(data.into()),
                message_id: Some(1),
            }),
        }
    }

    pub fn with_me(mut self, me: impl Into<String>) -> Self {
        self.me = Some(me.into());
        self
    }

    pub fn from_user(&self) -> Option<&User> {
        match &self.kind {
            UpdateKind::Message(message) => Some(&message.from),
            UpdateKind::CallbackQuery(query) => Some(&query.from),
        }
    }

    /// Text content, if this update is a text message.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::Message(Message {
                content: MessageContent::Text { text, .. },
                ..
            }) => Some(text),
            _ => None,
        }
    }

    /// Raw callback data, if this update is a data callback.
    pub fn callback_data(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::CallbackQuery(query) => query.data.as_deref(),
            _ => None,
        }
    }

    pub fn callback_query(&self) -> Option<&CallbackQuery> {
        match &self.kind {
            UpdateKind::CallbackQuery(query) => Some(query),
            _ => None,
        }
    }
}
