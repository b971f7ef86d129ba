//! bot_core - Transport-facing types and traits for the scene engine
//!
//! This crate provides the shapes the engine depends on without binding it to
//! a concrete chat backend:
//! - `update` - inbound updates (messages, callback queries) and users
//! - `keyboard` - inline keyboard markup
//! - `transport` - the outbound `ChatTransport` seam and bot commands
//! - `resolver` - mapping updates to durable user records
//! - `parsers` - shared user-input parsers
//! - `config` - bot-level configuration

pub mod config;
pub mod keyboard;
pub mod parsers;
pub mod resolver;
pub mod transport;
pub mod update;

// Re-export commonly used types
pub use config::BotConfig;
pub use keyboard::{InlineKeyboardButton, InlineKeyboardMarkup};
pub use resolver::UserResolver;
pub use transport::{ChatTransport, Command, TransportError};
pub use update::{
    CallbackQuery, EntityKind, Kind, Message, MessageContent, MessageEntity, Update, UpdateKind,
    User,
};
