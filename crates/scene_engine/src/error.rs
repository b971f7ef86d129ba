//! Engine error taxonomy
//!
//! Four classes, mirroring how they are contained:
//! - `InvalidCallback` - user-input errors, reported back to the user;
//! - `Config` - scene/step configuration errors, fatal at registration time;
//! - `Internal` - internal-consistency errors, surfaced to the operator;
//! - the rest wrap collaborator failures (session store, transport, domain
//!   code running inside handlers).

use thiserror::Error;

use bot_core::TransportError;
use scene_session::SessionError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid callback payload: {0}")]
    InvalidCallback(String),

    #[error("scene configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// User-input errors are reported to the user and never corrupt state.
    pub fn is_user_input(&self) -> bool {
        matches!(self, Self::InvalidCallback(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
