//! # Scene Session
//!
//! The durable per-user record of which scene/step is active and its
//! accumulated payload, plus the storage contract the engine persists it
//! through. Any row or key-value store can sit behind [`SessionStore`]; a
//! file-backed and an in-memory implementation ship here.

pub mod error;
pub mod session;
pub mod store;

// Re-exports
pub use error::SessionError;
pub use session::{Payload, Session};
pub use store::{FileSessionStore, MemorySessionStore, SessionPatch, SessionStore};
