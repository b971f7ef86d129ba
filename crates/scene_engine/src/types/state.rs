//! Transient per-invocation state
//!
//! Derived from the current [`scene_session::Session`] plus the matched
//! scene/step definitions on every update; never persisted as such. The
//! payload is a working copy written back to the session at well-defined
//! checkpoints.

use chrono::{DateTime, Utc};

use bot_core::User;

use crate::fingerprint::fingerprint;

pub use scene_session::Payload;

/// State visible to `before`-scene middlewares: no step is active yet.
#[derive(Debug, Clone)]
pub struct EntryState {
    pub user: User,
}

/// State visible while a step is active.
#[derive(Debug, Clone)]
pub struct StepState {
    pub scene: String,
    pub step: String,
    pub step_index: usize,
    pub entered_at: DateTime<Utc>,
    pub user: User,
    pub payload: Payload,
}

impl StepState {
    /// The fingerprint buttons rendered by this step instance carry.
    pub fn fingerprint(&self) -> i32 {
        fingerprint(&self.scene, &self.step, self.entered_at)
    }
}

/// State visible to `after`-scene middlewares on completion or exit.
#[derive(Debug, Clone)]
pub struct ExitState {
    pub user: User,
    pub payload: Payload,
}
