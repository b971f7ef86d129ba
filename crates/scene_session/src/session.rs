//! Session data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Working data a scene accumulates across its steps.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Durable per-user scene state.
///
/// Invariant: `scene`, `step` and `step_entered_at` are either all `None`
/// (no scene active) or all `Some`; `payload` is `Some` only while a scene is
/// active. The record is never deleted, only upserted in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub scene: Option<String>,
    pub step: Option<String>,
    pub step_entered_at: Option<DateTime<Utc>>,
    pub payload: Option<Payload>,
    /// Last time the session was persisted.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an idle session for a user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            scene: None,
            step: None,
            step_entered_at: None,
            payload: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_in_scene(&self) -> bool {
        self.scene.is_some() && self.step.is_some()
    }

    /// Reset to the idle state. Called on scene completion, scene exit, and
    /// fatal entry errors.
    pub fn clear_scene(&mut self) {
        self.scene = None;
        self.step = None;
        self.step_entered_at = None;
        self.payload = None;
    }

    pub fn set_step(
        &mut self,
        scene: impl Into<String>,
        step: impl Into<String>,
        entered_at: DateTime<Utc>,
        payload: Payload,
    ) {
        self.scene = Some(scene.into());
        self.step = Some(step.into());
        self.step_entered_at = Some(entered_at);
        self.payload = Some(payload);
    }
}
