//! Session storage trait and implementations

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::fs;

use crate::error::Result;
use crate::session::{Payload, Session};

/// Fields applied on top of the existing (or fresh) session by
/// [`SessionStore::create_or_update`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub scene: Option<String>,
    pub step: Option<String>,
    pub step_entered_at: Option<DateTime<Utc>>,
    pub payload: Option<Payload>,
}

/// Durable session storage, keyed by the opaque user id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<Session>>;

    /// Upsert: create the session if missing, then apply the patch.
    async fn create_or_update(&self, user_id: &str, patch: SessionPatch) -> Result<Session>;

    /// Persist the session in place and return the stored row.
    async fn save(&self, session: &Session) -> Result<Session>;
}

fn apply_patch(session: &mut Session, patch: SessionPatch) {
    if patch.scene.is_some() {
        session.scene = patch.scene;
    }
    if patch.step.is_some() {
        session.step = patch.step;
    }
    if patch.step_entered_at.is_some() {
        session.step_entered_at = patch.step_entered_at;
    }
    if patch.payload.is_some() {
        session.payload = patch.payload;
    }
}

/// File-based session storage, one JSON file per user.
#[derive(Clone)]
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn session_path(&self, user_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", user_id))
    }

    async fn write(&self, session: &Session) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        let contents = serde_json::to_string_pretty(session)?;
        fs::write(self.session_path(&session.user_id), contents).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn find(&self, user_id: &str) -> Result<Option<Session>> {
        let path = self.session_path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn create_or_update(&self, user_id: &str, patch: SessionPatch) -> Result<Session> {
        let mut session = self
            .find(user_id)
            .await?
            .unwrap_or_else(|| Session::new(user_id));
        apply_patch(&mut session, patch);
        session.updated_at = Utc::now();
        self.write(&session).await?;
        Ok(session)
    }

    async fn save(&self, session: &Session) -> Result<Session> {
        let mut stored = session.clone();
        stored.updated_at = Utc::now();
        self.write(&stored).await?;
        Ok(stored)
    }
}

/// In-memory session storage for tests and embedded deployments.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find(&self, user_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(user_id).map(|entry| entry.clone()))
    }

    async fn create_or_update(&self, user_id: &str, patch: SessionPatch) -> Result<Session> {
        let mut entry = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Session::new(user_id));
        apply_patch(&mut entry, patch);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn save(&self, session: &Session) -> Result<Session> {
        let mut stored = session.clone();
        stored.updated_at = Utc::now();
        self.sessions
            .insert(stored.user_id.clone(), stored.clone());
        Ok(stored)
    }
}
