//! Mapping inbound updates to durable user records

use async_trait::async_trait;

use crate::update::{Update, User};

/// Resolves the durable user behind an update.
///
/// Find-or-create against the user store lives behind this seam, as does any
/// access policy (banned users, invite tokens): returning `None` makes the
/// dispatcher drop the update without touching any session.
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn resolve(&self, update: &Update) -> anyhow::Result<Option<User>>;
}
