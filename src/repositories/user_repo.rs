//! Persistence port for users.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{NewUser, User, UserId};

/// Storage contract the user service depends on.
///
/// Implementations own their synchronisation; callers share them
/// behind an `Arc` and never hold mutable state of their own.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    ///
    /// Returns `Ok(None)` when no user is stored under `id`.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Insert or replace a user record.
    ///
    /// Without an explicit id a fresh, positive one is assigned; once the
    /// id space is used up this fails with `AppError::Database`. With an
    /// explicit id, including zero or negative ones, the stored record is
    /// replaced, keeping its creation time. Explicit ids never move fresh
    /// assignment backwards.
    async fn save(&self, user: NewUser) -> AppResult<User>;

    /// Verify the backing store is reachable.
    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}
