//! Repository layer for data access operations.
//!
//! `UserRepository` is the port the service layer talks to; the
//! in-memory and PostgreSQL adapters implement it.

mod memory_user_repo;
mod pg_user_repo;
mod user_repo;

pub use memory_user_repo::InMemoryUserRepository;
pub use pg_user_repo::PgUserRepository;
pub use user_repo::UserRepository;

use std::sync::Arc;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// Cloning is cheap since every repository sits behind an `Arc`.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Creates repositories over an arbitrary user store.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Creates repositories backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryUserRepository::new()))
    }

    /// Creates repositories backed by PostgreSQL.
    ///
    /// # Arguments
    /// * `pool` - The async database connection pool
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self::new(Arc::new(PgUserRepository::new(pool)))
    }
}
