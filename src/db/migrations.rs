//! Embedded schema migrations.
//!
//! `diesel_migrations` only drives synchronous connections, so every
//! operation here runs on the blocking thread pool.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::error::{AppError, AppResult};

/// Migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Returns the number of migrations not yet applied.
pub async fn pending_migration_count(database_url: &str) -> AppResult<usize> {
    with_connection(database_url, "check pending migrations", |conn| {
        conn.pending_migrations(MIGRATIONS)
            .map(|pending| pending.len())
    })
    .await
}

/// Applies every pending migration and returns the applied versions.
pub async fn run_pending_migrations(database_url: &str) -> AppResult<Vec<String>> {
    with_connection(database_url, "run pending migrations", |conn| {
        conn.run_pending_migrations(MIGRATIONS)
            .map(|applied| applied.iter().map(ToString::to_string).collect())
    })
    .await
}

/// Reverts the last `steps` migrations and returns the reverted versions.
pub async fn revert_migrations(database_url: &str, steps: u32) -> AppResult<Vec<String>> {
    with_connection(database_url, "revert migrations", move |conn| {
        let mut reverted = Vec::new();
        for _ in 0..steps {
            let version = conn.revert_last_migration(MIGRATIONS)?;
            reverted.push(version.to_string());
        }
        Ok(reverted)
    })
    .await
}

type MigrationResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

async fn with_connection<T, F>(database_url: &str, operation: &'static str, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> MigrationResult<T> + Send + 'static,
{
    let database_url = database_url.to_string();

    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url).map_err(|e| AppError::Database {
            operation: format!("establish connection to {}", operation),
            source: anyhow::anyhow!("Connection error: {}", e),
        })?;

        f(&mut conn).map_err(|e| AppError::Database {
            operation: operation.to_string(),
            source: anyhow::anyhow!("Migration error: {}", e),
        })
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })?
}
