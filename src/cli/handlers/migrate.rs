//! Migrate command handler
//!
//! Applies, previews or reverts the embedded schema migrations.

use crate::config::{Settings, StorageBackend};
use crate::db;
use crate::error::{AppError, AppResult};

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the migrate command
    ///
    /// # Errors
    /// - `dry_run` combined with `rollback`
    /// - the configured backend is not postgres
    /// - `rollback` is zero
    /// - connection or migration failures
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        if dry_run && rollback.is_some() {
            return Err(AppError::Validation {
                field: "rollback_steps".to_string(),
                reason: "--dry-run only reports pending migrations and cannot preview a rollback"
                    .to_string(),
            });
        }
        self.ensure_postgres()?;
        self.config.database.validate()?;

        let url = self.config.database.url.as_str();

        if dry_run {
            let pending = db::pending_migration_count(url).await?;
            if pending == 0 {
                println!("✓ No pending migrations - database is up to date");
            } else {
                println!("Found {} pending migration(s)", pending);
                println!("Run without --dry-run to apply them");
            }
            return Ok(());
        }

        match rollback {
            Some(0) => Err(AppError::Validation {
                field: "rollback_steps".to_string(),
                reason: "Number of rollback steps must be greater than 0".to_string(),
            }),
            Some(steps) => {
                let reverted = db::revert_migrations(url, steps).await?;
                Self::report("Reverted", &reverted);
                Ok(())
            }
            None => {
                let applied = db::run_pending_migrations(url).await?;
                if applied.is_empty() {
                    println!("✓ No migrations to apply - database is already up to date");
                } else {
                    Self::report("Applied", &applied);
                }
                Ok(())
            }
        }
    }

    fn ensure_postgres(&self) -> AppResult<()> {
        if self.config.database.backend != StorageBackend::Postgres {
            return Err(AppError::Validation {
                field: "database.backend".to_string(),
                reason: format!(
                    "Migrations need the postgres backend, configured backend is '{}'",
                    self.config.database.backend
                ),
            });
        }
        Ok(())
    }

    fn report(verb: &str, versions: &[String]) {
        println!("✓ {} {} migration(s):", verb, versions.len());
        for version in versions {
            println!("  - {}", version);
        }
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
