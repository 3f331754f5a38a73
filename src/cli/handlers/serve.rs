//! Serve command handler
//!
//! Validates configuration for `--dry-run`, otherwise runs the HTTP server.

use crate::config::Settings;
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Runs the server until shutdown, or only validates with `dry_run`.
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            return self.validate_only();
        }

        Server::new(self.config).run().await
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Storage backend: {}", self.config.database.backend);
        println!("✓ Log level: {}", self.config.logger.level);
        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
