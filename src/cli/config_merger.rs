//! Configuration merger for CLI arguments and config files
//!
//! CLI arguments take precedence over file and environment configuration.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

/// Applies CLI overrides on top of the loaded configuration
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration the way the CLI asks for it.
    ///
    /// `--config` switches to single-file mode and `--env` overrides
    /// `USERS_APP_ENV`; otherwise `ConfigLoader::new` reads the environment.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match cli.config {
            Some(ref path) => ConfigLoader::from_file(path),
            None => ConfigLoader::new()?,
        };

        let loader = match cli.env {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };

        Ok(Self::new(loader.load()?))
    }

    /// Returns a validated copy of the base configuration with CLI
    /// overrides applied.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            // Command-level override beats --verbose/--quiet
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
        }

        config.validate()?;

        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use clap::Parser;
    use std::io::Write;

    fn merge(args: &[&str]) -> Result<Settings, ConfigError> {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(Settings::default()).merge_cli_args(&cli)
    }

    #[test]
    fn test_configuration_merger_new() {
        let base_config = Settings::default();
        let merger = ConfigurationMerger::new(base_config.clone());
        assert_eq!(merger.config(), &base_config);
    }

    #[test]
    fn test_verbose_and_quiet_flags() {
        assert_eq!(merge(&["users-api", "--verbose"]).unwrap().logger.level, "debug");
        assert_eq!(merge(&["users-api", "--quiet"]).unwrap().logger.level, "error");
    }

    #[test]
    fn test_serve_host_and_port() {
        let merged = merge(&["users-api", "serve", "--host", "0.0.0.0", "--port", "8080"]).unwrap();
        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let merged = merge(&["users-api", "--verbose", "serve", "--log-level", "warn"]).unwrap();
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_merge_validates_result() {
        let mut base = Settings::default();
        base.database.backend = StorageBackend::Postgres;

        let cli = Cli::try_parse_from(["users-api", "serve"]).unwrap();
        let result = ConfigurationMerger::new(base).merge_cli_args(&cli);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "database.url"
        ));
    }

    #[test]
    fn test_from_cli_single_file() {
        let _lock = crate::config::ENV_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4321\n\n[database]\nbackend = \"memory\"").unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["users-api", "--config", path, "--env", "test"]).unwrap();

        let merger = ConfigurationMerger::from_cli(&cli).unwrap();
        assert_eq!(merger.config().server.port, 4321);
        assert_eq!(merger.config().database.backend, StorageBackend::Memory);
    }
}
