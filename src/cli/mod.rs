//! CLI module for users-api
//!
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files)
//! - Command handlers for serve and migrate

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use anyhow::Context;

use crate::config::Settings;
use crate::logger::{LogLevelHandle, init_logger};

/// Load the file/env configuration and apply CLI overrides.
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_cli(cli).context("Failed to load configuration")?;

    merger
        .merge_cli_args(cli)
        .context("Invalid configuration after applying command line overrides")
}

/// Install the global subscriber described by `settings.logger`.
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<LogLevelHandle> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .context("Invalid logger configuration")?;

    init_logger(logger_config).context("Failed to initialize logger")
}

/// Re-read the configuration and apply its `logger.level`.
///
/// Returns the level now in effect.
pub fn reload_log_level(cli: &Cli, handle: &LogLevelHandle) -> anyhow::Result<String> {
    let settings = load_and_merge_config(cli)?;
    handle
        .set_level(&settings.logger.level)
        .context("Failed to apply log level")?;
    Ok(settings.logger.level)
}

/// Reapply `logger.level` from configuration whenever the process gets SIGHUP.
#[cfg(unix)]
pub fn watch_log_level(cli: Cli, handle: LogLevelHandle) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            if let Err(e) = reload_log_level(&cli, &handle) {
                tracing::warn!(error = %e, "Log level reload failed, keeping the current level");
            }
        }
    });
    Ok(())
}
