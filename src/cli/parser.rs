//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// HTTP service for creating and fetching users
#[derive(Parser, Debug, Clone)]
#[command(name = "users-api")]
#[command(about = "HTTP service for creating and fetching users")]
#[command(long_about = "
users-api serves a small JSON API over HTTP:

    POST /api/users          store a user
    GET  /api/users/{id}     fetch a user

Users live in memory or in PostgreSQL, selected by `database.backend`.

EXAMPLES:
    # Start the server with default configuration
    users-api serve

    # Start server on custom host and port
    users-api serve --host 0.0.0.0 --port 8080

    # Use a single configuration file
    users-api --config /etc/users-api/production.toml serve

    # Check configuration without starting the server
    users-api serve --dry-run

    # Apply pending migrations (postgres backend)
    users-api migrate

    # Roll back the last migration
    users-api migrate --rollback 1
")]
#[command(version = crate::pkg_version(), long_version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered `config/` directory.
    /// `USERS_*` environment variables still apply on top of it.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection (`USERS_APP_ENV`)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Whether this invocation ends up running the HTTP server.
    pub fn runs_server(&self) -> bool {
        matches!(
            self.command,
            None | Some(Commands::Serve { dry_run: false, .. })
        )
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Examples:
    ///   users-api serve                            # Start with defaults
    ///   users-api serve --host 0.0.0.0 --port 80  # Bind to all interfaces on port 80
    ///   users-api serve --dry-run                  # Validate config without starting
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override, takes precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations (postgres backend)
    ///
    /// Examples:
    ///   users-api migrate                    # Apply all pending migrations
    ///   users-api migrate --dry-run          # Count pending migrations
    ///   users-api migrate --rollback 1       # Revert the most recent migration
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to roll back (1-100)
        #[arg(long, value_name = "STEPS", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["users-api", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["users-api"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from([
            "users-api",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--log-level",
            "debug",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Serve {
                host,
                port,
                log_level,
                dry_run,
            }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
                assert_eq!(log_level, Some(LogLevel::Debug));
                assert!(!dry_run);
            }
            other => panic!("Expected Serve command, got {:?}", other),
        }
    }

    #[test]
    fn test_migrate_command() {
        let cli = Cli::try_parse_from(["users-api", "migrate", "--rollback", "2"]).unwrap();
        match cli.command {
            Some(Commands::Migrate { dry_run, rollback }) => {
                assert!(!dry_run);
                assert_eq!(rollback, Some(2));
            }
            other => panic!("Expected Migrate command, got {:?}", other),
        }
    }

    #[test]
    fn test_runs_server() {
        let runs = |args: &[&str]| Cli::try_parse_from(args).unwrap().runs_server();
        assert!(runs(&["users-api"]));
        assert!(runs(&["users-api", "serve"]));
        assert!(!runs(&["users-api", "serve", "--dry-run"]));
        assert!(!runs(&["users-api", "migrate"]));
    }

    #[test]
    fn test_migrate_dry_run_conflicts_with_rollback() {
        let err = Cli::try_parse_from(["users-api", "migrate", "--dry-run", "--rollback", "1"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["users-api", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_env_alias() {
        let cli = Cli::try_parse_from(["users-api", "--env", "prod"]).unwrap();
        assert_eq!(cli.env, Some(Environment::Production));
        assert_eq!(
            crate::config::Environment::from(Environment::Production),
            crate::config::Environment::Production
        );
    }
}
