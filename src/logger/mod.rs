//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output with color control
//! - File output with multiple formats (Full, Compact, JSON)
//! - Runtime log level changes through [`LogLevelHandle`], applied on
//!   SIGHUP by `users-api serve`

pub mod config;
pub mod error;


pub use config::*;
pub use error::LoggerError;

use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt,
    layer::{Layered, SubscriberExt},
    reload,
    util::SubscriberInitExt,
};

type FilterHandle = reload::Handle<EnvFilter, Registry>;
type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Handle for changing the active log filter after initialization.
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: Arc<FilterHandle>,
}

impl LogLevelHandle {
    /// Replace the active filter. Accepts a plain level or any
    /// `EnvFilter` directive string such as `info,users_api=debug`.
    pub fn set_level(&self, level: &str) -> Result<(), LoggerError> {
        let filter = EnvFilter::try_new(level)
            .map_err(|e| LoggerError::filter(format!("Invalid filter '{}': {}", level, e)))?;
        self.inner
            .reload(filter)
            .map_err(|e| LoggerError::filter(e.to_string()))?;
        tracing::info!(level = %level, "Log level updated");
        Ok(())
    }

    /// The active filter rendered as a directive string.
    pub fn current_level(&self) -> Option<String> {
        self.inner.with_current(|filter| filter.to_string()).ok()
    }
}

impl std::fmt::Debug for LogLevelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLevelHandle")
            .field("level", &self.current_level())
            .finish()
    }
}

/// Runs `f` with a handle bound to a thread-local subscriber.
#[cfg(test)]
pub(crate) fn with_test_handle<F, R>(initial_level: &str, f: F) -> R
where
    F: FnOnce(&LogLevelHandle) -> R,
{
    let filter = EnvFilter::try_new(initial_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, reload_handle) = reload::Layer::new(filter);

    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(std::io::sink));

    let handle = LogLevelHandle {
        inner: Arc::new(reload_handle),
    };

    tracing::subscriber::with_default(subscriber, || f(&handle))
}

/// Initialize the global subscriber with the given configuration.
pub fn init_logger(config: LoggerConfig) -> Result<LogLevelHandle, LoggerError> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(build_layers(&config)?)
        .try_init()?;

    Ok(LogLevelHandle {
        inner: Arc::new(handle),
    })
}

fn build_layers(config: &LoggerConfig) -> Result<Vec<BoxedLayer>, LoggerError> {
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    // File layer goes first so the console layer's ANSI setting does not
    // leak escape codes into span fields written to the file.
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }

    if config.console.enabled {
        let use_ansi = config.console.colored && std::io::stdout().is_terminal();
        layers.push(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true)
                .boxed(),
        );
    }

    Ok(layers)
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = Mutex::new(open_log_file(&config.path, config.append)?);
    let layer = fmt::layer().with_ansi(false).with_target(true);

    Ok(match config.format {
        LogFormat::Full => layer.with_writer(writer).boxed(),
        LogFormat::Compact => layer.compact().with_writer(writer).boxed(),
        LogFormat::Json => layer.json().with_writer(writer).boxed(),
    })
}

pub(crate) fn open_log_file(path: &Path, append: bool) -> Result<File, LoggerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    Ok(file)
}
