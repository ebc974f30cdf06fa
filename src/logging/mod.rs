pub mod config;
pub mod layers;

pub use config::LoggingConfig;
pub use layers::console::ConsoleOutput;

use crate::logging::layers::{console, file};
use crate::Result;
use anyhow::{anyhow, Context};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Guards that keep logging sinks active for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    config: LoggingConfig,
}

impl LoggingGuard {
    /// Returns the console output configuration used during initialization.
    pub fn console_output(&self) -> ConsoleOutput {
        self.config.console_output
    }

    /// Returns the log file path backing the file sink, if one is enabled.
    pub fn log_file_path(&self) -> Option<&Path> {
        self.config.log_file.as_deref()
    }
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over the configured level. Errors when invoked more than
/// once per process unless tests explicitly reset the guard.
pub fn init(config: LoggingConfig) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;

    type BaseRegistry = Registry;
    type FileSubscriber = file::FileLayerStack<BaseRegistry>;

    let (file_layer, file_guard) = file::file_layer::<BaseRegistry>(config.log_file.as_deref())?;

    let subscriber = tracing_subscriber::registry();
    let subscriber = subscriber.with(file_layer);

    let console_layer = console::console_layer::<FileSubscriber>(config.console_output);
    let subscriber = subscriber.with(console_layer);

    let subscriber = subscriber.with(env_filter);
    subscriber
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        config,
    })
}

#[cfg(test)]
/// Reset the initialization guard so tests can reconfigure logging multiple times.
pub fn reset_for_tests() {
    LOGGER_INITIALIZED.store(false, Ordering::SeqCst);
}
