use crate::logging::layers::console::ConsoleOutput;
use crate::Result;
use anyhow::anyhow;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

const DEFAULT_LEVEL: &str = "info";

/// Resolved logging configuration after applying CLI options and env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Optional file sink; disabled when unset.
    pub log_file: Option<PathBuf>,
    pub default_level: String,
    pub console_output: ConsoleOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            default_level: DEFAULT_LEVEL.to_string(),
            console_output: ConsoleOutput::default(),
        }
    }
}

impl LoggingConfig {
    /// Load configuration with deterministic precedence: defaults, CLI options, env overrides.
    pub fn load(
        level: Option<&str>,
        log_file: Option<PathBuf>,
        console_output: Option<ConsoleOutput>,
    ) -> Result<Self> {
        let mut config = LoggingConfig::default();
        if let Some(level) = level {
            config.default_level = level.to_string();
        }
        if log_file.is_some() {
            config.log_file = log_file;
        }
        if let Some(console_output) = console_output {
            config.console_output = console_output;
        }
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(path) = env::var("APIPROBE_LOG_FILE") {
            if !path.trim().is_empty() {
                self.log_file = Some(PathBuf::from(path));
            }
        }
        if let Ok(output) = env::var("APIPROBE_LOG_CONSOLE") {
            self.console_output = ConsoleOutput::parse(&output).map_err(|err| anyhow!(err))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        Directive::from_str(&self.default_level).map_err(|_| {
            anyhow!(
                "log level '{}' is not a valid tracing directive",
                self.default_level
            )
        })?;

        if let Some(path) = &self.log_file {
            if path.as_os_str().is_empty() {
                return Err(anyhow!("log file path cannot be empty"));
            }
        }
        Ok(())
    }
}
