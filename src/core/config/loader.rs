#![allow(clippy::result_large_err)]

use super::RunConfig;
use crate::core::error::AppError;
use crate::core::executor::RunSettings;
use crate::core::types::{ErrorCategory, Precedence};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from `path`, then apply environment overrides and validate.
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<RunConfig, AppError> {
        let mut config = Self::load_from_file(path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<RunConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
            .with_code("CFG-001")
        })?;

        if content.trim().is_empty() {
            return Ok(Some(RunConfig::default()));
        }

        let config: RunConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
            .with_code("CFG-002")
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    /// Environment variables take precedence over config file values
    pub fn apply_env_overrides(config: &mut RunConfig) {
        if let Ok(base_url) = env::var("APIPROBE_BASE_URL") {
            config.base_url = Some(base_url);
        }

        if let Some(concurrent) = parse_env("APIPROBE_CONCURRENT") {
            config.concurrent = concurrent;
        }

        if let Some(timeout) = parse_env("APIPROBE_TIMEOUT") {
            config.timeout = timeout;
        }

        if let Some(retries) = parse_env("APIPROBE_RETRIES") {
            config.retries = retries;
        }

        if let Some(stop_on_fail) = parse_env("APIPROBE_STOP_ON_FAIL") {
            config.stop_on_fail = stop_on_fail;
        }

        if let Some(precedence) = parse_env::<Precedence>("APIPROBE_EXTENSION_PRECEDENCE") {
            config.extension_precedence = precedence;
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "APIPROBE_BASE_URL - Override baseUrl",
            "APIPROBE_CONCURRENT - Override concurrent (0 = auto-detect)",
            "APIPROBE_TIMEOUT - Override timeout in seconds (default: 30)",
            "APIPROBE_RETRIES - Override retries (default: 1)",
            "APIPROBE_STOP_ON_FAIL - Override stop-on-fail (true/false)",
            "APIPROBE_EXTENSION_PRECEDENCE - Override extension-precedence (core/non-core)",
        ]
    }

    /// Validate configuration values
    pub fn validate_config(config: &RunConfig) -> Result<(), AppError> {
        if let Some(base_url) = &config.base_url {
            Self::parse_base_url(base_url)?;
        }

        if config.timeout == 0 {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "timeout must be greater than zero".to_string(),
            )
            .with_code("CFG-004"));
        }

        Ok(())
    }

    /// Build the per-run request policy from a validated config.
    pub fn run_settings(config: &RunConfig) -> Result<RunSettings, AppError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(Self::parse_base_url)
            .transpose()?;
        Ok(RunSettings {
            base_url,
            timeout: Duration::from_secs(config.timeout),
            retries: config.retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            trim: config.trim,
        })
    }

    fn parse_base_url(value: &str) -> Result<Url, AppError> {
        let invalid = |reason: String| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("baseUrl '{}' is not an absolute URL: {}", value, reason),
            )
            .with_code("CFG-003")
            .with_context("baseUrl", value)
        };
        let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".to_string()));
        }
        Ok(url)
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring {}: '{}' is not a valid value", name, raw);
            None
        }
    }
}
