pub mod loader;

pub use loader::ConfigLoader;

use crate::core::types::Precedence;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default file name of the global run configuration.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Global run configuration loaded from config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Base for `relative-url` targets
    #[serde(rename = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum in-flight requests; 0 picks the available parallelism
    pub concurrent: usize,

    /// Per-attempt request timeout in seconds
    pub timeout: u64,

    /// Total attempts for requests that time out
    pub retries: u32,

    /// Trim response bodies before comparing
    pub trim: bool,

    /// Stop admitting new tests after the first failure
    #[serde(rename = "stop-on-fail")]
    pub stop_on_fail: bool,

    /// Which namespace wins when a transform name exists in both
    #[serde(rename = "extension-precedence")]
    pub extension_precedence: Precedence,

    /// Directory holding test documents
    #[serde(rename = "tests-dir")]
    pub tests_dir: PathBuf,

    /// Directory holding extension manifests
    #[serde(rename = "extensions-dir")]
    pub extensions_dir: PathBuf,

    /// Pause between timed-out attempts, in milliseconds
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

// Default functions
fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    1
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("test/configs")
}

fn default_extensions_dir() -> PathBuf {
    PathBuf::from("test/extensions")
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            base_url: None,
            concurrent: 0,
            timeout: default_timeout(),
            retries: default_retries(),
            trim: true,
            stop_on_fail: false,
            extension_precedence: Precedence::default(),
            tests_dir: default_tests_dir(),
            extensions_dir: default_extensions_dir(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}
