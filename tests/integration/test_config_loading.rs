use apiprobe::core::config::{ConfigLoader, RunConfig};
use apiprobe::core::types::Precedence;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn clear_apiprobe_env() {
    for v in &[
        "APIPROBE_BASE_URL",
        "APIPROBE_CONCURRENT",
        "APIPROBE_TIMEOUT",
        "APIPROBE_RETRIES",
        "APIPROBE_STOP_ON_FAIL",
        "APIPROBE_EXTENSION_PRECEDENCE",
    ] {
        env::remove_var(v);
    }
}

/// Test integration of config loading with environment variables
#[test]
#[serial]
fn test_config_loading_integration() {
    clear_apiprobe_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");

    let config_content = r#"
baseUrl: https://api.example.com/v2/
concurrent: 8
timeout: 12
retries: 3
trim: false
stop-on-fail: true
extension-precedence: core
tests-dir: suites/smoke
extensions-dir: suites/extensions
retry-backoff-ms: 250
"#;
    fs::write(&path, config_content).unwrap();

    let config = ConfigLoader::load(&path).unwrap();
    assert_eq!(
        config.base_url.as_deref(),
        Some("https://api.example.com/v2/")
    );
    assert_eq!(config.concurrent, 8);
    assert_eq!(config.timeout, 12);
    assert_eq!(config.retries, 3);
    assert!(!config.trim);
    assert!(config.stop_on_fail);
    assert_eq!(config.extension_precedence, Precedence::FavorBuiltin);
    assert_eq!(config.tests_dir, PathBuf::from("suites/smoke"));
    assert_eq!(config.extensions_dir, PathBuf::from("suites/extensions"));

    let settings = ConfigLoader::run_settings(&config).unwrap();
    assert_eq!(settings.timeout, Duration::from_secs(12));
    assert_eq!(settings.retry_backoff, Duration::from_millis(250));
    assert_eq!(settings.attempts(), 3);
    assert!(!settings.trim);
}

#[test]
#[serial]
fn test_defaults_when_file_is_missing() {
    clear_apiprobe_env();
    let temp_dir = TempDir::new().unwrap();
    let config = ConfigLoader::load(&temp_dir.path().join("absent.yaml")).unwrap();

    let defaults = RunConfig::default();
    assert_eq!(config.base_url, None);
    assert_eq!(config.concurrent, 0);
    assert_eq!(config.timeout, defaults.timeout);
    assert_eq!(config.retries, 1);
    assert!(config.trim);
    assert!(!config.stop_on_fail);
    assert_eq!(config.extension_precedence, Precedence::FavorUser);
    assert_eq!(config.tests_dir, PathBuf::from("test/configs"));
}

#[test]
#[serial]
fn test_empty_file_yields_defaults() {
    clear_apiprobe_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "   \n").unwrap();
    let config = ConfigLoader::load(&path).unwrap();
    assert_eq!(config.timeout, 30);
}

#[test]
#[serial]
fn test_environment_overrides_every_supported_field() {
    clear_apiprobe_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "baseUrl: https://file.test/\nconcurrent: 2\n").unwrap();

    env::set_var("APIPROBE_BASE_URL", "https://env.test/");
    env::set_var("APIPROBE_CONCURRENT", "16");
    env::set_var("APIPROBE_TIMEOUT", "3");
    env::set_var("APIPROBE_RETRIES", "4");
    env::set_var("APIPROBE_STOP_ON_FAIL", "true");
    env::set_var("APIPROBE_EXTENSION_PRECEDENCE", "core");
    let config = ConfigLoader::load(&path);
    clear_apiprobe_env();
    let config = config.unwrap();

    assert_eq!(config.base_url.as_deref(), Some("https://env.test/"));
    assert_eq!(config.concurrent, 16);
    assert_eq!(config.timeout, 3);
    assert_eq!(config.retries, 4);
    assert!(config.stop_on_fail);
    assert_eq!(config.extension_precedence, Precedence::FavorBuiltin);
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_apiprobe_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "concurrent: 6\n").unwrap();

    env::set_var("APIPROBE_CONCURRENT", "lots");
    env::set_var("APIPROBE_EXTENSION_PRECEDENCE", "sideways");
    let config = ConfigLoader::load(&path);
    clear_apiprobe_env();
    let config = config.unwrap();

    assert_eq!(config.concurrent, 6);
    assert_eq!(config.extension_precedence, Precedence::FavorUser);
}

#[test]
#[serial]
fn test_malformed_file_is_a_parse_error() {
    clear_apiprobe_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "timeout: [not a number\n").unwrap();

    let err = ConfigLoader::load(&path).unwrap_err();
    assert_eq!(err.code, "CFG-002");
}

#[test]
#[serial]
fn test_invalid_base_url_is_rejected() {
    clear_apiprobe_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "baseUrl: not a url\n").unwrap();

    let err = ConfigLoader::load(&path).unwrap_err();
    assert_eq!(err.code, "CFG-003");
    assert_eq!(
        err.context.get("baseUrl").map(String::as_str),
        Some("not a url")
    );
}

#[test]
fn test_env_var_documentation_lists_overrides() {
    let docs = ConfigLoader::env_var_documentation();
    assert!(docs.iter().any(|line| line.starts_with("APIPROBE_BASE_URL")));
    assert!(docs
        .iter()
        .any(|line| line.starts_with("APIPROBE_EXTENSION_PRECEDENCE")));
}
