//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TOLLGATE_BASE_URL`: Backend base URL (required unless networking is disabled)
//! - `TOLLGATE_CLIENT_KEY`: Client identity key for the app token call (required)
//! - `TOLLGATE_NETWORKING_ENABLED`: `false` switches to mock mode (default `true`)
//! - `TOLLGATE_TIMEOUT_MS`: Default request timeout
//! - `TOLLGATE_MAX_RETRIES`: Retries after the first attempt for transient failures
//! - `TOLLGATE_RETRY_BASE_DELAY_MS`: First backoff delay; doubles per retry
//! - `TOLLGATE_MOCK_DELAY_MS`: Artificial latency of mock responses
//! - `TOLLGATE_KEYCHAIN_SERVICE`: Keychain service name for secure credentials
//! - `TOLLGATE_PLAIN_STORE_PATH`: JSON file for low-sensitivity credentials
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./tollgate.json` or `./tollgate.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location
//!
//! The client key is a secret and may be kept out of config files: when
//! `TOLLGATE_CLIENT_KEY` is set it overrides the file value.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tollgate_domain::{ClientConfig, Result, TollgateError};

const BASE_URL_VAR: &str = "TOLLGATE_BASE_URL";
const CLIENT_KEY_VAR: &str = "TOLLGATE_CLIENT_KEY";
const NETWORKING_ENABLED_VAR: &str = "TOLLGATE_NETWORKING_ENABLED";
const TIMEOUT_MS_VAR: &str = "TOLLGATE_TIMEOUT_MS";
const MAX_RETRIES_VAR: &str = "TOLLGATE_MAX_RETRIES";
const RETRY_BASE_DELAY_MS_VAR: &str = "TOLLGATE_RETRY_BASE_DELAY_MS";
const MOCK_DELAY_MS_VAR: &str = "TOLLGATE_MOCK_DELAY_MS";
const KEYCHAIN_SERVICE_VAR: &str = "TOLLGATE_KEYCHAIN_SERVICE";
const PLAIN_STORE_PATH_VAR: &str = "TOLLGATE_PLAIN_STORE_PATH";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `TollgateError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The resulting configuration fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            let mut config = load_from_file(None)?;
            if let Ok(client_key) = std::env::var(CLIENT_KEY_VAR) {
                config.client_key = client_key;
            }
            config.validate()?;
            Ok(config)
        }
    }
}

/// Load configuration from environment variables
///
/// Unset optional variables keep their defaults.
///
/// # Errors
/// Returns `TollgateError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<ClientConfig> {
    let networking_enabled = env_bool(NETWORKING_ENABLED_VAR, true);
    let base_url = if networking_enabled {
        env_var(BASE_URL_VAR)?
    } else {
        std::env::var(BASE_URL_VAR).unwrap_or_default()
    };
    let client_key = env_var(CLIENT_KEY_VAR)?;

    let mut config = ClientConfig { base_url, client_key, networking_enabled, ..ClientConfig::default() };

    if let Some(timeout_ms) = env_parse(TIMEOUT_MS_VAR)? {
        config.timeout_ms = timeout_ms;
    }
    if let Some(max_retries) = env_parse(MAX_RETRIES_VAR)? {
        config.retry.max_retries = max_retries;
    }
    if let Some(base_delay_ms) = env_parse(RETRY_BASE_DELAY_MS_VAR)? {
        config.retry.base_delay_ms = base_delay_ms;
    }
    if let Some(mock_delay_ms) = env_parse(MOCK_DELAY_MS_VAR)? {
        config.mock_delay_ms = mock_delay_ms;
    }
    if let Ok(service) = std::env::var(KEYCHAIN_SERVICE_VAR) {
        config.storage.keychain_service = service;
    }
    if let Ok(path) = std::env::var(PLAIN_STORE_PATH_VAR) {
        config.storage.plain_store_path = Some(PathBuf::from(path));
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Fields absent from the file keep their defaults.
///
/// # Errors
/// Returns `TollgateError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TollgateError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TollgateError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TollgateError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `TollgateError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TollgateError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TollgateError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(TollgateError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./tollgate.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("tollgate.json"),
        dir.join("tollgate.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `TollgateError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        TollgateError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `TollgateError::Config` if the variable is set but unparsable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TollgateError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 9] = [
        BASE_URL_VAR,
        CLIENT_KEY_VAR,
        NETWORKING_ENABLED_VAR,
        TIMEOUT_MS_VAR,
        MAX_RETRIES_VAR,
        RETRY_BASE_DELAY_MS_VAR,
        MOCK_DELAY_MS_VAR,
        KEYCHAIN_SERVICE_VAR,
        PLAIN_STORE_PATH_VAR,
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    fn write_temp(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (value, expected) in [("1", true), ("TRUE", true), ("on", true), ("no", false), ("0", false)] {
            std::env::set_var("TEST_TOLLGATE_BOOL", value);
            assert_eq!(env_bool("TEST_TOLLGATE_BOOL", !expected), expected, "{value}");
        }

        std::env::remove_var("TEST_TOLLGATE_BOOL");
        assert!(env_bool("TEST_TOLLGATE_BOOL", true));
        assert!(!env_bool("TEST_TOLLGATE_BOOL", false));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(BASE_URL_VAR, "https://api.example.com");
        std::env::set_var(CLIENT_KEY_VAR, "client-key");
        std::env::set_var(TIMEOUT_MS_VAR, "5000");
        std::env::set_var(MAX_RETRIES_VAR, "5");
        std::env::set_var(RETRY_BASE_DELAY_MS_VAR, "250");
        std::env::set_var(KEYCHAIN_SERVICE_VAR, "tollgate-test");
        std::env::set_var(PLAIN_STORE_PATH_VAR, "/tmp/tollgate.json");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.client_key, "client-key");
        assert!(config.networking_enabled);
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_ms, 250);
        assert_eq!(config.storage.keychain_service, "tollgate-test");
        assert_eq!(config.storage.plain_store_path, Some(PathBuf::from("/tmp/tollgate.json")));
    }

    #[test]
    fn test_mock_mode_does_not_require_base_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(CLIENT_KEY_VAR, "client-key");
        std::env::set_var(NETWORKING_ENABLED_VAR, "false");
        std::env::set_var(MOCK_DELAY_MS_VAR, "0");

        let result = load_from_env();
        clear_env();

        let config = result.expect("mock config from env");
        assert!(config.is_mock_mode());
        assert_eq!(config.mock_delay_ms, 0);
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(CLIENT_KEY_VAR, "client-key");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(TollgateError::Config(msg)) if msg.contains(BASE_URL_VAR)));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(BASE_URL_VAR, "https://api.example.com");
        std::env::set_var(CLIENT_KEY_VAR, "client-key");
        std::env::set_var(MAX_RETRIES_VAR, "not-a-number");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(TollgateError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_json() {
        let path = write_temp(
            r#"{
                "base_url": "https://api.example.com",
                "client_key": "from-file",
                "timeout_ms": 10000,
                "endpoints": { "login": "/auth/login" }
            }"#,
            "json",
        );

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        let config = result.expect("config from JSON file");
        assert_eq!(config.client_key, "from-file");
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.endpoints.login, "/auth/login");
        assert_eq!(config.endpoints.refresh, "/refresh");
    }

    #[test]
    fn test_load_from_file_toml() {
        let path = write_temp(
            r#"
base_url = "https://api.example.com"
networking_enabled = false

[retry]
max_retries = 1

[storage]
use_keychain = false
"#,
            "toml",
        );

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        let config = result.expect("config from TOML file");
        assert!(config.is_mock_mode());
        assert_eq!(config.retry.max_retries, 1);
        assert!(!config.storage.use_keychain);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(TollgateError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = write_temp(r#"{ "this is": "not valid json" "#, "json");

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        assert!(result.is_err(), "Should fail with invalid JSON");
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_candidate_files_cover_both_formats() {
        let candidates = candidate_files(Path::new("/srv/app"));
        assert!(candidates.contains(&PathBuf::from("/srv/app/tollgate.toml")));
        assert!(candidates.contains(&PathBuf::from("/srv/app/config.json")));
    }
}
