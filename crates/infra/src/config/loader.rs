//! Configuration loader
//!
//! Loads process configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the platform variables are missing, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `C8Y_BASEURL`, `C8Y_BOOTSTRAP_TENANT`, `C8Y_BOOTSTRAP_USER`,
//!   `C8Y_BOOTSTRAP_PASSWORD`: required platform access
//! - `C8Y_TENANT`: tenant the bridge acts for
//! - `SERVER_PORT`: health server port
//! - `HUBBRIDGE_CONSUMER`, `HUBBRIDGE_SUBSCRIPTION`: notification names
//! - `HUBBRIDGE_TOKEN_EXPIRY_MINUTES`: notification token lifetime
//! - `HUBBRIDGE_SHARED_SUBSCRIPTION`: shared subscription (true/false)
//! - `HUBBRIDGE_NOTIFICATION_URL`: explicit websocket endpoint
//! - `HUBBRIDGE_RETRY_MAX`, `HUBBRIDGE_RETRY_BASE_MS`,
//!   `HUBBRIDGE_RETRY_MAX_DELAY_MS`, `HUBBRIDGE_HTTP_TIMEOUT_SECS`: transport
//! - `HUBBRIDGE_SAMPLE_ENABLED`, `HUBBRIDGE_SAMPLE_INTERVAL_SECS`: sample events
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./hubbridge.json` or `./hubbridge.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use hubbridge_domain::{
    BridgeError, Config, NotificationConfig, PlatformConfig, Result, SampleConfig, ServerConfig,
    TransportConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `BridgeError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The four platform variables are required; everything else falls back to
/// its default.
///
/// # Errors
/// Returns `BridgeError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let platform = PlatformConfig {
        base_url: env_var("C8Y_BASEURL")?,
        bootstrap_tenant: env_var("C8Y_BOOTSTRAP_TENANT")?,
        bootstrap_user: env_var("C8Y_BOOTSTRAP_USER")?,
        bootstrap_password: env_var("C8Y_BOOTSTRAP_PASSWORD")?,
        tenant: env_opt("C8Y_TENANT"),
    };

    let notification_defaults = NotificationConfig::default();
    let notification = NotificationConfig {
        consumer: env_opt("HUBBRIDGE_CONSUMER").unwrap_or(notification_defaults.consumer),
        subscription: env_opt("HUBBRIDGE_SUBSCRIPTION")
            .unwrap_or(notification_defaults.subscription),
        token_expiry_minutes: env_parse(
            "HUBBRIDGE_TOKEN_EXPIRY_MINUTES",
            notification_defaults.token_expiry_minutes,
        )?,
        shared: env_bool("HUBBRIDGE_SHARED_SUBSCRIPTION", notification_defaults.shared),
        websocket_url: env_opt("HUBBRIDGE_NOTIFICATION_URL"),
    };

    let transport_defaults = TransportConfig::default();
    let transport = TransportConfig {
        max_retries: env_parse("HUBBRIDGE_RETRY_MAX", transport_defaults.max_retries)?,
        retry_base_ms: env_parse("HUBBRIDGE_RETRY_BASE_MS", transport_defaults.retry_base_ms)?,
        retry_max_delay_ms: env_parse(
            "HUBBRIDGE_RETRY_MAX_DELAY_MS",
            transport_defaults.retry_max_delay_ms,
        )?,
        timeout_secs: env_parse("HUBBRIDGE_HTTP_TIMEOUT_SECS", transport_defaults.timeout_secs)?,
    };

    let server_defaults = ServerConfig::default();
    let server =
        ServerConfig { port: env_parse("SERVER_PORT", server_defaults.port)?, ..server_defaults };

    let sample_defaults = SampleConfig::default();
    let sample = SampleConfig {
        enabled: env_bool("HUBBRIDGE_SAMPLE_ENABLED", sample_defaults.enabled),
        interval_seconds: env_parse(
            "HUBBRIDGE_SAMPLE_INTERVAL_SECS",
            sample_defaults.interval_seconds,
        )?,
    };

    Ok(Config { platform, notification, transport, server, sample })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `BridgeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BridgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BridgeError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BridgeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BridgeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BridgeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(BridgeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
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
        dir.join("hubbridge.json"),
        dir.join("hubbridge.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `BridgeError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        BridgeError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional, non-empty environment variable.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse an optional environment variable, using `default` when unset.
///
/// # Errors
/// Returns `BridgeError::Config` when the value is set but invalid.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| BridgeError::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
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
