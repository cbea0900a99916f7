//! Environment Configuration Loader
//!
//! Loads environment variables from `/etc/flowdeck/environment` (or a path
//! given in `FLOWDECK_ENV_FILE`) and builds typed settings from them.
//!
//! ## Usage
//!
//! Call `load_environment()` early in main() before reading any settings:
//!
//! ```no_run
//! use fd_core::config::{load_environment, ServerSettings};
//!
//! load_environment();
//! let settings = ServerSettings::from_env().expect("valid settings");
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Paths to check, in order of priority
pub const ENV_FILE_PATHS: &[&str] = &["/etc/flowdeck/environment", "/etc/flowdeck.env", ".env"];

/// Load environment variables from the first environment file found.
///
/// Existing variables are never overridden. Returns the path that was
/// loaded, or None if no file was found.
pub fn load_environment() -> Option<String> {
    if let Ok(custom_path) = std::env::var("FLOWDECK_ENV_FILE") {
        if let Some(path) = try_load_env_file(&custom_path) {
            return Some(path);
        }
    }

    for path in ENV_FILE_PATHS {
        if let Some(loaded_path) = try_load_env_file(path) {
            return Some(loaded_path);
        }
    }

    debug!("No environment file found, using existing environment");
    None
}

fn try_load_env_file(path: &str) -> Option<String> {
    let path_obj = Path::new(path);
    if !path_obj.exists() {
        return None;
    }

    match fs::read_to_string(path_obj) {
        Ok(content) => {
            let mut loaded_count = 0;
            let mut skipped_count = 0;

            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                if let Some((key, value)) = parse_env_line(line) {
                    if std::env::var(&key).is_err() {
                        std::env::set_var(&key, &value);
                        loaded_count += 1;
                        debug!(
                            "Loaded: {}={}",
                            key,
                            if is_secret_key(&key) { "***" } else { &value }
                        );
                    } else {
                        skipped_count += 1;
                        debug!("Skipped (already set): {}", key);
                    }
                }
            }

            info!(
                "Loaded {} environment variables from {} ({} skipped - already set)",
                loaded_count, path, skipped_count
            );
            Some(path.to_string())
        }
        Err(e) => {
            warn!("Failed to read environment file {}: {}", path, e);
            None
        }
    }
}

fn is_secret_key(key: &str) -> bool {
    key.contains("KEY") || key.contains("TOKEN") || key.contains("SECRET")
}

/// Parse a single `KEY=VALUE` line. Surrounding quotes are stripped.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.strip_prefix("export ").unwrap_or(line);
    let mut parts = line.splitn(2, '=');
    let key = parts.next()?.trim();
    let value = parts.next()?.trim();

    if key.is_empty() {
        return None;
    }

    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    Some((key.to_string(), value.to_string()))
}

/// Get a configuration value with a default.
pub fn get_config(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional configuration value. Empty values count as unset.
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get a boolean configuration value.
pub fn get_config_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// Settings for the flowdeck HTTP server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Directory served as the frontend fallback
    pub static_dir: Option<String>,
    /// Allowed CORS origins (None = any)
    pub cors_origins: Option<Vec<String>>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Enable response compression
    pub compression: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: None,
            cors_origins: None,
            request_timeout: Duration::from_secs(30),
            compression: true,
        }
    }
}

impl ServerSettings {
    /// Build settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(get_config_opt)
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("FLOWDECK_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::config(format!("invalid port '{}'", raw)))?,
            None => defaults.port,
        };

        let request_timeout = match lookup("FLOWDECK_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    Error::config(format!("invalid request timeout '{}'", raw))
                })?;
                if secs == 0 {
                    return Err(Error::config("request timeout must be positive"));
                }
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        let cors_origins = lookup("FLOWDECK_CORS_ORIGINS").and_then(|raw| {
            let origins: Vec<String> = raw
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty() && o != "*")
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        });

        Ok(Self {
            host: lookup("FLOWDECK_HOST").unwrap_or(defaults.host),
            port,
            static_dir: lookup("FLOWDECK_STATIC_DIR"),
            cors_origins,
            request_timeout,
            compression: lookup("FLOWDECK_COMPRESSION")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.compression),
        })
    }

    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
