//! Connection configuration.
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. Command-line flags, or their `LOOKPORT_*` environment variables
//!    (clap resolves flag-over-env before we get here)
//! 2. The config file, `~/.lookport/config.json` unless `--config` says otherwise
//! 3. Built-in defaults (API version `4.0`, 60 second timeout)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default REST API version.
pub const DEFAULT_API_VERSION: &str = "4.0";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Contents of the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Values given on the command line (or through the environment).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub api_version: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Scheme and authority, no trailing slash.
    pub host: String,
    pub api_version: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl ConnectionSettings {
    /// Base URL of the REST API.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}/api/{}", self.host, self.api_version)
    }
}

/// Default config file location.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".lookport").join("config.json"))
}

/// Load the config file.
///
/// A missing file yields the empty config.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        return Ok(FileConfig::default());
    };

    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Merge overrides over the file config and apply defaults.
///
/// # Errors
///
/// Returns [`Error::Config`] when no host is configured.
pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<ConnectionSettings> {
    let host = overrides
        .host
        .or(file.host)
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| {
            Error::Config("No host configured; pass --host or set LOOKPORT_HOST".to_string())
        })?;

    Ok(ConnectionSettings {
        host: normalize_host(&host),
        api_version: overrides
            .api_version
            .or(file.api_version)
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        client_id: overrides.client_id.or(file.client_id),
        client_secret: overrides.client_secret.or(file.client_secret),
        access_token: overrides.access_token.or(file.access_token),
        timeout_secs: overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    })
}

/// Add `https://` when no scheme is given and drop trailing slashes.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
