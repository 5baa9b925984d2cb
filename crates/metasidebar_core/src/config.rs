//! Configuration loading from environment variables.

use crate::constants::{DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_URL};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration shared by the server, sidebar, and CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub server_url: String,
    pub seed_path: Option<String>,
    pub include_properties: bool,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            server_url: DEFAULT_SERVER_URL.to_string(),
            seed_path: None,
            include_properties: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    None
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment, falling back to `default`.
///
/// # Arguments
/// - `name`: Environment variable name.
/// - `default`: Value used when the variable is missing or unrecognized.
pub fn env_flag_or(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(default)
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env_flag_or(name, false)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);
        Self {
            port,
            server_url: env::var("METASIDEBAR_SERVER")
                .ok()
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            seed_path: env::var("METASIDEBAR_SEED")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(expand_tilde),
            include_properties: env_flag_or("METASIDEBAR_PROPERTIES", defaults.include_properties),
            request_timeout_secs: env::var("METASIDEBAR_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout_secs),
        }
    }
}
