//! Default paths for focusguard components
//!
//! Paths are user-writable by default (no root required):
//! - Socket: `$XDG_RUNTIME_DIR/focusguard/focusguard.sock` or `/tmp/focusguard-$USER/focusguard.sock`
//! - Data: `$XDG_DATA_HOME/focusguard` or `~/.local/share/focusguard`
//! - Config: `$XDG_CONFIG_HOME/focusguard/config.toml` or `~/.config/focusguard/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const FOCUSGUARD_SOCKET_ENV: &str = "FOCUSGUARD_SOCKET";

/// Environment variable for overriding the data directory
pub const FOCUSGUARD_DATA_DIR_ENV: &str = "FOCUSGUARD_DATA_DIR";

/// Environment variable for overriding the config file
pub const FOCUSGUARD_CONFIG_ENV: &str = "FOCUSGUARD_CONFIG";

/// Socket filename within the socket directory
const SOCKET_FILENAME: &str = "focusguard.sock";

/// Rule table filename within the data directory
const RULES_FILENAME: &str = "dynamic-rules.json";

/// Application subdirectory name
const APP_DIR: &str = "focusguard";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$FOCUSGUARD_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/focusguard/focusguard.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/focusguard-$USER/focusguard.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(FOCUSGUARD_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the FOCUSGUARD_SOCKET env var.
/// Used for default values in configs where the env var is checked separately.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$FOCUSGUARD_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/focusguard` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/focusguard` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(FOCUSGUARD_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the FOCUSGUARD_DATA_DIR env var.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/focusguard/config.toml`
/// 2. `~/.config/focusguard/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(APP_DIR).join("config.toml")
}

/// Default location of the JSON rule table inside a data directory
pub fn rules_path_in(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(RULES_FILENAME)
}
