//! Default paths for tallyd components
//!
//! Provides centralized path defaults that all crates can use.
//! Paths are user-writable by default (no root required):
//! - Socket: `$XDG_RUNTIME_DIR/tallyd/tallyd.sock` or `/tmp/tallyd-$USER/tallyd.sock`
//! - Data: `$XDG_DATA_HOME/tallyd` or `~/.local/share/tallyd`
//! - Logs: `$XDG_STATE_HOME/tallyd` or `~/.local/state/tallyd`
//! - Config: `$XDG_CONFIG_HOME/tally/config.toml` or `~/.config/tally/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const TALLY_SOCKET_ENV: &str = "TALLY_SOCKET";

/// Environment variable for overriding the data directory
pub const TALLY_DATA_DIR_ENV: &str = "TALLY_DATA_DIR";

/// Socket filename within the socket directory
const SOCKET_FILENAME: &str = "tallyd.sock";

/// Runtime/data subdirectory name
const APP_DIR: &str = "tallyd";

/// Config subdirectory name
const CONFIG_DIR: &str = "tally";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$TALLY_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/tallyd/tallyd.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/tallyd-$USER/tallyd.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(TALLY_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the TALLY_SOCKET env var.
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
/// 1. `$TALLY_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/tallyd` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/tallyd` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(TALLY_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the TALLY_DATA_DIR env var.
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

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default log directory.
///
/// Order of precedence:
/// 1. `$XDG_STATE_HOME/tallyd` (if XDG_STATE_HOME is set)
/// 2. `~/.local/state/tallyd` (fallback)
pub fn default_log_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("logs")
}

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/tally/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/tally/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(CONFIG_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(CONFIG_DIR).join("config.toml")
}
