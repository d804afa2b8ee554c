//! Well-known directories outside the game installation
//!
//! The launcher configuration directory and the steam root both live under the
//! user's data directory; each can be overridden through the environment so the
//! installer can be pointed at a non-standard layout.

use std::path::PathBuf;

/// Environment override for the launcher configuration directory
pub const LAUNCHER_CONFIG_DIR_ENV: &str = "LONGWAR_LAUNCHER_CONFIG_DIR";

/// Environment override for the steam root directory
pub const STEAM_ROOT_ENV: &str = "LONGWAR_STEAM_ROOT";

/// Environment override for the hosts file
pub const HOSTS_FILE_ENV: &str = "LONGWAR_HOSTS_FILE";

/// System hosts file
pub const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";

/// Launcher configuration directory, relative to the user data directory
const LAUNCHER_CONFIG_RELATIVE: [&str; 4] = [
    "Feral Interactive",
    "XCOM Enemy Unknown",
    "XEW",
    "MacInit",
];

/// Get the user data directory
///
/// - macOS: ~/Library/Application Support
/// - Linux: ~/.local/share (or $XDG_DATA_HOME)
fn get_user_data_dir() -> PathBuf {
    // Fallback to current directory
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Get the directory the game launcher reads its relocated config files from
pub fn get_launcher_config_dir() -> PathBuf {
    if let Some(dir) = env_path(LAUNCHER_CONFIG_DIR_ENV) {
        return dir;
    }
    LAUNCHER_CONFIG_RELATIVE
        .iter()
        .fold(get_user_data_dir(), |path, part| path.join(part))
}

/// Get the steam root directory
pub fn get_steam_root() -> PathBuf {
    env_path(STEAM_ROOT_ENV).unwrap_or_else(|| get_user_data_dir().join("Steam"))
}

/// Get the hosts file path
pub fn get_hosts_file() -> PathBuf {
    env_path(HOSTS_FILE_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_HOSTS_FILE))
}
