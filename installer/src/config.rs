//! Runtime configuration resolved once per invocation

use std::path::PathBuf;

use crate::cli::Cli;
use crate::core::app_dirs;

#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Explicit game directory; the steam libraries are searched when absent
    pub game_directory: Option<PathBuf>,
    pub launcher_config_dir: PathBuf,
    pub hosts_file: PathBuf,
    pub steam_root: PathBuf,
    pub debug: bool,
}

impl InstallerConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            game_directory: cli.game_directory.clone(),
            launcher_config_dir: app_dirs::get_launcher_config_dir(),
            hosts_file: app_dirs::get_hosts_file(),
            steam_root: app_dirs::get_steam_root(),
            debug: cli.debug,
        }
    }
}
