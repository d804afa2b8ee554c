use std::path::{Path, PathBuf};

use crate::core::game_locator::GameLocator;
use crate::error::{InstallerError, InstallerResult};
use crate::logger;

/// Application bundle directory, relative to the game root
pub const APP_BUNDLE: &str = "XCOM Enemy Unknown.app";

/// Root of the mod-data tree, relative to the game root
pub const MOD_FILE_ROOT: &str = "XCOMData/XEW";

/// Present inside the app bundle once the game has been launched and phoned home
pub const PHONE_HOME_INDICATOR: &str = "Contents/Frameworks/QuincyKit.framework";

/// Directory holding every backup, relative to the game root
pub const BACKUP_DIRECTORY: &str = "Long-War-Backups";

/// An installed game directory plus the external launcher config directory
#[derive(Debug, Clone)]
pub struct InstalledRoot {
    root: PathBuf,
    app_bundle: PathBuf,
    mod_data: PathBuf,
    launcher_config_dir: PathBuf,
}

impl InstalledRoot {
    /// Open an explicit game directory
    pub fn open(
        root: impl Into<PathBuf>,
        launcher_config_dir: impl Into<PathBuf>,
    ) -> InstallerResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            logger::log_debug(
                &format!("Can't open directory {}!", root.display()),
                Some("game_root"),
                None,
            );
            return Err(InstallerError::InstallRootNotFound(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        logger::log_debug(
            &format!("Game root directory located at {}", root.display()),
            Some("game_root"),
            None,
        );
        Ok(Self {
            app_bundle: root.join(APP_BUNDLE),
            mod_data: root.join(MOD_FILE_ROOT),
            launcher_config_dir: launcher_config_dir.into(),
            root,
        })
    }

    /// Use `explicit` when given, otherwise search the steam libraries
    pub fn resolve(
        explicit: Option<&Path>,
        steam_root: &Path,
        launcher_config_dir: &Path,
    ) -> InstallerResult<Self> {
        let root = match explicit {
            Some(path) => path.to_path_buf(),
            None => GameLocator::new(steam_root)?.find()?,
        };
        Self::open(root, launcher_config_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn app_bundle(&self) -> &Path {
        &self.app_bundle
    }

    pub fn mod_data(&self) -> &Path {
        &self.mod_data
    }

    pub fn launcher_config_dir(&self) -> &Path {
        &self.launcher_config_dir
    }

    pub fn backup_root(&self) -> PathBuf {
        self.root.join(BACKUP_DIRECTORY)
    }

    pub fn phone_home_marker(&self) -> PathBuf {
        self.app_bundle.join(PHONE_HOME_INDICATOR)
    }

    /// Whether the game has been launched at least once
    pub fn has_been_run(&self) -> bool {
        self.phone_home_marker().exists()
    }
}
