//! Locate the XCOM installation inside the user's steam libraries
//!
//! Parsing of the steam config files is a plain line-regex heuristic; it only
//! needs to pull library paths out, not understand the VDF structure.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{InstallerError, InstallerResult};
use crate::logger;

/// Legacy config file listing extra library folders
const STEAM_CONFIG_FILE: &str = "config/config.vdf";

/// Library folder index used by current steam clients
const LIBRARY_FOLDERS_FILE: &str = "steamapps/libraryfolders.vdf";

/// Game directory relative to a library root; older clients capitalise `SteamApps`
const GAME_ROOTS: [&str; 2] = [
    "SteamApps/common/XCom-Enemy-Unknown",
    "steamapps/common/XCom-Enemy-Unknown",
];

static BASE_INSTALL_FOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*"BaseInstallFolder[^"]*"\s+"(.+)"\s*$"#).expect("valid regex")
});

static LIBRARY_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"path"\s+"(.+)"\s*$"#).expect("valid regex"));

/// Finds the game directory from a steam root
pub struct GameLocator {
    steam_root: PathBuf,
}

impl GameLocator {
    /// Create a locator for the given steam root, which must exist
    pub fn new(steam_root: impl Into<PathBuf>) -> InstallerResult<Self> {
        let steam_root = steam_root.into();
        if !steam_root.is_dir() {
            logger::log_debug(
                &format!("Can't open steam root at {}", steam_root.display()),
                Some("game_locator"),
                None,
            );
            return Err(InstallerError::InstallRootNotFound(format!(
                "steam directory {} does not exist",
                steam_root.display()
            )));
        }
        Ok(Self { steam_root })
    }

    pub fn steam_root(&self) -> &Path {
        &self.steam_root
    }

    /// Return the first library root that contains the game
    pub fn find(&self) -> InstallerResult<PathBuf> {
        logger::log_debug("Looking for game installation...", Some("game_locator"), None);
        for library in self.library_roots() {
            for game_root in GAME_ROOTS {
                let guess = library.join(game_root);
                if guess.is_dir() {
                    logger::log_debug(
                        &format!("Found game directory {}", guess.display()),
                        Some("game_locator"),
                        None,
                    );
                    return Ok(guess);
                }
            }
        }
        Err(InstallerError::InstallRootNotFound(
            "no steam library contains XCom-Enemy-Unknown".to_string(),
        ))
    }

    /// The steam root itself, followed by every extra library folder it lists
    pub fn library_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.steam_root.clone()];
        for (file, pattern) in [
            (STEAM_CONFIG_FILE, &*BASE_INSTALL_FOLDER),
            (LIBRARY_FOLDERS_FILE, &*LIBRARY_PATH),
        ] {
            for root in read_library_paths(&self.steam_root.join(file), pattern) {
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        roots
    }
}

fn read_library_paths(config: &Path, pattern: &Regex) -> Vec<PathBuf> {
    let contents = match fs::read_to_string(config) {
        Ok(contents) => contents,
        Err(_) => {
            logger::log_debug(
                &format!(
                    "Can't open steam config file {} to find alternate install directories",
                    config.display()
                ),
                Some("game_locator"),
                None,
            );
            return Vec::new();
        }
    };

    contents
        .lines()
        .filter_map(|line| pattern.captures(line))
        .filter_map(|captures| captures.get(1))
        // VDF escapes backslashes in Windows paths
        .map(|m| PathBuf::from(m.as_str().replace("\\\\", "\\")))
        .inspect(|path| {
            logger::log_debug(
                &format!("Found steam install directory {}", path.display()),
                Some("game_locator"),
                None,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_steam_root() {
        let tmp = TempDir::new().unwrap();
        let result = GameLocator::new(tmp.path().join("Steam"));
        assert!(matches!(result, Err(InstallerError::InstallRootNotFound(_))));
    }

    #[test]
    fn test_finds_game_in_steam_root() {
        let tmp = TempDir::new().unwrap();
        let game = tmp.path().join("SteamApps/common/XCom-Enemy-Unknown");
        fs::create_dir_all(&game).unwrap();

        let locator = GameLocator::new(tmp.path()).unwrap();
        assert_eq!(locator.find().unwrap(), game);
    }

    #[test]
    fn test_finds_game_in_alternate_library() {
        let tmp = TempDir::new().unwrap();
        let steam = tmp.path().join("Steam");
        let library = tmp.path().join("Games Drive");
        fs::create_dir_all(steam.join("config")).unwrap();
        fs::write(
            steam.join(STEAM_CONFIG_FILE),
            format!(
                "\"InstallConfigStore\"\n{{\n\t\"BaseInstallFolder_1\"\t\t\"{}\"\n}}\n",
                library.display()
            ),
        )
        .unwrap();
        let game = library.join("steamapps/common/XCom-Enemy-Unknown");
        fs::create_dir_all(&game).unwrap();

        let locator = GameLocator::new(&steam).unwrap();
        assert_eq!(locator.library_roots(), vec![steam.clone(), library]);
        assert_eq!(locator.find().unwrap(), game);
    }

    #[test]
    fn test_reads_library_folders() {
        let tmp = TempDir::new().unwrap();
        let steam = tmp.path().join("Steam");
        fs::create_dir_all(steam.join("steamapps")).unwrap();
        fs::write(
            steam.join(LIBRARY_FOLDERS_FILE),
            "\"libraryfolders\"\n{\n\t\"1\"\n\t{\n\t\t\"path\"\t\t\"/mnt/games\"\n\t}\n}\n",
        )
        .unwrap();

        let locator = GameLocator::new(&steam).unwrap();
        assert!(locator.library_roots().contains(&PathBuf::from("/mnt/games")));
        assert!(matches!(
            locator.find(),
            Err(InstallerError::InstallRootNotFound(_))
        ));
    }
}
