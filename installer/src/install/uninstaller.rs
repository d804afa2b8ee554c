//! Roll the game tree back to a captured state
//!
//! Restoration is best effort: a file that can't be copied back or removed
//! is logged and counted, and the remaining files are still processed.

use std::path::Path;
use walkdir::WalkDir;

use super::game_root::InstalledRoot;
use super::installer::verification::{copy_or_warn, remove_or_warn};
use super::path_mapper::{self, Namespace};
use crate::backup::{BackupRecord, BackupStore};
use crate::core::path_utils::relative_to;
use crate::error::{InstallerError, InstallerResult};
use crate::logger;
use crate::models::UninstallReport;

/// Finder metadata that may appear in backup directories
const IGNORED_FILE: &str = ".DS_Store";

const CONTEXT: &str = "uninstaller";

pub struct UninstallationEngine<'a> {
    root: &'a InstalledRoot,
    store: &'a mut BackupStore,
}

impl<'a> UninstallationEngine<'a> {
    pub fn new(root: &'a InstalledRoot, store: &'a mut BackupStore) -> Self {
        Self { root, store }
    }

    /// Restore `version`, or the active version when none is given
    pub fn uninstall(&mut self, version: Option<&str>) -> InstallerResult<UninstallReport> {
        let version = match version {
            Some(version) => self.store.get(version)?.version().to_string(),
            None => self
                .store
                .active()
                .map(|record| record.version().to_string())
                .ok_or(InstallerError::NoActiveVersion)?,
        };

        let root = self.root;
        let record = self.store.get_mut(&version)?;
        let log_path = record.uninstall_log_path();
        let _run_log =
            logger::attach_run_log(&log_path).map_err(|e| InstallerError::io_at(&log_path, e))?;

        logger::log_info(
            &format!("Uninstalling {} from {}", record, root.root().display()),
            Some(CONTEXT),
        );
        if !record.is_active() {
            logger::log_info(
                &format!("{} is not the applied version; restoring anyway", version),
                Some(CONTEXT),
            );
        }

        let mut report = UninstallReport {
            version: version.clone(),
            ..UninstallReport::default()
        };
        for namespace in Namespace::ALL {
            restore_namespace(root, record, namespace, &mut report);
        }
        for namespace in Namespace::ALL {
            remove_new_files(root, record, namespace, &mut report);
        }

        record.set_active(false);
        record.save()?;

        logger::log_info(
            &format!(
                "Restored {} files, removed {} files, {} warnings",
                report.restored, report.removed, report.warnings
            ),
            Some(CONTEXT),
        );
        Ok(report)
    }
}

fn restore_namespace(
    root: &InstalledRoot,
    record: &BackupRecord,
    namespace: Namespace,
    report: &mut UninstallReport,
) {
    let backup_dir = record.namespace_dir(namespace);
    if !backup_dir.is_dir() {
        return;
    }

    logger::log_debug(
        &format!("Restoring {} from {}", namespace, backup_dir.display()),
        Some(CONTEXT),
        None,
    );
    for entry in WalkDir::new(&backup_dir).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger::log_warn(
                    &format!("Can't read {}: {}", backup_dir.display(), e),
                    Some(CONTEXT),
                );
                report.warnings += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_restorable(entry.path()) {
            continue;
        }
        let Some(relative) = relative_to(entry.path(), &backup_dir) else {
            continue;
        };

        let target = path_mapper::game_path(root, namespace, &relative);
        if copy_or_warn(entry.path(), &target, CONTEXT) {
            report.restored += 1;
        } else {
            report.warnings += 1;
        }
    }
}

fn remove_new_files(
    root: &InstalledRoot,
    record: &BackupRecord,
    namespace: Namespace,
    report: &mut UninstallReport,
) {
    for relative in record.new_files(namespace) {
        let target = path_mapper::game_path(root, namespace, &relative);
        if remove_or_warn(&target, CONTEXT) {
            report.removed += 1;
        } else {
            report.warnings += 1;
        }
    }
}

fn is_restorable(path: &Path) -> bool {
    path.file_name().map(|name| name != IGNORED_FILE).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::install::installer::extraction::ZipExtractor;
    use crate::install::installer::{InstallationEngine, UNCOMPRESSED_SIZE};
    use crate::install::test_support::{build_zip, GameFixture};
    use std::fs;
    use std::path::PathBuf;

    const STOCK: &str = "XComGame/Config/DefaultAI.ini";
    const ADDED: &str = "XComGame/Config/DefaultLongWar.ini";
    const PACKAGE: &str = "XComGame/CookedPCConsole/XComGame.upk";

    fn install(game: &GameFixture, store: &mut BackupStore) -> PathBuf {
        let archive = build_zip(
            game.downloads(),
            "LongWar_Beta_15.zip",
            &[
                ("app/XComGame/Config/DefaultAI.ini", "modded ai"),
                ("app/XComGame/Config/DefaultLongWar.ini", "long war"),
                ("app/XComGame/CookedPCConsole/XComGame.upk", "modded package"),
                ("app/XComGame/Localization/INT/XComGame.int", "lw strings"),
                ("app/XComGame/Config/DefaultGameCore.ini", "lw core"),
            ],
        );
        InstallationEngine::new(game.root(), store)
            .install_with(&archive, &ZipExtractor)
            .unwrap();
        archive
    }

    fn seed(game: &GameFixture) {
        game.write_mod_file(STOCK, "stock ai");
        game.write_mod_file(PACKAGE, "stock package");
        game.write_mod_file(&format!("{}{}", PACKAGE, UNCOMPRESSED_SIZE), "4096");
        game.write_launcher_file("XComGameCore.ini", "launcher core");
        game.write_launcher_file("Preferences.plist", "prefs");
    }

    #[test]
    fn test_install_then_uninstall_restores_everything() {
        let game = GameFixture::new();
        seed(&game);
        let mut store = game.store();
        install(&game, &mut store);

        let report = UninstallationEngine::new(game.root(), &mut store)
            .uninstall(None)
            .unwrap();
        assert_eq!(report.version, "LongWar_Beta_15");
        assert_eq!(report.warnings, 0);

        assert_eq!(game.read_mod_file(STOCK), "stock ai");
        assert_eq!(game.read_mod_file(PACKAGE), "stock package");
        assert_eq!(
            game.read_mod_file(&format!("{}{}", PACKAGE, UNCOMPRESSED_SIZE)),
            "4096"
        );
        assert!(!game.mod_file(ADDED).exists());
        assert!(!game.mod_file("XComGame/Localization/INT/XComGame.int").exists());
        assert!(!game
            .root()
            .app_bundle()
            .join("Contents/Resources/MacOverrides/XEW/XComGame.int")
            .exists());

        let launcher = game.root().launcher_config_dir();
        assert_eq!(
            fs::read_to_string(launcher.join("XComGameCore.ini")).unwrap(),
            "launcher core"
        );
        assert_eq!(
            fs::read_to_string(launcher.join("Preferences.plist")).unwrap(),
            "prefs"
        );

        assert!(store.active().is_none());
        assert!(!game.store().get("LongWar_Beta_15").unwrap().is_active());
        assert!(store
            .get("LongWar_Beta_15")
            .unwrap()
            .uninstall_log_path()
            .exists());
    }

    #[test]
    fn test_uninstall_twice_by_version_only_warns() {
        let game = GameFixture::new();
        seed(&game);
        let mut store = game.store();
        install(&game, &mut store);

        UninstallationEngine::new(game.root(), &mut store)
            .uninstall(Some("LongWar_Beta_15"))
            .unwrap();
        let second = UninstallationEngine::new(game.root(), &mut store)
            .uninstall(Some("LongWar_Beta_15"))
            .unwrap();

        // New files are already gone; each missing one is a warning
        assert_eq!(second.removed, 0);
        assert!(second.warnings > 0);
        assert_eq!(game.read_mod_file(STOCK), "stock ai");
    }

    #[test]
    fn test_uninstall_without_active_version() {
        let game = GameFixture::new();
        let mut store = game.store();
        let err = UninstallationEngine::new(game.root(), &mut store)
            .uninstall(None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoActiveVersion);

        let err = UninstallationEngine::new(game.root(), &mut store)
            .uninstall(Some("LongWar_Beta_99"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BackupNotFound);
    }

    #[test]
    fn test_delete_only_after_uninstall() {
        let game = GameFixture::new();
        seed(&game);
        let mut store = game.store();
        install(&game, &mut store);

        let err = store.delete("LongWar_Beta_15").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ActiveBackupConflict);

        UninstallationEngine::new(game.root(), &mut store)
            .uninstall(None)
            .unwrap();
        store.delete("LongWar_Beta_15").unwrap();
        assert!(!game.root().backup_root().join("LongWar_Beta_15").exists());
    }

    #[test]
    fn test_finder_metadata_is_not_restored() {
        let game = GameFixture::new();
        seed(&game);
        let mut store = game.store();
        install(&game, &mut store);

        let record = store.get("LongWar_Beta_15").unwrap();
        let junk = record.namespace_dir(Namespace::ModFiles).join(IGNORED_FILE);
        fs::write(&junk, "finder").unwrap();

        UninstallationEngine::new(game.root(), &mut store)
            .uninstall(None)
            .unwrap();
        assert!(!game.mod_file(IGNORED_FILE).exists());
        assert!(!is_restorable(&junk));
        assert!(is_restorable(Path::new("XComGame/Config/DefaultAI.ini")));
    }

    #[test]
    fn test_reinstall_after_uninstall() {
        let game = GameFixture::new();
        seed(&game);
        let mut store = game.store();
        install(&game, &mut store);
        UninstallationEngine::new(game.root(), &mut store)
            .uninstall(None)
            .unwrap();

        install(&game, &mut store);
        assert_eq!(game.read_mod_file(STOCK), "modded ai");
        let record = store.active().unwrap();
        assert_eq!(
            fs::read_to_string(record.namespace_dir(Namespace::ModFiles).join(STOCK)).unwrap(),
            "stock ai"
        );
    }
}
