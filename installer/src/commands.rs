//! One function per CLI subcommand

use std::path::Path;

use crate::backup::BackupStore;
use crate::cli::PhoneHomeAction;
use crate::config::InstallerConfig;
use crate::core::hosts;
use crate::error::InstallerResult;
use crate::install::{InstallationEngine, InstalledRoot, UninstallationEngine};
use crate::logger;
use crate::models::{InstallReport, UninstallReport};

fn resolve_root(config: &InstallerConfig) -> InstallerResult<InstalledRoot> {
    InstalledRoot::resolve(
        config.game_directory.as_deref(),
        &config.steam_root,
        &config.launcher_config_dir,
    )
}

/// Install a mod package
pub fn apply(
    config: &InstallerConfig,
    mod_file: &Path,
    dry_run: bool,
) -> InstallerResult<InstallReport> {
    let root = resolve_root(config)?;

    // Refusals must leave the game root as it was, lock file included
    let mut unlocked = BackupStore::scan(root.backup_root())?;
    let extractor = InstallationEngine::new(&root, &mut unlocked).preflight(mod_file)?;

    let (mut store, _lock) = BackupStore::lock(root.backup_root())?;
    let report = InstallationEngine::new(&root, &mut store)
        .dry_run(dry_run)
        .install_with(mod_file, extractor.as_ref())?;

    if !dry_run {
        logger::log_info(
            &format!("Long War {} has been applied.", report.version),
            Some("commands"),
        );
        warn_if_phone_home_enabled(&config.hosts_file);
    }
    Ok(report)
}

/// Restore the game files of `version`, or of the applied version
pub fn uninstall(
    config: &InstallerConfig,
    version: Option<&str>,
) -> InstallerResult<UninstallReport> {
    let root = resolve_root(config)?;
    let (mut store, _lock) = BackupStore::lock(root.backup_root())?;

    let report = UninstallationEngine::new(&root, &mut store).uninstall(version)?;
    logger::log_info(
        &format!("Long War {} has been uninstalled.", report.version),
        Some("commands"),
    );
    Ok(report)
}

/// Print phone-home state, whether the game has been run, and every backup
pub fn list(config: &InstallerConfig) -> InstallerResult<()> {
    let root = resolve_root(config)?;
    let store = BackupStore::scan(root.backup_root())?;

    let enabled = hosts::phone_home_enabled(&config.hosts_file)?;
    println!(
        "Phone home is {}.",
        if enabled { "enabled" } else { "disabled" }
    );
    println!(
        "The game has {}been run.",
        if root.has_been_run() { "" } else { "not " }
    );

    if store.is_empty() {
        println!("No mod versions have been backed up.");
        return Ok(());
    }
    println!("Backed up mod versions:");
    for record in store.records() {
        let marker = if record.is_active() { " (applied)" } else { "" };
        println!("    {}{}", record, marker);
    }
    Ok(())
}

/// Delete the backup of an inactive version
pub fn delete(config: &InstallerConfig, version: &str) -> InstallerResult<()> {
    let root = resolve_root(config)?;
    let (mut store, _lock) = BackupStore::lock(root.backup_root())?;
    store.delete(version)?;
    logger::log_info(
        &format!("Backup of {} has been deleted.", version),
        Some("commands"),
    );
    Ok(())
}

/// Toggle the phone-home block in the hosts file
pub fn phone_home(config: &InstallerConfig, action: PhoneHomeAction) -> InstallerResult<()> {
    match action {
        PhoneHomeAction::Enable => {
            hosts::enable_phone_home(&config.hosts_file)?;
        }
        PhoneHomeAction::Disable => {
            hosts::disable_phone_home(&config.hosts_file)?;
        }
    }
    Ok(())
}

fn warn_if_phone_home_enabled(hosts_file: &Path) {
    match hosts::phone_home_enabled(hosts_file) {
        Ok(true) => logger::log_warn(
            "Phone home is still enabled. The game may replace modded files when it \
             phones home; disable it with the phone-home disable command.",
            Some("commands"),
        ),
        Ok(false) => {}
        Err(e) => logger::log_debug(
            &format!("Can't check phone home state: {}", e),
            Some("commands"),
            None,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::install::test_support::{build_zip, GameFixture};
    use std::fs;

    fn config_for(game: &GameFixture) -> InstallerConfig {
        let hosts = game.downloads().join("hosts");
        fs::create_dir_all(game.downloads()).unwrap();
        fs::write(&hosts, "127.0.0.1 localhost\n").unwrap();
        InstallerConfig {
            game_directory: Some(game.root().root().to_path_buf()),
            launcher_config_dir: game.root().launcher_config_dir().to_path_buf(),
            hosts_file: hosts,
            steam_root: game.downloads().join("Steam"),
            debug: false,
        }
    }

    #[test]
    fn test_apply_list_uninstall_delete() {
        let game = GameFixture::new();
        game.write_mod_file("XComGame/Config/DefaultAI.ini", "stock");
        let config = config_for(&game);
        let archive = build_zip(
            game.downloads(),
            "LongWar_Beta_15.zip",
            &[("app/XComGame/Config/DefaultAI.ini", "modded")],
        );

        let report = apply(&config, &archive, false).unwrap();
        assert_eq!(report.copied, 1);
        list(&config).unwrap();

        let err = delete(&config, "LongWar_Beta_15").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ActiveBackupConflict);

        let report = uninstall(&config, None).unwrap();
        assert_eq!(report.restored, 1);
        assert_eq!(game.read_mod_file("XComGame/Config/DefaultAI.ini"), "stock");

        delete(&config, "LongWar_Beta_15").unwrap();
        assert!(game.store().is_empty());
    }

    #[test]
    fn test_refused_apply_leaves_game_root_alone() {
        let game = GameFixture::never_run();
        let config = config_for(&game);
        let archive = build_zip(
            game.downloads(),
            "LongWar_Beta_15.zip",
            &[("app/XComGame/Config/DefaultAI.ini", "modded")],
        );

        let err = apply(&config, &archive, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PrerequisiteNotMet);
        assert!(!game.root().backup_root().exists());

        fs::create_dir_all(game.root().phone_home_marker()).unwrap();
        let err = apply(&config, &game.downloads().join("missing.zip"), false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ArchiveNotFound);
        assert!(!game.root().backup_root().exists());

        apply(&config, &archive, false).unwrap();
        let lock_file = game.root().backup_root().join(".lock");
        fs::remove_file(&lock_file).unwrap();
        let err = apply(&config, &archive, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyInstalled);
        assert!(!lock_file.exists());
    }

    #[test]
    fn test_missing_game_directory() {
        let game = GameFixture::new();
        let mut config = config_for(&game);
        config.game_directory = Some(game.downloads().join("not-a-game"));
        let err = list(&config).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InstallRootNotFound);
    }

    #[test]
    fn test_phone_home_toggle() {
        let game = GameFixture::new();
        let config = config_for(&game);

        phone_home(&config, PhoneHomeAction::Disable).unwrap();
        assert!(!hosts::phone_home_enabled(&config.hosts_file).unwrap());
        phone_home(&config, PhoneHomeAction::Enable).unwrap();
        assert!(hosts::phone_home_enabled(&config.hosts_file).unwrap());
    }
}
