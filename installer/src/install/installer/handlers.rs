//! Per-file backup-then-overwrite handling

use std::collections::HashSet;
use std::path::PathBuf;
use walkdir::WalkDir;

use super::verification::{copy_or_warn, remove_or_warn, verified_copy};
use crate::backup::BackupRecord;
use crate::core::path_utils::{relative_to, with_suffix};
use crate::install::categorizer::ExtractedFile;
use crate::install::game_root::InstalledRoot;
use crate::install::path_mapper::{self, MappedPath, Namespace};
use crate::logger;
use crate::models::InstallReport;

/// Companion file the game keeps next to compressed packages
pub const UNCOMPRESSED_SIZE: &str = ".uncompressed_size";

const CONTEXT: &str = "installer";

/// Mutable state of one backing-up-and-copying pass
pub(super) struct CaptureSession<'a> {
    root: &'a InstalledRoot,
    record: &'a mut BackupRecord,
    dry_run: bool,
    report: &'a mut InstallReport,
    /// Game paths already handled this run
    visited: HashSet<PathBuf>,
    /// Launcher config entries present before the reset
    launcher_snapshot: HashSet<PathBuf>,
    /// Game paths whose backup failed; these are never overwritten
    not_backed_up: HashSet<PathBuf>,
}

impl<'a> CaptureSession<'a> {
    pub(super) fn new(
        root: &'a InstalledRoot,
        record: &'a mut BackupRecord,
        dry_run: bool,
        report: &'a mut InstallReport,
    ) -> Self {
        Self {
            root,
            record,
            dry_run,
            report,
            visited: HashSet::new(),
            launcher_snapshot: HashSet::new(),
            not_backed_up: HashSet::new(),
        }
    }

    fn warn(&mut self, msg: &str) {
        logger::log_warn(msg, Some(CONTEXT));
        self.report.warnings += 1;
    }

    /// Back up and clear the launcher config directory so the launcher rebuilds
    /// its defaults around the installed config files
    pub(super) fn reset_launcher_config(&mut self) {
        let dir = self.root.launcher_config_dir().to_path_buf();
        if !dir.is_dir() {
            logger::log_debug(
                &format!("No launcher config directory at {}", dir.display()),
                Some(CONTEXT),
                None,
            );
            return;
        }

        logger::log_info("Resetting launcher config...", Some(CONTEXT));
        for entry in WalkDir::new(&dir).min_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.warn(&format!("Can't read {}: {}", dir.display(), e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative) = relative_to(entry.path(), &dir) else {
                continue;
            };

            let live = entry.path().to_path_buf();
            self.launcher_snapshot.insert(relative.clone());
            self.visited.insert(live.clone());

            let backup =
                path_mapper::backup_path(self.record.root(), Namespace::OsIntegration, &relative);
            logger::log_debug(
                &format!("Backing up {} to {}", live.display(), backup.display()),
                Some(CONTEXT),
                None,
            );
            if let Err(e) = verified_copy(&live, &backup) {
                self.warn(&format!("Error backing up {}: {:#}", live.display(), e));
                self.not_backed_up.insert(live);
                continue;
            }
            self.report.backed_up += 1;

            if !self.dry_run && !remove_or_warn(&live, CONTEXT) {
                self.report.warnings += 1;
            }
        }
    }

    /// Back up whatever each placement of `file` would overwrite, then install it
    pub(super) fn process_file(&mut self, file: &ExtractedFile) {
        logger::log_debug(
            &format!("Processing {} ({})", file.relative_path.display(), file.category),
            Some(CONTEXT),
            None,
        );

        let placements = path_mapper::map(self.root, self.record.root(), file);
        for mapped in &placements {
            if !self.back_up_placement(mapped) {
                continue;
            }
            if self.dry_run {
                continue;
            }
            if copy_or_warn(&file.extracted_path, &mapped.game_path, CONTEXT) {
                self.report.copied += 1;
            } else {
                self.report.warnings += 1;
            }
        }

        if file.is_compiled_asset() {
            if let Some(mod_files) = placements
                .iter()
                .find(|mapped| mapped.namespace == Namespace::ModFiles)
            {
                self.handle_sidecar(file, mod_files);
            }
        }
    }

    /// Capture the pre-install state of one placement. Returns false when the
    /// live file must not be overwritten.
    fn back_up_placement(&mut self, mapped: &MappedPath) -> bool {
        let existed = match mapped.namespace {
            Namespace::OsIntegration => self.launcher_snapshot.contains(&mapped.relative),
            Namespace::ModFiles | Namespace::AppBundle => mapped.game_path.exists(),
        };

        if self.not_backed_up.contains(&mapped.game_path) {
            return false;
        }
        if !self.visited.insert(mapped.game_path.clone()) {
            return true;
        }

        if !existed {
            logger::log_debug(
                &format!("{} is a new file", mapped.game_path.display()),
                Some(CONTEXT),
                None,
            );
            self.record.mark_new(mapped.namespace, &mapped.relative);
            self.report.new_files += 1;
            return true;
        }

        logger::log_debug(
            &format!(
                "Backing up {} to {}",
                mapped.game_path.display(),
                mapped.backup_path.display()
            ),
            Some(CONTEXT),
            None,
        );
        match verified_copy(&mapped.game_path, &mapped.backup_path) {
            Ok(_) => {
                self.report.backed_up += 1;
                true
            }
            Err(e) => {
                self.warn(&format!(
                    "Error backing up {}, leaving it in place: {:#}",
                    mapped.game_path.display(),
                    e
                ));
                self.not_backed_up.insert(mapped.game_path.clone());
                false
            }
        }
    }

    /// A stale size sidecar makes the game reject the new package, so it is
    /// backed up and removed unless the payload ships a replacement.
    fn handle_sidecar(&mut self, file: &ExtractedFile, mapped: &MappedPath) {
        if with_suffix(&file.extracted_path, UNCOMPRESSED_SIZE).exists() {
            logger::log_debug(
                &format!("{} ships its own size file", file.relative_path.display()),
                Some(CONTEXT),
                None,
            );
            return;
        }

        let sidecar = with_suffix(&mapped.game_path, UNCOMPRESSED_SIZE);
        if !sidecar.is_file() || !self.visited.insert(sidecar.clone()) {
            return;
        }

        let backup = with_suffix(&mapped.backup_path, UNCOMPRESSED_SIZE);
        if let Err(e) = verified_copy(&sidecar, &backup) {
            self.warn(&format!("Error backing up {}: {:#}", sidecar.display(), e));
            return;
        }
        self.report.backed_up += 1;

        if !self.dry_run {
            logger::log_debug(
                &format!("Removing size file {}", sidecar.display()),
                Some(CONTEXT),
                None,
            );
            if !remove_or_warn(&sidecar, CONTEXT) {
                self.report.warnings += 1;
            }
        }
    }
}
