//! Install pipeline: extract, categorize, back up, copy, record
//!
//! Nothing in the game tree is touched until every precondition has passed
//! and the package has been fully extracted. From then on each file is
//! backed up before it is overwritten, and the backup record is only written
//! once every file has been handled.

pub mod extraction;
mod handlers;
pub(crate) mod verification;

use std::fs;
use std::path::Path;

use crate::backup::BackupStore;
use crate::core::archive_input::{detect_archive_format, version_from_archive};
use crate::error::{InstallerError, InstallerResult};
use crate::install::categorizer::ExtractedFile;
use crate::install::game_root::InstalledRoot;
use crate::logger;
use crate::models::{InstallPhase, InstallReport};

use extraction::{extractor_for, Extractor, ScratchDir};
use handlers::CaptureSession;

pub use handlers::UNCOMPRESSED_SIZE;

pub struct InstallationEngine<'a> {
    root: &'a InstalledRoot,
    store: &'a mut BackupStore,
    dry_run: bool,
    phase: InstallPhase,
}

impl<'a> InstallationEngine<'a> {
    pub fn new(root: &'a InstalledRoot, store: &'a mut BackupStore) -> Self {
        Self {
            root,
            store,
            dry_run: false,
            phase: InstallPhase::NotStarted,
        }
    }

    /// In a dry run backups and metadata are written but the game tree is left alone
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn phase(&self) -> InstallPhase {
        self.phase
    }

    /// Install `archive`, choosing the extractor from its file name
    pub fn install(&mut self, archive: &Path) -> InstallerResult<InstallReport> {
        let extractor = self.preflight(archive)?;
        self.install_with(archive, extractor.as_ref())
    }

    /// Check every precondition and pick the extractor without touching the disk
    pub fn preflight(&mut self, archive: &Path) -> InstallerResult<Box<dyn Extractor>> {
        let extractor = self
            .check_preconditions(archive)
            .and_then(|_| extractor_for(detect_archive_format(archive)));
        if extractor.is_err() {
            self.phase = InstallPhase::Failed;
        }
        extractor
    }

    /// Install `archive` using the given extractor
    pub fn install_with(
        &mut self,
        archive: &Path,
        extractor: &dyn Extractor,
    ) -> InstallerResult<InstallReport> {
        let result = self.run(archive, extractor);
        if let Err(e) = &result {
            self.phase = InstallPhase::Failed;
            logger::log_debug(
                &format!("Install failed with {}: {}", e.code(), e),
                Some("installer"),
                None,
            );
        }
        result
    }

    fn check_preconditions(&self, archive: &Path) -> InstallerResult<()> {
        if !self.root.has_been_run() {
            return Err(InstallerError::PrerequisiteNotMet(
                self.root.phone_home_marker(),
            ));
        }
        if let Some(active) = self.store.active() {
            return Err(InstallerError::AlreadyInstalled(active.version().to_string()));
        }
        if !archive.is_file() {
            return Err(InstallerError::ArchiveNotFound(archive.to_path_buf()));
        }
        Ok(())
    }

    fn run(
        &mut self,
        archive: &Path,
        extractor: &dyn Extractor,
    ) -> InstallerResult<InstallReport> {
        self.check_preconditions(archive)?;
        let version = version_from_archive(archive);

        self.phase = InstallPhase::Extracting;
        let scratch = ScratchDir::new()?;
        let files = extractor.extract_files(archive, scratch.path())?;
        check_free_space(&self.root.backup_root(), &files);

        self.phase = InstallPhase::BackingUpAndCopying;
        let mut record = self.store.create(&version)?;
        record.prepare_capture()?;
        let log_path = record.install_log_path();
        let _run_log =
            logger::attach_run_log(&log_path).map_err(|e| InstallerError::io_at(&log_path, e))?;

        logger::log_info(
            &format!(
                "Installing {} ({} package, {} files) into {}{}",
                version,
                extractor.format_name(),
                files.len(),
                self.root.root().display(),
                if self.dry_run { " [dry run]" } else { "" }
            ),
            Some("installer"),
        );

        let mut report = InstallReport {
            version: version.clone(),
            dry_run: self.dry_run,
            files_processed: files.len(),
            ..InstallReport::default()
        };
        {
            let mut session =
                CaptureSession::new(self.root, &mut record, self.dry_run, &mut report);
            session.reset_launcher_config();
            for file in &files {
                session.process_file(file);
            }
        }

        self.phase = InstallPhase::Finalizing;
        record.touch();
        // A dry run leaves nothing applied, so it never blocks the real install
        record.set_active(!self.dry_run);
        record.save()?;
        scratch.close();

        logger::log_info(
            &format!(
                "Backed up {} files, {} new, {} copied, {} warnings",
                report.backed_up, report.new_files, report.copied, report.warnings
            ),
            Some("installer"),
        );
        if self.dry_run {
            logger::log_info(
                "Dry run: game files were not modified and the version is not marked as applied.",
                Some("installer"),
            );
        }

        self.store.insert(record);
        self.phase = InstallPhase::Done;
        Ok(report)
    }
}

/// Warn when the backup volume can't hold a copy of every file the package replaces
fn check_free_space(backup_root: &Path, files: &[ExtractedFile]) {
    let needed: u64 = files
        .iter()
        .filter_map(|file| fs::metadata(&file.extracted_path).ok())
        .map(|metadata| metadata.len())
        .sum();
    let probe = backup_root
        .ancestors()
        .find(|path| path.exists())
        .unwrap_or(backup_root);

    match fs2::available_space(probe) {
        Ok(free) => {
            logger::log_debug(
                &format!(
                    "Available disk space: {:.2} GB",
                    free as f64 / (1024.0 * 1024.0 * 1024.0)
                ),
                Some("installer"),
                None,
            );
            if free < needed {
                logger::log_warn(
                    &format!(
                        "Only {} bytes free on {}, backups may need up to {} bytes",
                        free,
                        probe.display(),
                        needed
                    ),
                    Some("installer"),
                );
            }
        }
        Err(e) => logger::log_debug(
            &format!("Can't read free disk space for {}: {}", probe.display(), e),
            Some("installer"),
            None,
        ),
    }
}
