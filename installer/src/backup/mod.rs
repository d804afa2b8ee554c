//! Backup store: one record per installed mod version
//!
//! Layout under the game root:
//!
//! ```text
//! Long-War-Backups/
//!   .lock
//!   <version>/
//!     metadata.json
//!     install.log, uninstall.log (+ .1 .. .9)
//!     mod-files/...
//!     app-bundle/...
//!     os-integration/...
//! ```
//!
//! The scan taken at startup is the source of truth for which version is
//! currently applied.

pub mod lock;
pub mod record;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InstallerError, InstallerResult};
use crate::logger;

pub use lock::StoreLock;
pub use record::{BackupMetadata, BackupRecord, METADATA_FILE};

/// Reserved for release packaging, never a backup
const SKIP_DIRECTORY: &str = "dist";

#[derive(Debug)]
pub struct BackupStore {
    root: PathBuf,
    records: BTreeMap<String, BackupRecord>,
}

impl BackupStore {
    /// Load every version directory under `root` that holds a metadata file
    pub fn scan(root: impl Into<PathBuf>) -> InstallerResult<Self> {
        let root = root.into();
        let mut records = BTreeMap::new();

        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logger::log_debug(
                    &format!("No backup directory at {}", root.display()),
                    Some("backup"),
                    None,
                );
                return Ok(Self { root, records });
            }
            Err(e) => return Err(InstallerError::io_at(&root, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| InstallerError::io_at(&root, e))?;
            let path = entry.path();
            if !path.is_dir() || entry.file_name() == SKIP_DIRECTORY {
                continue;
            }
            if !path.join(METADATA_FILE).is_file() {
                logger::log_debug(
                    &format!("Ignoring {}: no {}", path.display(), METADATA_FILE),
                    Some("backup"),
                    None,
                );
                continue;
            }

            let record = BackupRecord::load(&path)?;
            records.insert(record.version().to_string(), record);
        }

        let active: Vec<&str> = records
            .values()
            .filter(|record| record.is_active())
            .map(BackupRecord::version)
            .collect();
        if active.len() > 1 {
            return Err(InstallerError::MetadataCorrupt {
                path: root.clone(),
                reason: format!("more than one active version: {}", active.join(", ")),
            });
        }

        logger::log_debug(
            &format!("Found {} backup(s) in {}", records.len(), root.display()),
            Some("backup"),
            None,
        );
        Ok(Self { root, records })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    pub fn get(&self, version: &str) -> InstallerResult<&BackupRecord> {
        self.records
            .get(version)
            .ok_or_else(|| InstallerError::BackupNotFound(version.to_string()))
    }

    pub fn get_mut(&mut self, version: &str) -> InstallerResult<&mut BackupRecord> {
        self.records
            .get_mut(version)
            .ok_or_else(|| InstallerError::BackupNotFound(version.to_string()))
    }

    pub fn active(&self) -> Option<&BackupRecord> {
        self.records.values().find(|record| record.is_active())
    }

    /// All records, ordered by version
    pub fn records(&self) -> impl Iterator<Item = &BackupRecord> {
        self.records.values()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Start a new record for `version`. Nothing is written until the record is saved.
    pub fn create(&self, version: &str) -> InstallerResult<BackupRecord> {
        if let Some(active) = self.active() {
            return Err(InstallerError::AlreadyInstalled(active.version().to_string()));
        }
        if self.records.contains_key(version) {
            logger::log_debug(
                &format!("Replacing inactive backup {}", version),
                Some("backup"),
                None,
            );
        }
        Ok(BackupRecord::new(version, self.version_dir(version)))
    }

    /// Put a finalized record into the store, replacing any earlier one of the same version
    pub fn insert(&mut self, record: BackupRecord) {
        self.records.insert(record.version().to_string(), record);
    }

    /// Remove an inactive version and everything saved under it
    pub fn delete(&mut self, version: &str) -> InstallerResult<()> {
        let record = self.get(version)?;
        if record.is_active() {
            return Err(InstallerError::ActiveBackupConflict(version.to_string()));
        }

        let dir = record.root().to_path_buf();
        logger::log_info(&format!("Deleting {}", dir.display()), Some("backup"));
        fs::remove_dir_all(&dir).map_err(|e| InstallerError::io_at(&dir, e))?;
        self.records.remove(version);
        Ok(())
    }

    /// Lock the store at `root` for a mutating command, then scan it
    pub fn lock(root: impl Into<PathBuf>) -> InstallerResult<(Self, StoreLock)> {
        let root = root.into();
        let lock = StoreLock::acquire(&root)?;
        let store = Self::scan(root)?;
        Ok((store, lock))
    }
}
