use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{InstallerError, InstallerResult};
use crate::logger;

const LOCK_FILE: &str = ".lock";

/// Exclusive advisory lock over a backup store, released on drop
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    file: File,
}

impl StoreLock {
    /// Take the lock without waiting; a second holder gets `StoreBusy`
    pub fn acquire(backup_root: &Path) -> InstallerResult<Self> {
        fs::create_dir_all(backup_root).map_err(|e| InstallerError::io_at(backup_root, e))?;

        let path = backup_root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| InstallerError::io_at(&path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(InstallerError::StoreBusy(path));
        }

        logger::log_debug(&format!("Locked {}", path.display()), Some("backup"), None);
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_holder_is_refused() {
        let tmp = TempDir::new().unwrap();
        let first = StoreLock::acquire(tmp.path()).unwrap();
        assert!(first.path().exists());

        let second = StoreLock::acquire(tmp.path());
        assert!(matches!(second, Err(InstallerError::StoreBusy(_))));

        drop(first);
        assert!(StoreLock::acquire(tmp.path()).is_ok());
    }
}
