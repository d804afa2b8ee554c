use std::fmt;

/// Install progress phases, in order. `Failed` can follow any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    NotStarted,
    Extracting,
    BackingUpAndCopying,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallPhase::NotStarted => write!(f, "not started"),
            InstallPhase::Extracting => write!(f, "extracting"),
            InstallPhase::BackingUpAndCopying => write!(f, "backing up and copying"),
            InstallPhase::Finalizing => write!(f, "finalizing"),
            InstallPhase::Done => write!(f, "done"),
            InstallPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of a completed install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub version: String,
    pub dry_run: bool,
    /// Extracted files in the patch set
    pub files_processed: usize,
    /// Game files copied into the backup
    pub backed_up: usize,
    /// Placements that had no file before the install
    pub new_files: usize,
    /// Files written into the game tree
    pub copied: usize,
    /// Per-file failures that were logged and skipped
    pub warnings: usize,
}

/// Outcome of a completed uninstall
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    pub version: String,
    pub restored: usize,
    pub removed: usize,
    pub warnings: usize,
}
