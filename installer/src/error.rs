use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error codes for every failure the installer can report.
/// These let callers (and tests) distinguish failures without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The mod archive does not exist
    ArchiveNotFound,
    /// innoextract is not installed
    ExtractionToolMissing,
    /// The extractor ran but reported failure
    ExtractionFailed,
    /// No game installation directory could be found
    InstallRootNotFound,
    /// The game has never been launched
    PrerequisiteNotMet,
    /// A mod version is already applied to the game directory
    AlreadyInstalled,
    /// Uninstall was requested with no version and nothing is active
    NoActiveVersion,
    /// The requested backup version does not exist
    BackupNotFound,
    /// Delete was requested on the currently applied version
    ActiveBackupConflict,
    /// A persisted metadata file could not be parsed
    MetadataCorrupt,
    /// Access to a privileged file was refused
    PermissionDenied,
    /// Generic filesystem failure
    FilesystemIo,
    /// Another installer process holds the backup store lock
    StoreBusy,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::ArchiveNotFound => write!(f, "archive_not_found"),
            ErrorCode::ExtractionToolMissing => write!(f, "extraction_tool_missing"),
            ErrorCode::ExtractionFailed => write!(f, "extraction_failed"),
            ErrorCode::InstallRootNotFound => write!(f, "install_root_not_found"),
            ErrorCode::PrerequisiteNotMet => write!(f, "prerequisite_not_met"),
            ErrorCode::AlreadyInstalled => write!(f, "already_installed"),
            ErrorCode::NoActiveVersion => write!(f, "no_active_version"),
            ErrorCode::BackupNotFound => write!(f, "backup_not_found"),
            ErrorCode::ActiveBackupConflict => write!(f, "active_backup_conflict"),
            ErrorCode::MetadataCorrupt => write!(f, "metadata_corrupt"),
            ErrorCode::PermissionDenied => write!(f, "permission_denied"),
            ErrorCode::FilesystemIo => write!(f, "filesystem_io"),
            ErrorCode::StoreBusy => write!(f, "store_busy"),
        }
    }
}

/// Fatal installer error.
///
/// Per-file copy and remove failures never surface here; they are logged as
/// warnings by the engines and counted in their reports.
#[derive(Debug, thiserror::Error)]
pub enum InstallerError {
    #[error("can't open mod file '{}'", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("innoextract was not found on the PATH")]
    ExtractionToolMissing,

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("game installation not found: {0}")]
    InstallRootNotFound(String),

    #[error("the game has not been launched yet (missing {})", .0.display())]
    PrerequisiteNotMet(PathBuf),

    #[error("mod version \"{0}\" is currently applied")]
    AlreadyInstalled(String),

    #[error("no mod version is currently applied")]
    NoActiveVersion,

    #[error("backup version \"{0}\" not found")]
    BackupNotFound(String),

    #[error("backup version \"{0}\" is currently applied and can't be deleted")]
    ActiveBackupConflict(String),

    #[error("error loading metadata from {}: {reason}", .path.display())]
    MetadataCorrupt { path: PathBuf, reason: String },

    #[error("permission denied opening {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{context}: {source}")]
    FilesystemIo {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("another installer process is using {}", .0.display())]
    StoreBusy(PathBuf),
}

impl InstallerError {
    /// Wrap an I/O error with a short description of what was being attempted
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        InstallerError::FilesystemIo {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O error raised while touching `path`, mapping EACCES to PermissionDenied
    pub fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            return InstallerError::PermissionDenied(path);
        }
        InstallerError::io(format!("can't access {}", path.display()), source)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            InstallerError::ArchiveNotFound(_) => ErrorCode::ArchiveNotFound,
            InstallerError::ExtractionToolMissing => ErrorCode::ExtractionToolMissing,
            InstallerError::ExtractionFailed(_) => ErrorCode::ExtractionFailed,
            InstallerError::InstallRootNotFound(_) => ErrorCode::InstallRootNotFound,
            InstallerError::PrerequisiteNotMet(_) => ErrorCode::PrerequisiteNotMet,
            InstallerError::AlreadyInstalled(_) => ErrorCode::AlreadyInstalled,
            InstallerError::NoActiveVersion => ErrorCode::NoActiveVersion,
            InstallerError::BackupNotFound(_) => ErrorCode::BackupNotFound,
            InstallerError::ActiveBackupConflict(_) => ErrorCode::ActiveBackupConflict,
            InstallerError::MetadataCorrupt { .. } => ErrorCode::MetadataCorrupt,
            InstallerError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            InstallerError::FilesystemIo { .. } => ErrorCode::FilesystemIo,
            InstallerError::StoreBusy(_) => ErrorCode::StoreBusy,
        }
    }

    /// Human-readable text printed when the program aborts
    pub fn user_message(&self) -> String {
        match self {
            InstallerError::ExtractionToolMissing => "\
In order to run this program, you must first install innoextract.
If you've got homebrew installed, you can run this command:

    brew install innoextract

If you aren't using homebrew, install innoextract from its homepage here:

    http://constexpr.org/innoextract/"
                .to_string(),
            InstallerError::InstallRootNotFound(_) => "\
I couldn't figure out where your XCOM install directory is. Please use the
--game-directory option to specify where to find it."
                .to_string(),
            InstallerError::PrerequisiteNotMet(_) => "\
I couldn't find any sign that the game has been launched. Before you install
Long War, make sure phoning home is not disabled, launch the game, and exit to
the desktop from the main menu."
                .to_string(),
            InstallerError::AlreadyInstalled(version) => format!(
                "Mod version \"{}\" is already applied. Uninstall it first with:\n\n    \
                 longwar-installer uninstall {}",
                version, version
            ),
            InstallerError::NoActiveVersion => {
                "No mod version is currently applied. Name the version to restore; \
                 use the list command to see the available versions."
                    .to_string()
            }
            InstallerError::BackupNotFound(version) => format!(
                "Sorry, version {} not found. Use the list command to list the available versions.",
                version
            ),
            InstallerError::PermissionDenied(path) => format!(
                "Permission denied opening {}. You must run this program as root to enable or \
                 disable phoning home.",
                path.display()
            ),
            other => other.to_string(),
        }
    }
}

/// Convert from std::io::Error to InstallerError.
/// Bare I/O errors carry no path, so use `io_at` where one is known.
impl From<io::Error> for InstallerError {
    fn from(err: io::Error) -> Self {
        InstallerError::io("filesystem error", err)
    }
}

/// Result type alias for installer operations
pub type InstallerResult<T> = std::result::Result<T, InstallerError>;
