use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::path_utils::{from_slash_key, to_slash_key};
use crate::error::{InstallerError, InstallerResult};
use crate::install::path_mapper::Namespace;
use crate::logger;

/// Metadata file name inside each version directory
pub const METADATA_FILE: &str = "metadata.json";

/// Schema written by this version; files without the field are version 1
pub const SCHEMA_VERSION: u32 = 2;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const INSTALL_LOG: &str = "install.log";
const UNINSTALL_LOG: &str = "uninstall.log";

fn legacy_schema() -> u32 {
    1
}

/// New-file collections as stored on disk: a list of paths in schema 1, a map since
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFileSet {
    Map(BTreeMap<String, bool>),
    List(Vec<String>),
}

fn file_set<'de, D>(deserializer: D) -> Result<BTreeMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StoredFileSet::deserialize(deserializer)? {
        StoredFileSet::Map(map) => map,
        StoredFileSet::List(list) => list.into_iter().map(|key| (key, true)).collect(),
    })
}

/// Schema 1 wrote `false` until the first install finished
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTimestamp {
    At(String),
    Never(bool),
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<StoredTimestamp>::deserialize(deserializer)? {
            Some(StoredTimestamp::At(at)) => Some(at),
            Some(StoredTimestamp::Never(_)) | None => None,
        },
    )
}

/// Persisted form of a backup record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupMetadata {
    #[serde(default = "legacy_schema")]
    pub schema_version: u32,
    pub version: String,
    #[serde(deserialize_with = "timestamp")]
    pub applied: Option<String>,
    pub installer_version: String,
    pub active: bool,
    #[serde(deserialize_with = "file_set")]
    pub new_files: BTreeMap<String, bool>,
    #[serde(deserialize_with = "file_set")]
    pub new_app_bundle_files: BTreeMap<String, bool>,
    #[serde(deserialize_with = "file_set")]
    pub new_os_integration_files: BTreeMap<String, bool>,
}

impl Default for BackupMetadata {
    fn default() -> Self {
        Self {
            schema_version: legacy_schema(),
            version: String::new(),
            applied: None,
            installer_version: String::new(),
            active: false,
            new_files: BTreeMap::new(),
            new_app_bundle_files: BTreeMap::new(),
            new_os_integration_files: BTreeMap::new(),
        }
    }
}

/// One installed (or previously installed) mod version and its backup tree
#[derive(Debug, Clone)]
pub struct BackupRecord {
    version: String,
    root: PathBuf,
    metadata: BackupMetadata,
}

impl BackupRecord {
    /// Fresh, not yet persisted record rooted at `root`
    pub fn new(version: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let version = version.into();
        Self {
            metadata: BackupMetadata {
                schema_version: SCHEMA_VERSION,
                version: version.clone(),
                installer_version: env!("CARGO_PKG_VERSION").to_string(),
                ..BackupMetadata::default()
            },
            version,
            root: root.into(),
        }
    }

    /// Load the record stored in `root`; the directory name is the version
    pub fn load(root: &Path) -> InstallerResult<Self> {
        let path = root.join(METADATA_FILE);
        let contents = fs::read_to_string(&path).map_err(|e| InstallerError::io_at(&path, e))?;
        let mut metadata: BackupMetadata =
            serde_json::from_str(&contents).map_err(|e| InstallerError::MetadataCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let version = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if metadata.version.is_empty() {
            metadata.version = version.clone();
        }

        logger::log_debug(
            &format!("Loaded metadata for {} from {}", version, path.display()),
            Some("backup"),
            None,
        );
        Ok(Self {
            version,
            root: root.to_path_buf(),
            metadata,
        })
    }

    /// Write `metadata.json` through a temp file so a crash never leaves it half written
    pub fn save(&self) -> InstallerResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| InstallerError::io_at(&self.root, e))?;

        let path = self.metadata_path();
        let tmp = self.root.join(format!("{}.tmp", METADATA_FILE));
        let json = serde_json::to_string_pretty(&self.metadata)
            .map_err(|e| InstallerError::io("serialize metadata", io::Error::other(e)))?;
        fs::write(&tmp, json).map_err(|e| InstallerError::io_at(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| InstallerError::io_at(&path, e))?;

        logger::log_debug(
            &format!("Wrote metadata to {}", path.display()),
            Some("backup"),
            None,
        );
        Ok(())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata(&self) -> &BackupMetadata {
        &self.metadata
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn is_active(&self) -> bool {
        self.metadata.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.metadata.active = active;
    }

    pub fn applied(&self) -> Option<&str> {
        self.metadata.applied.as_deref()
    }

    /// Stamp the record with the current local time and installer version
    pub fn touch(&mut self) {
        self.metadata.applied = Some(Local::now().format(TIMESTAMP_FORMAT).to_string());
        self.metadata.installer_version = env!("CARGO_PKG_VERSION").to_string();
        self.metadata.schema_version = SCHEMA_VERSION;
    }

    fn new_file_map(&self, namespace: Namespace) -> &BTreeMap<String, bool> {
        match namespace {
            Namespace::ModFiles => &self.metadata.new_files,
            Namespace::AppBundle => &self.metadata.new_app_bundle_files,
            Namespace::OsIntegration => &self.metadata.new_os_integration_files,
        }
    }

    fn new_file_map_mut(&mut self, namespace: Namespace) -> &mut BTreeMap<String, bool> {
        match namespace {
            Namespace::ModFiles => &mut self.metadata.new_files,
            Namespace::AppBundle => &mut self.metadata.new_app_bundle_files,
            Namespace::OsIntegration => &mut self.metadata.new_os_integration_files,
        }
    }

    /// Record that `relative` did not exist in `namespace` before the install
    pub fn mark_new(&mut self, namespace: Namespace, relative: &Path) {
        self.new_file_map_mut(namespace)
            .insert(to_slash_key(relative), true);
    }

    pub fn is_new(&self, namespace: Namespace, relative: &Path) -> bool {
        self.new_file_map(namespace)
            .get(&to_slash_key(relative))
            .copied()
            .unwrap_or(false)
    }

    /// New files of `namespace` as safe relative paths; unsafe keys are skipped
    pub fn new_files(&self, namespace: Namespace) -> Vec<PathBuf> {
        self.new_file_map(namespace)
            .iter()
            .filter(|(_, is_new)| **is_new)
            .filter_map(|(key, _)| {
                let path = from_slash_key(key);
                if path.is_none() {
                    logger::log_warn(
                        &format!("Ignoring unsafe path {} in {}", key, self.version),
                        Some("backup"),
                    );
                }
                path
            })
            .collect()
    }

    pub fn new_file_count(&self) -> usize {
        Namespace::ALL
            .iter()
            .map(|&namespace| self.new_file_map(namespace).len())
            .sum()
    }

    pub fn namespace_dir(&self, namespace: Namespace) -> PathBuf {
        self.root.join(namespace.backup_dir_name())
    }

    pub fn install_log_path(&self) -> PathBuf {
        self.root.join(INSTALL_LOG)
    }

    pub fn uninstall_log_path(&self) -> PathBuf {
        self.root.join(UNINSTALL_LOG)
    }

    /// Clear leftovers of an earlier capture into this directory
    pub fn prepare_capture(&mut self) -> InstallerResult<()> {
        for namespace in Namespace::ALL {
            let dir = self.namespace_dir(namespace);
            if dir.exists() {
                logger::log_debug(
                    &format!("Clearing stale backup directory {}", dir.display()),
                    Some("backup"),
                    None,
                );
                fs::remove_dir_all(&dir).map_err(|e| InstallerError::io_at(&dir, e))?;
            }
            self.new_file_map_mut(namespace).clear();
        }
        Ok(())
    }
}

impl fmt::Display for BackupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: applied at {}",
            self.version,
            self.applied().unwrap_or("unknown time")
        )
    }
}
