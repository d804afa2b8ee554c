//! Game-tree and backup locations for an extracted file
//!
//! Every file lands in one or more namespaces. Each namespace has its own
//! live root and its own backup subdirectory, so restoring one can never
//! overwrite files belonging to another.

use std::fmt;
use std::path::{Path, PathBuf};

use super::categorizer::{Category, ExtractedFile};
use super::game_root::InstalledRoot;

/// Localization overrides inside the app bundle, flattened across languages
pub const BUNDLE_OVERRIDE_DIR: &str = "Contents/Resources/MacOverrides/XEW";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// `<root>/XCOMData/XEW`
    ModFiles,
    /// `<root>/XCOM Enemy Unknown.app`
    AppBundle,
    /// The launcher config directory outside the game root
    OsIntegration,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [
        Namespace::ModFiles,
        Namespace::AppBundle,
        Namespace::OsIntegration,
    ];

    pub fn backup_dir_name(self) -> &'static str {
        match self {
            Namespace::ModFiles => "mod-files",
            Namespace::AppBundle => "app-bundle",
            Namespace::OsIntegration => "os-integration",
        }
    }

    /// Live directory this namespace's relative keys resolve against
    pub fn live_root(self, root: &InstalledRoot) -> &Path {
        match self {
            Namespace::ModFiles => root.mod_data(),
            Namespace::AppBundle => root.app_bundle(),
            Namespace::OsIntegration => root.launcher_config_dir(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backup_dir_name())
    }
}

/// One placement of an extracted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPath {
    pub namespace: Namespace,
    /// Key within the namespace
    pub relative: PathBuf,
    pub game_path: PathBuf,
    pub backup_path: PathBuf,
}

/// Namespaces a category is placed into, mod files always first
pub fn placements(category: Category) -> &'static [Namespace] {
    match category {
        Category::OrdinaryModFile | Category::CompiledAsset => &[Namespace::ModFiles],
        Category::LocalizationOverride => &[Namespace::ModFiles, Namespace::AppBundle],
        Category::OsIntegrationFile { .. } => &[Namespace::ModFiles, Namespace::OsIntegration],
        Category::Unclassified => &[],
    }
}

/// Key of `file` within `namespace`
pub fn namespace_relative(file: &ExtractedFile, namespace: Namespace) -> PathBuf {
    match namespace {
        Namespace::ModFiles => file.relative_path.clone(),
        // Language directory is dropped; the bundle holds one flat override set
        Namespace::AppBundle => {
            let name = file.relative_path.file_name().unwrap_or_default();
            Path::new(BUNDLE_OVERRIDE_DIR).join(name)
        }
        Namespace::OsIntegration => match file.category {
            Category::OsIntegrationFile { target } => PathBuf::from(target),
            _ => PathBuf::from(file.relative_path.file_name().unwrap_or_default()),
        },
    }
}

pub fn game_path(root: &InstalledRoot, namespace: Namespace, relative: &Path) -> PathBuf {
    namespace.live_root(root).join(relative)
}

pub fn backup_path(record_root: &Path, namespace: Namespace, relative: &Path) -> PathBuf {
    record_root.join(namespace.backup_dir_name()).join(relative)
}

/// All placements of `file`, in processing order
pub fn map(root: &InstalledRoot, record_root: &Path, file: &ExtractedFile) -> Vec<MappedPath> {
    placements(file.category)
        .iter()
        .map(|&namespace| {
            let relative = namespace_relative(file, namespace);
            MappedPath {
                namespace,
                game_path: game_path(root, namespace, &relative),
                backup_path: backup_path(record_root, namespace, &relative),
                relative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn extracted(relative: &str) -> ExtractedFile {
        ExtractedFile::new(PathBuf::from(relative), Path::new("/scratch/app").join(relative))
    }

    #[test]
    fn test_ordinary_file_maps_to_mod_files_only() {
        let tmp = TempDir::new().unwrap();
        let root = InstalledRoot::open(tmp.path(), tmp.path().join("MacInit")).unwrap();
        let record = tmp.path().join("Long-War-Backups/LW15");

        let mapped = map(&root, &record, &extracted("XComGame/Config/DefaultAI.ini"));
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].namespace, Namespace::ModFiles);
        assert_eq!(
            mapped[0].game_path,
            tmp.path().join("XCOMData/XEW/XComGame/Config/DefaultAI.ini")
        );
        assert_eq!(
            mapped[0].backup_path,
            record.join("mod-files/XComGame/Config/DefaultAI.ini")
        );
    }

    #[test]
    fn test_localization_drops_language_segment() {
        let tmp = TempDir::new().unwrap();
        let root = InstalledRoot::open(tmp.path(), tmp.path().join("MacInit")).unwrap();
        let record = tmp.path().join("backups/LW15");

        let mapped = map(&root, &record, &extracted("XComGame/Localization/INT/Bar.int"));
        assert_eq!(mapped.len(), 2);

        let bundle = &mapped[1];
        assert_eq!(bundle.namespace, Namespace::AppBundle);
        assert_eq!(
            bundle.game_path,
            root.app_bundle()
                .join("Contents/Resources/MacOverrides/XEW/Bar.int")
        );
        assert!(!bundle.relative.components().any(|c| c.as_os_str() == "INT"));
        assert_eq!(
            bundle.backup_path,
            record.join("app-bundle/Contents/Resources/MacOverrides/XEW/Bar.int")
        );
    }

    #[test]
    fn test_relocated_config_uses_rename_target() {
        let tmp = TempDir::new().unwrap();
        let launcher = tmp.path().join("MacInit");
        let root = InstalledRoot::open(tmp.path(), &launcher).unwrap();
        let record = tmp.path().join("backups/LW15");

        let mapped = map(&root, &record, &extracted("XComGame/Config/DefaultGameCore.ini"));
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[1].namespace, Namespace::OsIntegration);
        assert_eq!(mapped[1].game_path, launcher.join("XComGameCore.ini"));
        assert_eq!(
            mapped[1].backup_path,
            record.join("os-integration/XComGameCore.ini")
        );
    }

    #[test]
    fn test_namespaces_never_share_backup_dirs() {
        let names: Vec<_> = Namespace::ALL.iter().map(|ns| ns.backup_dir_name()).collect();
        assert_eq!(names, vec!["mod-files", "app-bundle", "os-integration"]);
        assert!(placements(Category::Unclassified).is_empty());
    }
}
