//! Classification of extracted mod files
//!
//! The category decides where a file is placed in the game tree and which
//! backup namespaces it touches. Classification only looks at the relative
//! path, never at file contents.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Directory holding compiled Unreal packages
const COOKED_PC: &str = "CookedPCConsole";

/// Directory holding per-language string tables
const LOCALIZATION: &str = "Localization";

/// Top-level directory of the mod payload proper
const GAME_DIRECTORY: &str = "XComGame";

/// Config files the mac launcher reads from its own directory under a different name
const RENAME_PATHS: [(&str, &str); 2] = [
    ("XComGame/Config/DefaultGameCore.ini", "XComGameCore.ini"),
    ("XComGame/Config/DefaultLoadouts.ini", "XComLoadouts.ini"),
];

/// Loose documentation shipped next to the payload
const LOOSE_EXTENSIONS: [&str; 2] = ["txt", "jpg"];

const LOCALIZATION_EXTENSIONS: [&str; 2] = ["int", "esn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    OrdinaryModFile,
    /// `.upk` package; may carry an `.uncompressed_size` sidecar in the game tree
    CompiledAsset,
    /// String table that is also copied into the app bundle overrides
    LocalizationOverride,
    /// Config file that is also installed into the launcher config directory
    OsIntegrationFile { target: &'static str },
    Unclassified,
}

impl Category {
    /// Processing order: packages first, loose files last
    pub fn rank(&self) -> u8 {
        match self {
            Category::CompiledAsset => 0,
            Category::LocalizationOverride => 1,
            Category::OsIntegrationFile { .. } => 2,
            Category::OrdinaryModFile => 3,
            Category::Unclassified => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::OrdinaryModFile => write!(f, "mod file"),
            Category::CompiledAsset => write!(f, "compiled asset"),
            Category::LocalizationOverride => write!(f, "localization override"),
            Category::OsIntegrationFile { target } => write!(f, "launcher config ({})", target),
            Category::Unclassified => write!(f, "unclassified"),
        }
    }
}

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| candidates.iter().any(|c| ext.eq_ignore_ascii_case(c)))
        .unwrap_or(false)
}

fn has_component(path: &Path, name: &str) -> bool {
    path.components()
        .any(|component| matches!(component, Component::Normal(c) if c == name))
}

fn rename_target(path: &Path) -> Option<&'static str> {
    RENAME_PATHS
        .iter()
        .find(|(source, _)| Path::new(source) == path)
        .map(|(_, target)| *target)
}

/// Classify a path relative to the payload root
pub fn categorize(relative: &Path) -> Category {
    if has_component(relative, COOKED_PC) && has_extension(relative, &["upk"]) {
        return Category::CompiledAsset;
    }
    if has_component(relative, LOCALIZATION) && has_extension(relative, &LOCALIZATION_EXTENSIONS) {
        return Category::LocalizationOverride;
    }
    if let Some(target) = rename_target(relative) {
        return Category::OsIntegrationFile { target };
    }
    if relative.starts_with(GAME_DIRECTORY) || has_extension(relative, &LOOSE_EXTENSIONS) {
        return Category::OrdinaryModFile;
    }
    Category::Unclassified
}

/// A file unpacked into the scratch directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Path relative to the payload root
    pub relative_path: PathBuf,
    /// Absolute path inside the scratch directory
    pub extracted_path: PathBuf,
    pub category: Category,
}

impl ExtractedFile {
    pub fn new(relative_path: PathBuf, extracted_path: PathBuf) -> Self {
        let category = categorize(&relative_path);
        Self {
            relative_path,
            extracted_path,
            category,
        }
    }

    pub fn is_compiled_asset(&self) -> bool {
        self.category == Category::CompiledAsset
    }

    pub fn is_localization_override(&self) -> bool {
        self.category == Category::LocalizationOverride
    }

    pub fn is_relocated_config(&self) -> bool {
        matches!(self.category, Category::OsIntegrationFile { .. })
    }
}
