//! Shared path helpers
//!
//! Relative paths are persisted with `/` separators regardless of platform and
//! are sanitized on the way back in so a hand-edited metadata file can never
//! point a restore or delete outside its namespace.

use std::path::{Component, Path, PathBuf};

/// Sanitize a relative path to prevent path traversal attacks.
/// Returns None if the path is unsafe (contains `..` or is absolute) or empty.
pub fn sanitize_path(path: &Path) -> Option<PathBuf> {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(c) => result.push(c),
            Component::CurDir => {}              // Skip "."
            Component::ParentDir => return None, // Reject ".."
            Component::Prefix(_) | Component::RootDir => return None, // Reject absolute paths
        }
    }
    if result.as_os_str().is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Render a relative path as a `/`-separated key
pub fn to_slash_key(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(c) => Some(c.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse a `/`-separated key back into a safe relative path
pub fn from_slash_key(key: &str) -> Option<PathBuf> {
    let path: PathBuf = key.split(['/', '\\']).collect();
    sanitize_path(&path)
}

/// Path of `path` below `base`, if it is below it
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(Path::to_path_buf)
}

/// Append a suffix to the final component, e.g. `Foo.upk` → `Foo.upk.uncompressed_size`
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_normal() {
        let result = sanitize_path(Path::new("./XComGame/./Config/DefaultGameCore.ini"));
        assert_eq!(result, Some(PathBuf::from("XComGame/Config/DefaultGameCore.ini")));
    }

    #[test]
    fn test_sanitize_path_rejects_traversal() {
        assert!(sanitize_path(Path::new("XComGame/../../etc/passwd")).is_none());
        assert!(sanitize_path(Path::new("/etc/passwd")).is_none());
        assert!(sanitize_path(Path::new("")).is_none());
    }

    #[test]
    fn test_slash_keys() {
        let path = Path::new("XComGame").join("CookedPCConsole").join("XComGame.upk");
        let key = to_slash_key(&path);
        assert_eq!(key, "XComGame/CookedPCConsole/XComGame.upk");
        assert_eq!(from_slash_key(&key), Some(path));
        assert!(from_slash_key("../outside.ini").is_none());
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("a/Foo.upk"), ".uncompressed_size"),
            PathBuf::from("a/Foo.upk.uncompressed_size")
        );
    }
}
