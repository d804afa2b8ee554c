use std::path::Path;

/// Package formats the installer knows how to unpack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Inno Setup installer executable, unpacked by innoextract
    InnoSetup,
    Zip,
}

impl ArchiveFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveFormat::InnoSetup => "inno",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Pick the unpacker for `path` from its extension.
/// Anything that isn't a zip is handed to innoextract, which rejects non-Inno files itself.
pub fn detect_archive_format(path: &Path) -> ArchiveFormat {
    let is_zip = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    if is_zip {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::InnoSetup
    }
}

/// Derive the mod version identifier from the archive's file name.
/// The identifier doubles as the backup directory name, so spaces become underscores.
pub fn version_from_archive(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace(' ', "_"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_archive_format() {
        assert_eq!(
            detect_archive_format(Path::new("/tmp/Long War Beta 15.exe")),
            ArchiveFormat::InnoSetup
        );
        assert_eq!(
            detect_archive_format(Path::new("/tmp/LongWar.ZIP")),
            ArchiveFormat::Zip
        );
        assert_eq!(
            detect_archive_format(Path::new("/tmp/noextension")),
            ArchiveFormat::InnoSetup
        );
    }

    #[test]
    fn test_version_from_archive() {
        assert_eq!(
            version_from_archive(Path::new("/downloads/Long War Beta 15f2.exe")),
            "Long_War_Beta_15f2"
        );
        assert_eq!(version_from_archive(Path::new("LongWar_EW.zip")), "LongWar_EW");
    }
}
