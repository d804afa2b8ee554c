//! Unpacking the mod package into a scratch directory

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::core::archive_input::ArchiveFormat;
use crate::core::path_utils::{relative_to, sanitize_path};
use crate::error::{InstallerError, InstallerResult};
use crate::install::categorizer::{Category, ExtractedFile};
use crate::logger;

/// Prefix of the scratch directory created in the system temp dir
pub const SCRATCH_PREFIX: &str = "LongWarInstaller_";

/// Payload subtree inside an unpacked Inno Setup package
const PAYLOAD_ROOT: &str = "app";

/// Windows-only extras shipped alongside the payload
const SKIP_DIRECTORY: &str = "Long War Files";

const INNOEXTRACT: &str = "innoextract";

/// Unpacks one package format into a directory
pub trait Extractor {
    fn format_name(&self) -> &'static str;

    /// Unpack `archive` into `out_dir`, which already exists
    fn extract(&self, archive: &Path, out_dir: &Path) -> InstallerResult<()>;

    /// Unpack and list the files that belong in the patch set
    fn extract_files(
        &self,
        archive: &Path,
        out_dir: &Path,
    ) -> InstallerResult<Vec<ExtractedFile>> {
        logger::log_info(
            &format!("Extracting {} ...", archive.display()),
            Some("extraction"),
        );
        self.extract(archive, out_dir)?;
        scan_extracted(out_dir)
    }
}

/// Runs the external innoextract tool
pub struct InnoExtractor {
    tool: PathBuf,
}

impl InnoExtractor {
    /// Locate innoextract on the PATH
    pub fn locate() -> InstallerResult<Self> {
        let tool = which::which(INNOEXTRACT).map_err(|_| InstallerError::ExtractionToolMissing)?;
        logger::log_debug(&format!("Using {}", tool.display()), Some("extraction"), None);
        Ok(Self { tool })
    }
}

impl Extractor for InnoExtractor {
    fn format_name(&self) -> &'static str {
        ArchiveFormat::InnoSetup.as_str()
    }

    fn extract(&self, archive: &Path, out_dir: &Path) -> InstallerResult<()> {
        let mut command = Command::new(&self.tool);
        command
            .args(["-e", "--progress=0", "--color=0", "-s"])
            .arg(archive)
            .current_dir(out_dir);
        if !logger::is_debug_enabled() {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let rendered = format!(
            "{} -e --progress=0 --color=0 -s {}",
            INNOEXTRACT,
            archive.display()
        );
        logger::log_debug(
            &format!("Running {}", rendered),
            Some("extraction"),
            Some(INNOEXTRACT),
        );

        let status = command
            .status()
            .map_err(|e| InstallerError::io(format!("can't run {}", INNOEXTRACT), e))?;
        if !status.success() {
            let code = status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "a signal".to_string());
            return Err(InstallerError::ExtractionFailed(format!(
                "Running \"{}\" returned {}!",
                rendered, code
            )));
        }
        Ok(())
    }
}

/// Unpacks zip packages in-process
pub struct ZipExtractor;

impl ZipExtractor {
    fn unzip(archive: &Path, out_dir: &Path) -> Result<usize> {
        let file = File::open(archive)
            .with_context(|| format!("Failed to open {}", archive.display()))?;
        let mut zip = ZipArchive::new(file)
            .with_context(|| format!("{} is not a valid zip archive", archive.display()))?;

        let mut extracted = 0;
        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .with_context(|| format!("Failed to read zip entry {}", i))?;

            let relative = match entry.enclosed_name().and_then(|p| sanitize_path(&p)) {
                Some(relative) => relative,
                None => {
                    logger::log_debug(
                        &format!("Skipping zip entry with unsafe path: {}", entry.name()),
                        Some("extraction"),
                        None,
                    );
                    continue;
                }
            };

            let target = out_dir.join(&relative);
            if entry.is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create {}", target.display()))?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let mut out = File::create(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            io::copy(&mut entry, &mut out)
                .with_context(|| format!("Failed to extract {}", relative.display()))?;
            extracted += 1;
        }
        Ok(extracted)
    }
}

impl Extractor for ZipExtractor {
    fn format_name(&self) -> &'static str {
        ArchiveFormat::Zip.as_str()
    }

    fn extract(&self, archive: &Path, out_dir: &Path) -> InstallerResult<()> {
        let count = Self::unzip(archive, out_dir)
            .map_err(|e| InstallerError::ExtractionFailed(format!("{:#}", e)))?;
        logger::log_debug(&format!("Unzipped {} files", count), Some("extraction"), None);
        Ok(())
    }
}

/// Pick the extractor for a package format
pub fn extractor_for(format: ArchiveFormat) -> InstallerResult<Box<dyn Extractor>> {
    match format {
        ArchiveFormat::InnoSetup => Ok(Box::new(InnoExtractor::locate()?)),
        ArchiveFormat::Zip => Ok(Box::new(ZipExtractor)),
    }
}

/// Scratch directory that is removed on drop, or explicitly through `close`
pub struct ScratchDir {
    dir: tempfile::TempDir,
}

impl ScratchDir {
    pub fn new() -> InstallerResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| InstallerError::io("can't create temporary directory", e))?;
        logger::log_debug(
            &format!("Created temporary directory {}", dir.path().display()),
            Some("extraction"),
            None,
        );
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory, logging rather than failing if that doesn't work
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => logger::log_debug(
                &format!("Removed temporary directory {}", path.display()),
                Some("extraction"),
                None,
            ),
            Err(e) => logger::log_warn(
                &format!("Can't remove temporary directory {}: {}", path.display(), e),
                Some("extraction"),
            ),
        }
    }
}

/// Collect the patch set from an extraction root, sorted by category then path
pub fn scan_extracted(extract_root: &Path) -> InstallerResult<Vec<ExtractedFile>> {
    let app_root = extract_root.join(PAYLOAD_ROOT);
    let payload = if app_root.is_dir() {
        app_root
    } else {
        extract_root.to_path_buf()
    };

    let mut files = Vec::new();
    let walker = WalkDir::new(&payload)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != SKIP_DIRECTORY);
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(&payload).to_path_buf();
            match e.into_io_error() {
                Some(source) => InstallerError::io_at(path, source),
                None => InstallerError::ExtractionFailed(format!(
                    "filesystem loop under {}",
                    path.display()
                )),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match relative_to(entry.path(), &payload) {
            Some(relative) => relative,
            None => continue,
        };
        let file = ExtractedFile::new(relative, entry.path().to_path_buf());
        if file.category == Category::Unclassified {
            logger::log_debug(
                &format!("Skipping file {}", file.relative_path.display()),
                Some("extraction"),
                None,
            );
            continue;
        }
        files.push(file);
    }

    files.sort_by(|a, b| {
        (a.category.rank(), &a.relative_path).cmp(&(b.category.rank(), &b.relative_path))
    });
    logger::log_debug(
        &format!("Found {} files to install", files.len()),
        Some("extraction"),
        None,
    );
    Ok(files)
}
