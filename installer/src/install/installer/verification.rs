//! Copy helpers with inline CRC32 verification
//!
//! Backups are the only way back to the stock game, so every copy is read
//! back and compared against the checksum taken while writing.

use anyhow::{bail, Context, Result};
use crc32fast::Hasher;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::logger;

/// Buffer size for streaming copies
const IO_BUFFER_SIZE: usize = 1024 * 1024;

/// Copy `reader` into `writer`, returning (bytes_written, crc32)
pub(crate) fn copy_file_with_crc32<R: Read + ?Sized, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> std::io::Result<(u64, u32)> {
    let mut buffer = vec![0u8; IO_BUFFER_SIZE];
    let mut total_bytes = 0u64;
    let mut hasher = Hasher::new();
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        writer.write_all(&buffer[..bytes_read])?;
        total_bytes += bytes_read as u64;
    }
    Ok((total_bytes, hasher.finalize()))
}

/// CRC32 of a file's contents
pub(crate) fn file_crc32(path: &Path) -> Result<u32> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::with_capacity(IO_BUFFER_SIZE, file);
    let (_, crc) = copy_file_with_crc32(&mut reader, &mut std::io::sink())
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(crc)
}

/// Copy `source` to `target`, creating parent directories, and verify the written bytes
pub(crate) fn verified_copy(source: &Path, target: &Path) -> Result<u32> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let input =
        File::open(source).with_context(|| format!("Failed to open {}", source.display()))?;
    let output =
        File::create(target).with_context(|| format!("Failed to create {}", target.display()))?;

    let mut reader = BufReader::with_capacity(IO_BUFFER_SIZE, input);
    let mut writer = BufWriter::with_capacity(IO_BUFFER_SIZE, output);
    let (bytes, expected) = copy_file_with_crc32(&mut reader, &mut writer).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            source.display(),
            target.display()
        )
    })?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", target.display()))?;
    drop(writer);

    let actual = file_crc32(target)?;
    if actual != expected {
        bail!(
            "Checksum mismatch after copying {} ({} bytes): expected {:08x}, got {:08x}",
            target.display(),
            bytes,
            expected,
            actual
        );
    }
    Ok(expected)
}

/// Best-effort copy; failures are logged as warnings. Returns whether the copy succeeded.
pub(crate) fn copy_or_warn(source: &Path, target: &Path, context: &str) -> bool {
    logger::log_debug(
        &format!("Copying {} to {}", source.display(), target.display()),
        Some(context),
        None,
    );
    match verified_copy(source, target) {
        Ok(_) => true,
        Err(e) => {
            logger::log_warn(
                &format!(
                    "Error copying {} to {}: {:#}",
                    source.display(),
                    target.display(),
                    e
                ),
                Some(context),
            );
            false
        }
    }
}

/// Best-effort removal; a missing file is a warning. Returns whether the file was removed.
pub(crate) fn remove_or_warn(path: &Path, context: &str) -> bool {
    logger::log_debug(&format!("Removing {}", path.display()), Some(context), None);
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            logger::log_warn(
                &format!("Error removing {}: {}", path.display(), e),
                Some(context),
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_file_with_crc32() {
        let data = b"XComGame.upk contents";
        let mut out = Vec::new();
        let (bytes, crc) = copy_file_with_crc32(&mut &data[..], &mut out).unwrap();
        assert_eq!(bytes, data.len() as u64);
        assert_eq!(out, data);
        assert_eq!(crc, crc32fast::hash(data));
    }

    #[test]
    fn test_verified_copy_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("DefaultGameCore.ini");
        fs::write(&source, "[XComGame.XGTacticalGameCore]\n").unwrap();
        let target = tmp.path().join("backup/mod-files/XComGame/Config/DefaultGameCore.ini");

        let crc = verified_copy(&source, &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), fs::read(&source).unwrap());
        assert_eq!(crc, file_crc32(&source).unwrap());
    }

    #[test]
    fn test_best_effort_helpers() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.ini");
        assert!(!copy_or_warn(&missing, &tmp.path().join("out.ini"), "test"));
        assert!(!remove_or_warn(&missing, "test"));

        fs::write(&missing, "now here").unwrap();
        assert!(remove_or_warn(&missing, "test"));
        assert!(!missing.exists());
    }
}
