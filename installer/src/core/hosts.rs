//! Phone-home block toggle over the hosts file
//!
//! The state is never cached: every query re-reads the file, so an enable or
//! disable earlier in the same run is always reflected.

use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{InstallerError, InstallerResult};
use crate::logger;

/// Lines that mark phone home as blocked
static BLOCK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\s*[^#\s]\S*\s+prod\.xcom\.firaxis\.com\b",
        r"^\s*[^#\s]\S*\s+prod\.xcom-ew\.firaxis\.com\b",
        r"^\s*#\s*Long-War-Installer:",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

const BLOCK_TEXT: &str = "\
# Long-War-Installer: if the following two lines are present, XCom phone home is disabled.
127.0.0.1 prod.xcom-ew.firaxis.com
127.0.0.1 prod.xcom.firaxis.com
";

fn is_block_line(line: &str) -> bool {
    BLOCK_PATTERNS.iter().any(|pattern| pattern.is_match(line))
}

/// Returns true when the game is free to phone home (no block entries present)
pub fn phone_home_enabled(hosts: &Path) -> InstallerResult<bool> {
    logger::log_debug(
        &format!("Scanning {} for unlock state", hosts.display()),
        Some("hosts"),
        None,
    );
    let contents = match fs::read_to_string(hosts) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(InstallerError::io_at(hosts, e)),
    };
    Ok(!contents.lines().any(is_block_line))
}

/// Remove every block entry from the hosts file. Returns the number of lines removed.
pub fn enable_phone_home(hosts: &Path) -> InstallerResult<usize> {
    if phone_home_enabled(hosts)? {
        logger::log_warn("Phone home is already enabled.", Some("hosts"));
        return Ok(0);
    }

    logger::log_debug("Enabling phone home...", Some("hosts"), None);
    let contents = fs::read_to_string(hosts).map_err(|e| InstallerError::io_at(hosts, e))?;

    let mut kept = String::with_capacity(contents.len());
    let mut removed = 0;
    for line in contents.lines() {
        if is_block_line(line) {
            logger::log_debug(&format!("Removing phone home line {}", line), Some("hosts"), None);
            removed += 1;
        } else {
            kept.push_str(line);
            kept.push('\n');
        }
    }

    fs::write(hosts, kept).map_err(|e| InstallerError::io_at(hosts, e))?;
    logger::log_info(
        &format!(
            "Removed {} lines from {} to enable phone home",
            removed,
            hosts.display()
        ),
        Some("hosts"),
    );
    Ok(removed)
}

/// Append the block entries to the hosts file. Returns the number of lines added.
pub fn disable_phone_home(hosts: &Path) -> InstallerResult<usize> {
    if !phone_home_enabled(hosts)? {
        logger::log_warn("Phone home is already disabled.", Some("hosts"));
        return Ok(0);
    }

    logger::log_debug("Disabling phone home...", Some("hosts"), None);
    let needs_newline = fs::read(hosts)
        .map(|bytes| bytes.last().map(|b| *b != b'\n').unwrap_or(false))
        .unwrap_or(false);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(hosts)
        .map_err(|e| InstallerError::io_at(hosts, e))?;
    if needs_newline {
        file.write_all(b"\n")
            .map_err(|e| InstallerError::io_at(hosts, e))?;
    }
    file.write_all(BLOCK_TEXT.as_bytes())
        .map_err(|e| InstallerError::io_at(hosts, e))?;

    let added = BLOCK_TEXT.lines().count();
    logger::log_info(
        &format!(
            "Added {} lines to {} to disable phone home",
            added,
            hosts.display()
        ),
        Some("hosts"),
    );
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const STOCK_HOSTS: &str = "127.0.0.1\tlocalhost\n::1 localhost\n";

    #[test]
    fn test_toggle_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let hosts = tmp.path().join("hosts");
        fs::write(&hosts, STOCK_HOSTS).unwrap();

        assert!(phone_home_enabled(&hosts).unwrap());

        assert_eq!(disable_phone_home(&hosts).unwrap(), 3);
        assert!(!phone_home_enabled(&hosts).unwrap());
        // Second disable is a no-op
        assert_eq!(disable_phone_home(&hosts).unwrap(), 0);

        assert_eq!(enable_phone_home(&hosts).unwrap(), 3);
        assert!(phone_home_enabled(&hosts).unwrap());
        assert_eq!(fs::read_to_string(&hosts).unwrap(), STOCK_HOSTS);
    }

    #[test]
    fn test_commented_entries_do_not_block() {
        let tmp = TempDir::new().unwrap();
        let hosts = tmp.path().join("hosts");
        fs::write(&hosts, "# 127.0.0.1 prod.xcom.firaxis.com\n").unwrap();
        assert!(phone_home_enabled(&hosts).unwrap());

        fs::write(&hosts, "0.0.0.0   prod.xcom-ew.firaxis.com\n").unwrap();
        assert!(!phone_home_enabled(&hosts).unwrap());
    }

    #[test]
    fn test_disable_adds_missing_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        let hosts = tmp.path().join("hosts");
        fs::write(&hosts, "127.0.0.1 localhost").unwrap();

        disable_phone_home(&hosts).unwrap();
        let contents = fs::read_to_string(&hosts).unwrap();
        assert!(contents.starts_with("127.0.0.1 localhost\n# Long-War-Installer:"));
    }
}
