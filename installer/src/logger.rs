//! Console and per-run file logging
//!
//! Console output is message-only (Info, or Debug when `--debug` is given).
//! While an install or uninstall runs, every record down to Debug is also
//! written with a timestamp to that backup's `install.log` / `uninstall.log`.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Target used when a call site passes no context
const DEFAULT_CONTEXT: &str = "installer";

/// Number of rotated generations kept next to each run log
pub const LOG_BACKUP_COUNT: usize = 9;

struct RunLog {
    path: PathBuf,
    file: File,
}

struct InstallerLogger {
    debug_console: AtomicBool,
    run_log: Mutex<Option<RunLog>>,
}

static LOGGER: InstallerLogger = InstallerLogger {
    debug_console: AtomicBool::new(false),
    run_log: Mutex::new(None),
};

impl Log for InstallerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let console_level = if self.debug_console.load(Ordering::Relaxed) {
            Level::Debug
        } else {
            Level::Info
        };
        if record.level() <= console_level {
            eprintln!("{}", record.args());
        }

        if let Ok(mut guard) = self.run_log.lock() {
            if let Some(run_log) = guard.as_mut() {
                let _ = writeln!(
                    run_log.file,
                    "{} {:<7} {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.run_log.lock() {
            if let Some(run_log) = guard.as_mut() {
                let _ = run_log.file.flush();
            }
        }
    }
}

/// Install the process-wide logger. Safe to call more than once.
pub fn init(debug: bool) {
    LOGGER.debug_console.store(debug, Ordering::Relaxed);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

/// Whether debug output goes to the console
pub fn is_debug_enabled() -> bool {
    LOGGER.debug_console.load(Ordering::Relaxed)
}

fn tagged(msg: &str, source: Option<&str>) -> String {
    match source {
        Some(source) => format!("[{}] {}", source, msg),
        None => msg.to_string(),
    }
}

/// Debug record; `source` tags output relayed from an external program
pub fn log_debug(msg: &str, context: Option<&str>, source: Option<&str>) {
    log::debug!(target: context.unwrap_or(DEFAULT_CONTEXT), "{}", tagged(msg, source));
}

pub fn log_info(msg: &str, context: Option<&str>) {
    log::info!(target: context.unwrap_or(DEFAULT_CONTEXT), "{}", msg);
}

pub fn log_warn(msg: &str, context: Option<&str>) {
    log::warn!(target: context.unwrap_or(DEFAULT_CONTEXT), "{}", msg);
}

pub fn log_error(msg: &str, context: Option<&str>) {
    log::error!(target: context.unwrap_or(DEFAULT_CONTEXT), "{}", msg);
}

/// Detaches the run log it was created for when dropped
#[must_use]
pub struct RunLogGuard {
    path: PathBuf,
}

impl RunLogGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLogGuard {
    fn drop(&mut self) {
        if let Ok(mut guard) = LOGGER.run_log.lock() {
            let is_ours = guard
                .as_ref()
                .map(|run_log| run_log.path == self.path)
                .unwrap_or(false);
            if is_ours {
                if let Some(mut run_log) = guard.take() {
                    let _ = run_log.file.flush();
                }
            }
        }
    }
}

/// Start a fresh run log at `path`, rotating any previous one to `path.1`
pub fn attach_run_log(path: &Path) -> io::Result<RunLogGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    rotate_log_files(path, LOG_BACKUP_COUNT)?;

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    writeln!(
        file,
        "{} {:<7} Long War Installer, version {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        Level::Debug,
        env!("CARGO_PKG_VERSION")
    )?;

    if let Ok(mut guard) = LOGGER.run_log.lock() {
        *guard = Some(RunLog {
            path: path.to_path_buf(),
            file,
        });
    }

    Ok(RunLogGuard {
        path: path.to_path_buf(),
    })
}

fn numbered_log_path(path: &Path, generation: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", generation));
    PathBuf::from(name)
}

/// Shift `path` → `path.1` → ... → `path.<keep>`, dropping the oldest generation
pub fn rotate_log_files(path: &Path, keep: usize) -> io::Result<()> {
    if !path.exists() || keep == 0 {
        return Ok(());
    }

    let oldest = numbered_log_path(path, keep);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for generation in (1..keep).rev() {
        let from = numbered_log_path(path, generation);
        if from.exists() {
            fs::rename(&from, numbered_log_path(path, generation + 1))?;
        }
    }
    fs::rename(path, numbered_log_path(path, 1))
}
