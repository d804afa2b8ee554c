//! Fixtures shared by the install and uninstall tests

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::game_root::InstalledRoot;
use crate::backup::BackupStore;

/// Write a zip archive named `name` into `dir` with the given (path, contents) entries
pub fn build_zip(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    for (entry, contents) in entries {
        zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

/// A fake game installation in a temp directory
pub struct GameFixture {
    _tmp: TempDir,
    root: InstalledRoot,
    downloads: PathBuf,
}

impl GameFixture {
    /// A game that has been launched once
    pub fn new() -> Self {
        let fixture = Self::never_run();
        fs::create_dir_all(fixture.root.phone_home_marker()).unwrap();
        fixture
    }

    pub fn never_run() -> Self {
        let tmp = TempDir::new().unwrap();
        let game = tmp.path().join("XCom-Enemy-Unknown");
        let launcher = tmp.path().join("MacInit");
        fs::create_dir_all(&game).unwrap();
        fs::create_dir_all(&launcher).unwrap();
        let root = InstalledRoot::open(&game, &launcher).unwrap();
        fs::create_dir_all(root.mod_data()).unwrap();
        fs::create_dir_all(root.app_bundle()).unwrap();

        Self {
            downloads: tmp.path().join("Downloads"),
            _tmp: tmp,
            root,
        }
    }

    pub fn root(&self) -> &InstalledRoot {
        &self.root
    }

    pub fn downloads(&self) -> &Path {
        &self.downloads
    }

    pub fn store(&self) -> BackupStore {
        BackupStore::scan(self.root.backup_root()).unwrap()
    }

    pub fn mod_file(&self, relative: &str) -> PathBuf {
        self.root.mod_data().join(relative)
    }

    pub fn write_mod_file(&self, relative: &str, contents: &str) {
        let path = self.mod_file(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn read_mod_file(&self, relative: &str) -> String {
        fs::read_to_string(self.mod_file(relative)).unwrap()
    }

    pub fn write_launcher_file(&self, name: &str, contents: &str) {
        fs::write(self.root.launcher_config_dir().join(name), contents).unwrap();
    }
}
