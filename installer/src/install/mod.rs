pub mod categorizer;
pub mod game_root;
pub mod installer;
pub mod path_mapper;
pub mod uninstaller;

#[cfg(test)]
pub(crate) mod test_support;

pub use game_root::InstalledRoot;
pub use installer::InstallationEngine;
pub use uninstaller::UninstallationEngine;
