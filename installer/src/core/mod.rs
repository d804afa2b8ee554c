pub mod app_dirs;
pub mod archive_input;
pub mod game_locator;
pub mod hosts;
pub mod path_utils;
