pub mod backup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod install;
pub mod logger;
pub mod models;

use clap::Parser;
use std::process::ExitCode;

use cli::{Cli, Command};
use config::InstallerConfig;
use error::InstallerResult;

fn dispatch(cli: &Cli, config: &InstallerConfig) -> InstallerResult<()> {
    match &cli.command {
        Command::Apply { mod_file, dry_run } => {
            commands::apply(config, mod_file, *dry_run)?;
        }
        Command::Uninstall { mod_version } => {
            commands::uninstall(config, mod_version.as_deref())?;
        }
        Command::List => commands::list(config)?,
        Command::Delete { mod_version } => commands::delete(config, mod_version)?,
        Command::PhoneHome { action } => commands::phone_home(config, *action)?,
    }
    Ok(())
}

/// Parse the command line, run the requested command and map the outcome to an exit code
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config = InstallerConfig::from_cli(&cli);
    logger::init(config.debug);

    logger::log_debug(
        &format!(
            "Long War Installer, version {}: {:?}",
            env!("CARGO_PKG_VERSION"),
            cli.command
        ),
        Some("main"),
        None,
    );

    match dispatch(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_debug(&format!("Aborting with {}: {}", e.code(), e), Some("main"), None);
            logger::log_error(&e.user_message(), Some("main"));
            ExitCode::FAILURE
        }
    }
}
