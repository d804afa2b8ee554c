use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Install and uninstall the Long War mod for XCOM: Enemy Within
#[derive(Debug, Parser)]
#[command(name = "longwar-installer", author, version, about)]
pub struct Cli {
    /// Print debug output to the console
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Game installation directory (searched for in the steam libraries when omitted)
    #[arg(long = "game-directory", value_name = "DIR", global = true)]
    pub game_directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install a mod package, backing up every file it replaces
    Apply {
        /// Long War installer executable or zip package
        #[arg(value_name = "MOD_FILE")]
        mod_file: PathBuf,

        /// Write backups and metadata but leave the game files alone
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// Restore the game files saved by an install
    Uninstall {
        /// Version to restore (defaults to the applied version)
        #[arg(value_name = "MOD_VERSION")]
        mod_version: Option<String>,
    },

    /// Show phone-home status and the saved backups
    List,

    /// Delete the backup of a version that is not applied
    Delete {
        #[arg(value_name = "MOD_VERSION")]
        mod_version: String,
    },

    /// Allow or block the game phoning home through the hosts file
    PhoneHome {
        #[arg(value_enum)]
        action: PhoneHomeAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhoneHomeAction {
    Enable,
    Disable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "longwar-installer",
            "--game-directory",
            "/games/xcom",
            "apply",
            "Long War Beta 15.exe",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.game_directory, Some(PathBuf::from("/games/xcom")));
        match cli.command {
            Command::Apply { mod_file, dry_run } => {
                assert_eq!(mod_file, PathBuf::from("Long War Beta 15.exe"));
                assert!(dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_uninstall_and_phone_home() {
        let cli = Cli::try_parse_from(["longwar-installer", "uninstall", "--debug"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Uninstall { mod_version: None }));

        let cli = Cli::try_parse_from(["longwar-installer", "phone-home", "disable"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::PhoneHome {
                action: PhoneHomeAction::Disable
            }
        ));

        assert!(Cli::try_parse_from(["longwar-installer", "delete"]).is_err());
    }
}
