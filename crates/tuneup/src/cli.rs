//! Command-line interface
//!
//! No subcommand drops into the interactive menu; subcommands run one
//! pipeline non-interactively and exit.

use clap::{Parser, Subcommand};

// Version is embedded at build time
pub const VERSION: &str = env!("TUNEUP_VERSION");

#[derive(Parser)]
#[command(name = "tuneup")]
#[command(about = "Ubuntu maintenance: updates, cleanup and system tweaks", long_about = None)]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Update firmware and packages, then clean up
    Update,

    /// Apply recommended kernel tunables and firewall rules
    Config,

    /// Run the update pipeline, then apply the recommended settings
    All,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["tuneup"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommands_parse() {
        assert!(matches!(
            Cli::try_parse_from(["tuneup", "update"]).unwrap().command,
            Some(Command::Update)
        ));
        assert!(matches!(
            Cli::try_parse_from(["tuneup", "config"]).unwrap().command,
            Some(Command::Config)
        ));
        assert!(matches!(
            Cli::try_parse_from(["tuneup", "all"]).unwrap().command,
            Some(Command::All)
        ));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["tuneup", "install"]).is_err());
    }
}
