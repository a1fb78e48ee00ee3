//! Command-line interface for nfcaction.
//!
//! This module provides the CLI structure for the `nfcact` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ActionArg, ConfigCommand, DecodeCommand, DispatchCommand, EncodeCommand, ReadCommand,
    StatusCommand, WatchCommand, WriteCommand,
};

/// nfcact - Read, write and run NFC action tags
///
/// Tags carry a JSON action descriptor in an NDEF text record. Reading a tag
/// runs its action: starting a timer or opening a URL.
#[derive(Debug, Parser)]
#[command(name = "nfcact")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Record actions instead of launching them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a tag and run its action
    Read(ReadCommand),

    /// Write an action to a tag
    Write(WriteCommand),

    /// Print the NDEF message for an action as hex
    Encode(EncodeCommand),

    /// Decode a hex NDEF message and run its action
    Decode(DecodeCommand),

    /// Run a JSON action descriptor
    Dispatch(DispatchCommand),

    /// Run the action of every tag presented at a tag image path
    Watch(WatchCommand),

    /// Show platform and handler status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            dry_run: false,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "nfcact");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;
        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_read() {
        let cli = Cli::try_parse_from(["nfcact", "read", "tag.bin", "--no-dispatch", "--wait"])
            .unwrap();
        let Command::Read(cmd) = cli.command else {
            panic!("expected read");
        };
        assert_eq!(cmd.tag, PathBuf::from("tag.bin"));
        assert!(cmd.no_dispatch);
        assert!(cmd.wait);
        assert!(!cmd.json);
    }

    #[test]
    fn test_parse_write_timer() {
        let cli = Cli::try_parse_from([
            "nfcact", "write", "tag.bin", "timer", "--duration", "60", "-m", "Tea",
        ])
        .unwrap();
        let Command::Write(cmd) = cli.command else {
            panic!("expected write");
        };
        assert!(matches!(
            cmd.action,
            ActionArg::Timer { ref duration, message: Some(ref m) } if duration == "60" && m == "Tea"
        ));
    }

    #[test]
    fn test_parse_write_url() {
        let cli =
            Cli::try_parse_from(["nfcact", "write", "tag.bin", "url", "https://example.com"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::Write(WriteCommand {
                action: ActionArg::Url { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_parse_write_requires_action() {
        assert!(Cli::try_parse_from(["nfcact", "write", "tag.bin"]).is_err());
    }

    #[test]
    fn test_parse_encode() {
        let cli =
            Cli::try_parse_from(["nfcact", "encode", "--descriptor", "timer", "-d", "10"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Encode(EncodeCommand {
                descriptor: true,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_decode_and_dispatch() {
        let cli = Cli::try_parse_from(["nfcact", "decode", "d1010454", "--no-dispatch"]).unwrap();
        assert!(matches!(cli.command, Command::Decode(_)));

        let cli = Cli::try_parse_from(["nfcact", "dispatch", r#"{"action":"open_url"}"#]).unwrap();
        assert!(matches!(cli.command, Command::Dispatch(_)));
    }

    #[test]
    fn test_parse_watch_interval() {
        let cli = Cli::try_parse_from(["nfcact", "watch", "tag.bin", "-i", "250"]).unwrap();
        let Command::Watch(cmd) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(cmd.interval, Some(250));
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "nfcact",
            "status",
            "-c",
            "/custom/config.toml",
            "--dry-run",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_config_commands() {
        let cli = Cli::try_parse_from(["nfcact", "config", "show", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Show { json: true })
        ));
        let cli = Cli::try_parse_from(["nfcact", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }
}
