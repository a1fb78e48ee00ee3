//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::action::ActionForm;

/// Read command arguments.
#[derive(Debug, Args)]
pub struct ReadCommand {
    /// Tag image file to read
    pub tag: PathBuf,

    /// Print the text without running its action
    #[arg(long)]
    pub no_dispatch: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Wait for the tag image to be presented before reading
    #[arg(short, long)]
    pub wait: bool,
}

/// Write command arguments.
#[derive(Debug, Args)]
pub struct WriteCommand {
    /// Tag image file to write
    pub tag: PathBuf,

    /// Treat the tag as read-only
    #[arg(long)]
    pub read_only: bool,

    /// The action to write
    #[command(subcommand)]
    pub action: ActionArg,
}

/// Encode command arguments.
#[derive(Debug, Args)]
pub struct EncodeCommand {
    /// Print the JSON descriptor instead of the NDEF bytes
    #[arg(long)]
    pub descriptor: bool,

    /// The action to encode
    #[command(subcommand)]
    pub action: ActionArg,
}

/// Decode command arguments.
#[derive(Debug, Args)]
pub struct DecodeCommand {
    /// NDEF message as hex
    pub hex: String,

    /// Print the text without running its action
    #[arg(long)]
    pub no_dispatch: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dispatch command arguments.
#[derive(Debug, Args)]
pub struct DispatchCommand {
    /// JSON action descriptor
    pub descriptor: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Tag image file to watch
    pub tag: PathBuf,

    /// Poll interval in milliseconds, overriding the configuration
    #[arg(short, long, value_name = "MS")]
    pub interval: Option<u64>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// An action given on the command line.
#[derive(Debug, Clone, Subcommand)]
pub enum ActionArg {
    /// A countdown timer
    Timer {
        /// Length in seconds
        #[arg(short, long)]
        duration: String,

        /// Label shown for the timer
        #[arg(short, long)]
        message: Option<String>,
    },

    /// A URL to open
    Url {
        /// The URL
        url: String,
    },
}

impl ActionArg {
    /// The form these arguments fill in.
    #[must_use]
    pub fn to_form(&self) -> ActionForm {
        match self {
            Self::Timer { duration, message } => {
                ActionForm::timer(duration.as_str(), message.as_deref().unwrap_or_default())
            }
            Self::Url { url } => ActionForm::open_url(url.as_str()),
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
