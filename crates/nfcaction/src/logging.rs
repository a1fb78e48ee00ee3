//! Logging setup for nfcaction.
//!
//! `nfcact` prints tag text, hex and JSON reports on stdout, so every log
//! line goes to stderr. The `-v`/`-q` flags pick a level for the nfcaction
//! crates and `RUST_LOG`, when set, replaces that choice entirely.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log targets covered by the verbosity flags: the library, the binary and
/// the platform crates.
pub const LOG_TARGETS: [&str; 4] = ["nfcaction", "nfcact", "nfcaction_linux", "nfcaction_mac"];

/// How much `nfcact` logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Tag and dispatch events.
    #[default]
    Normal,
    /// Tag I/O and launcher decisions (`-v`).
    Verbose,
    /// Record-level NDEF parsing (`-vv`).
    Trace,
}

impl Verbosity {
    /// Pick a verbosity from a `-v` count and the `-q` flag. Quiet wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The most detailed level logged.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// `EnvFilter` directives applying this level to [`LOG_TARGETS`].
    /// Other crates stay at their default of errors only.
    #[must_use]
    pub fn directives(&self) -> String {
        let level = self.to_level_filter();
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the stderr subscriber.
///
/// Colours are used only when stderr is a terminal. Calling this again, or
/// after another subscriber was installed, has no effect.
///
/// ```no_run
/// use nfcaction::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(1, false));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    let output = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbosity != Verbosity::Normal)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(output)
        .try_init();
}

/// Send warnings and errors to the test harness output.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
