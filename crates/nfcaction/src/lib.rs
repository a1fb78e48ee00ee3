//! `nfcaction` - NFC tags that carry actions
//!
//! A tag holds one NDEF text record whose text is a small JSON descriptor,
//! for example `{"action":"set_timer","duration":60,"message":"Tea"}` or
//! `{"action":"open_url","url":"https://example.com"}`. This library reads
//! and writes such tags and hands their actions to the host.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod action;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod ndef;
pub mod reader;
pub mod session;
pub mod tag;
pub mod watch;

pub use action::{Action, ActionForm, ActionKind};
pub use config::Config;
pub use dispatch::{
    ActionDispatcher, DispatchOptions, DispatchOutcome, DispatchReport, Intent, Launcher,
};
pub use error::{Error, Result};
pub use launcher::{HostLauncher, RecordingLauncher, SystemLauncher};
pub use logging::init_logging;
pub use ndef::{NdefMessage, NdefRecord, TextPayload};
pub use session::{PresentedTag, Session, SessionReport, TagIntent};
pub use tag::{FileTag, FileTagOptions, NdefTag, WriteResult};
pub use watch::{TagWatcher, WatchHandle};
