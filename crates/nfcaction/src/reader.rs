//! Reading action text from tags.

use thiserror::Error;
use tracing::{debug, warn};

use crate::ndef::{NdefError, NdefMessage, TextPayload};
use crate::tag::{NdefTag, TagError};

/// Why no text could be read from a tag.
///
/// The display strings are the status lines shown to the user.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The tag has no NDEF support.
    #[error("This tag does not support NDEF.")]
    NotNdef,

    /// The tag is formatted but holds no message.
    #[error("Tag is NDEF formatted but the message is empty.")]
    EmptyTag,

    /// The tag could not be read.
    #[error("Reading the tag failed.")]
    Io(#[source] TagError),

    /// A message was expected but none was delivered.
    #[error("No NDEF message found.")]
    NoMessage,

    /// The first record is not a text record.
    #[error("The first record is not a text record.")]
    NotText,

    /// The text record payload is empty.
    #[error("Empty text record payload")]
    EmptyPayload,

    /// The text record payload is shorter than its header says.
    #[error("Malformed text record payload")]
    MalformedPayload,
}

impl ReadError {
    /// Detail suitable for a secondary notice, when the cause carries one.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Io(source) => Some(source.to_string()),
            _ => None,
        }
    }
}

/// Read the message stored on `tag`.
///
/// `tag` is `None` when the presented tag has no NDEF support.
///
/// # Errors
///
/// Returns [`ReadError::NotNdef`] without a tag, [`ReadError::Io`] when the
/// tag cannot be read and [`ReadError::EmptyTag`] when it is blank.
pub fn read_tag(tag: Option<&mut dyn NdefTag>) -> Result<NdefMessage, ReadError> {
    let Some(tag) = tag else {
        return Err(ReadError::NotNdef);
    };

    let result = tag.connect().and_then(|()| tag.ndef_message());
    tag.close();

    match result {
        Ok(Some(message)) => {
            debug!(records = message.records().len(), "Read NDEF message");
            Ok(message)
        }
        Ok(None) => Err(ReadError::EmptyTag),
        Err(e) => {
            warn!(error = %e, "Tag read failed");
            Err(ReadError::Io(e))
        }
    }
}

/// Extract the text of the first record of `message`.
///
/// Later records are ignored.
///
/// # Errors
///
/// Returns [`ReadError::NotText`] when the first record is not a text
/// record, and [`ReadError::EmptyPayload`] or
/// [`ReadError::MalformedPayload`] when its payload cannot be decoded.
pub fn parse_ndef_message(message: &NdefMessage) -> Result<TextPayload, ReadError> {
    let record = message.first();
    if !record.is_text() {
        debug!(tnf = %record.tnf(), "First record is not text");
        return Err(ReadError::NotText);
    }

    TextPayload::decode(record.payload()).map_err(|e| match e {
        NdefError::EmptyTextPayload => ReadError::EmptyPayload,
        _ => ReadError::MalformedPayload,
    })
}
