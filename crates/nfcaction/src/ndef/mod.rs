//! NDEF (NFC Data Exchange Format) encoding and decoding.
//!
//! This module implements the part of the NFC Forum NDEF format
//! needed to store an action on a tag:
//!
//! - **Records and messages**: the binary record layout with short records,
//!   id fields and chunk reassembly.
//!
//! - **Text records**: the well-known `T` record payload (status byte,
//!   language code, UTF-8 or UTF-16 text).
//!
//! # Example
//!
//! ```
//! use nfcaction::ndef::{NdefMessage, NdefRecord, TextPayload};
//!
//! let record = NdefRecord::text("en", r#"{"action":"open_url","url":"https://example.com"}"#).unwrap();
//! let message = NdefMessage::new(vec![record]).unwrap();
//!
//! let bytes = message.to_bytes();
//! let parsed = NdefMessage::parse(&bytes).unwrap();
//!
//! let text = TextPayload::decode(parsed.records()[0].payload()).unwrap();
//! assert_eq!(text.language, "en");
//! ```

mod message;
mod record;
mod text;

use thiserror::Error;

pub use message::NdefMessage;
pub use record::{NdefRecord, Tnf, RTD_TEXT, RTD_URI};
pub use text::{TextEncoding, TextPayload, MAX_LANGUAGE_CODE_LEN};

/// Largest payload accepted when parsing a record (10 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 10 * (1 << 20);

/// Errors produced while encoding or decoding NDEF data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NdefError {
    /// The input ended before a complete record was read.
    #[error("truncated NDEF data: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// Offset where the read started.
        offset: usize,
        /// Bytes the field required.
        needed: usize,
        /// Bytes remaining in the input.
        available: usize,
    },

    /// The first record did not carry the message-begin flag.
    #[error("first record is missing the message begin flag")]
    MissingMessageBegin,

    /// A record after the first one carried the message-begin flag.
    #[error("unexpected message begin flag at record {index}")]
    UnexpectedMessageBegin {
        /// Index of the offending record.
        index: usize,
    },

    /// The input ended without a record carrying the message-end flag.
    #[error("message ended without the message end flag")]
    MissingMessageEnd,

    /// Bytes followed the record carrying the message-end flag.
    #[error("{count} trailing bytes after the last record")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },

    /// A TNF value was not valid for the record it appeared on.
    #[error("invalid TNF {tnf}: {reason}")]
    InvalidTnf {
        /// The raw TNF value.
        tnf: u8,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// A chunked record sequence was malformed.
    #[error("malformed chunked record: {reason}")]
    MalformedChunk {
        /// What was wrong with the chunk sequence.
        reason: &'static str,
    },

    /// A payload exceeded [`MAX_PAYLOAD_SIZE`].
    #[error("payload of {size} bytes exceeds the 10 MiB limit")]
    PayloadTooLarge {
        /// Declared payload size.
        size: usize,
    },

    /// A message must hold at least one record.
    #[error("an NDEF message needs at least one record")]
    EmptyMessage,

    /// The record type or id was too long for its one-byte length field.
    #[error("{field} of {len} bytes exceeds 255 bytes")]
    FieldTooLong {
        /// Name of the field.
        field: &'static str,
        /// Actual length.
        len: usize,
    },

    /// The language code was too long or not ASCII.
    #[error("invalid language code '{code}': must be ASCII and at most 63 bytes")]
    InvalidLanguageCode {
        /// The rejected code.
        code: String,
    },

    /// A text record had no payload bytes at all.
    #[error("empty text record payload")]
    EmptyTextPayload,

    /// A text record payload was too short for its declared language code.
    #[error("malformed text record payload: language code length {language_len}, payload length {payload_len}")]
    MalformedTextPayload {
        /// Language code length from the status byte.
        language_len: usize,
        /// Total payload length.
        payload_len: usize,
    },
}

/// Result type for NDEF operations.
pub type Result<T> = std::result::Result<T, NdefError>;
