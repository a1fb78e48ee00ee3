//! Tag access.
//!
//! [`NdefTag`] is the seam between the action pipeline and whatever holds
//! the NDEF message: a tag image file on the host, or an in-memory tag in
//! tests. Implementations follow the connect / operate / close lifecycle of
//! an NFC tag technology handle.

mod file;
mod tlv;
mod writer;

use thiserror::Error;

use crate::ndef::{NdefError, NdefMessage};

pub use file::{FileTag, FileTagOptions};
pub use writer::{write, WriteResult};

/// Errors raised by tag operations.
#[derive(Debug, Error)]
pub enum TagError {
    /// Communication with the tag failed.
    #[error("tag I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored message is not valid NDEF.
    #[error("tag content is not valid NDEF: {0}")]
    Format(#[from] NdefError),

    /// The tag memory layout (TLV area) is corrupt.
    #[error("malformed tag memory: {reason}")]
    Tlv {
        /// What was wrong with the layout.
        reason: String,
    },

    /// An operation needing a connection ran before `connect`.
    #[error("tag is not connected")]
    NotConnected,

    /// The tag refuses writes.
    #[error("tag is read-only")]
    ReadOnly,

    /// The message does not fit on the tag.
    #[error("message of {needed} bytes exceeds the tag capacity of {capacity} bytes")]
    Capacity {
        /// Size of the message.
        needed: usize,
        /// Usable size of the tag.
        capacity: usize,
    },
}

impl TagError {
    /// Create a TLV layout error.
    #[must_use]
    pub fn tlv(reason: impl Into<String>) -> Self {
        Self::Tlv {
            reason: reason.into(),
        }
    }

    /// Check if this error concerns the data format rather than the transport.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Tlv { .. })
    }
}

/// Result type for tag operations.
pub type Result<T> = std::result::Result<T, TagError>;

/// An NDEF-capable tag.
pub trait NdefTag: std::fmt::Debug + Send {
    /// Open the connection. Must precede every other operation except
    /// [`close`](Self::close).
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be reached.
    fn connect(&mut self) -> Result<()>;

    /// Whether the tag accepts writes.
    fn is_writable(&self) -> bool;

    /// Largest NDEF message, in bytes, the tag can store.
    fn max_size(&self) -> usize;

    /// Read the stored message, `None` when the tag is blank.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be read or its content is invalid.
    fn ndef_message(&mut self) -> Result<Option<NdefMessage>>;

    /// Replace the stored message.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is read-only, too small, or unreachable.
    fn write_ndef_message(&mut self, message: &NdefMessage) -> Result<()>;

    /// Release the connection. Safe to call more than once.
    fn close(&mut self);
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory tag for tests.

    use super::{NdefTag, Result, TagError};
    use crate::ndef::NdefMessage;

    #[derive(Debug, Default)]
    pub struct MemoryTag {
        pub message: Option<NdefMessage>,
        pub read_only: bool,
        pub capacity: usize,
        pub connected: bool,
        pub fail_io: bool,
        pub closes: usize,
    }

    impl MemoryTag {
        pub fn blank(capacity: usize) -> Self {
            Self {
                capacity,
                ..Self::default()
            }
        }

        pub fn with_message(message: NdefMessage) -> Self {
            Self {
                message: Some(message),
                capacity: 1024,
                ..Self::default()
            }
        }

        fn io_error() -> TagError {
            TagError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "tag lost",
            ))
        }
    }

    impl NdefTag for MemoryTag {
        fn connect(&mut self) -> Result<()> {
            if self.fail_io {
                return Err(Self::io_error());
            }
            self.connected = true;
            Ok(())
        }

        fn is_writable(&self) -> bool {
            !self.read_only
        }

        fn max_size(&self) -> usize {
            self.capacity
        }

        fn ndef_message(&mut self) -> Result<Option<NdefMessage>> {
            if !self.connected {
                return Err(TagError::NotConnected);
            }
            Ok(self.message.clone())
        }

        fn write_ndef_message(&mut self, message: &NdefMessage) -> Result<()> {
            if !self.connected {
                return Err(TagError::NotConnected);
            }
            self.message = Some(message.clone());
            Ok(())
        }

        fn close(&mut self) {
            self.connected = false;
            self.closes += 1;
        }
    }
}
