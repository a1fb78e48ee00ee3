//! Tag image files.
//!
//! A tag image holds the data area of a Type 2 tag: a sequence of TLV
//! blocks, one of which carries the NDEF message. Missing and empty files
//! stand for blank, NDEF-formatted tags.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::tlv::{self, NdefTlv};
use super::{NdefTag, Result, TagError};
use crate::config::{TagConfig, DEFAULT_TAG_CAPACITY};
use crate::ndef::NdefMessage;

/// How a tag image file behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTagOptions {
    /// Largest NDEF message accepted, in bytes.
    pub capacity: usize,
    /// Refuse writes even when the file is writable.
    pub read_only: bool,
    /// Create the file on connect when it does not exist.
    pub create_missing: bool,
}

impl Default for FileTagOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_TAG_CAPACITY,
            read_only: false,
            create_missing: false,
        }
    }
}

impl From<&TagConfig> for FileTagOptions {
    fn from(config: &TagConfig) -> Self {
        Self {
            capacity: config.capacity,
            read_only: false,
            create_missing: config.create_missing,
        }
    }
}

/// An NDEF tag backed by a tag image file.
#[derive(Debug)]
pub struct FileTag {
    path: PathBuf,
    options: FileTagOptions,
    connected: bool,
    writable: bool,
}

impl FileTag {
    /// Get an NDEF handle for the tag image at `path`.
    ///
    /// Returns `None` when the file holds data but no NDEF message TLV,
    /// i.e. the tag is not NDEF formatted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn get(path: impl AsRef<Path>, options: FileTagOptions) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();

        match std::fs::read(&path) {
            Ok(area) if !area.is_empty() => {
                // A corrupt layout still counts as NDEF; reading reports it.
                if matches!(tlv::find_ndef(&area), Ok(None)) {
                    debug!(path = %path.display(), "Tag image has no NDEF TLV");
                    return Ok(None);
                }
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Some(Self {
            path,
            options,
            connected: false,
            writable: false,
        }))
    }

    /// Path of the tag image.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `connect` has succeeded and `close` has not been called since.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn read_area(&self) -> Result<Vec<u8>> {
        if !self.connected {
            return Err(TagError::NotConnected);
        }
        Ok(std::fs::read(&self.path)?)
    }
}

impl NdefTag for FileTag {
    fn connect(&mut self) -> Result<()> {
        if !self.path.exists() {
            if !self.options.create_missing {
                return Err(TagError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no tag image at {}", self.path.display()),
                )));
            }
            debug!(path = %self.path.display(), "Creating blank tag image");
            std::fs::write(&self.path, b"")?;
        }

        let metadata = std::fs::metadata(&self.path)?;
        self.writable = !self.options.read_only && !metadata.permissions().readonly();
        self.connected = true;
        trace!(path = %self.path.display(), writable = self.writable, "Tag connected");
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn max_size(&self) -> usize {
        self.options.capacity
    }

    fn ndef_message(&mut self) -> Result<Option<NdefMessage>> {
        let area = self.read_area()?;
        match tlv::find_ndef(&area)? {
            Some(NdefTlv { value, .. }) if !value.is_empty() => {
                Ok(Some(NdefMessage::parse(&area[value])?))
            }
            _ => Ok(None),
        }
    }

    fn write_ndef_message(&mut self, message: &NdefMessage) -> Result<()> {
        if !self.writable {
            return Err(TagError::ReadOnly);
        }
        let area = self.read_area()?;

        let bytes = message.to_bytes();
        if bytes.len() > self.options.capacity {
            return Err(TagError::Capacity {
                needed: bytes.len(),
                capacity: self.options.capacity,
            });
        }

        // Control TLVs ahead of the NDEF TLV describe the tag, not the message.
        let mut image = match tlv::find_ndef(&area) {
            Ok(Some(existing)) => area[..existing.start].to_vec(),
            _ => Vec::new(),
        };
        image.extend(tlv::encode_ndef(&bytes)?);

        std::fs::write(&self.path, &image)?;
        debug!(
            path = %self.path.display(),
            message_len = bytes.len(),
            image_len = image.len(),
            "Wrote NDEF message"
        );
        Ok(())
    }

    fn close(&mut self) {
        if self.connected {
            trace!(path = %self.path.display(), "Tag closed");
        }
        self.connected = false;
    }
}
