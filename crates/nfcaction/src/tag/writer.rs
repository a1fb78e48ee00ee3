//! Writing action descriptors to tags.

use tracing::{debug, info, warn};

use super::{NdefTag, TagError};
use crate::ndef::{NdefMessage, NdefRecord};

/// Outcome of a tag write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteResult {
    /// The message was written.
    Success,
    /// The tag refuses writes.
    ReadOnly,
    /// The message is larger than the tag.
    InsufficientSpace,
    /// Communication with the tag failed.
    Io,
    /// The message could not be built or the tag content is corrupt.
    Format,
    /// The tag does not support NDEF.
    Unsupported,
}

impl WriteResult {
    /// User-facing description.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "Tag written successfully!",
            Self::ReadOnly => "Error: the tag is read-only.",
            Self::InsufficientSpace => "Error: not enough space on the tag.",
            Self::Io => "Error: I/O failure while connecting to the tag.",
            Self::Format => "Error: the NDEF message is malformed.",
            Self::Unsupported => "Error: this tag does not support NDEF writing.",
        }
    }

    /// Whether the write went through.
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl std::fmt::Display for WriteResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<&TagError> for WriteResult {
    fn from(err: &TagError) -> Self {
        match err {
            TagError::ReadOnly => Self::ReadOnly,
            TagError::Capacity { .. } => Self::InsufficientSpace,
            TagError::Format(_) | TagError::Tlv { .. } => Self::Format,
            TagError::Io(_) | TagError::NotConnected => Self::Io,
        }
    }
}

/// Write `data` to `tag` as a single text record in `language`.
///
/// `tag` is `None` when the presented tag has no NDEF support. The tag is
/// closed before returning whenever `connect` was attempted.
pub fn write(tag: Option<&mut dyn NdefTag>, data: &str, language: &str) -> WriteResult {
    let message = match NdefRecord::text(language, data).and_then(|r| NdefMessage::new(vec![r])) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Could not build NDEF message");
            return WriteResult::Format;
        }
    };

    let Some(tag) = tag else {
        return WriteResult::Unsupported;
    };

    let result = write_message(tag, &message);
    tag.close();

    match result {
        Ok(()) => {
            info!(bytes = message.byte_len(), "Tag written");
            WriteResult::Success
        }
        Err(e) => {
            let result = WriteResult::from(&e);
            warn!(error = %e, result = ?result, "Tag write failed");
            result
        }
    }
}

fn write_message(tag: &mut dyn NdefTag, message: &NdefMessage) -> Result<(), TagError> {
    tag.connect()?;

    if !tag.is_writable() {
        return Err(TagError::ReadOnly);
    }

    let needed = message.byte_len();
    let capacity = tag.max_size();
    debug!(needed, capacity, "Checking tag capacity");
    if capacity < needed {
        return Err(TagError::Capacity { needed, capacity });
    }

    tag.write_ndef_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndef::TextPayload;
    use crate::tag::testing::MemoryTag;

    const TIMER_JSON: &str = r#"{"action":"set_timer","duration":60,"message":"Tea"}"#;

    #[test]
    fn test_write_success() {
        let mut tag = MemoryTag::blank(137);
        let result = write(Some(&mut tag), TIMER_JSON, "en");

        assert_eq!(result, WriteResult::Success);
        assert!(!tag.connected);
        assert_eq!(tag.closes, 1);

        let message = tag.message.unwrap();
        assert!(message.first().is_text());
        let text = TextPayload::decode(message.first().payload()).unwrap();
        assert_eq!(text.text, TIMER_JSON);
        assert_eq!(text.language, "en");
    }

    #[test]
    fn test_write_unsupported_tag() {
        assert_eq!(write(None, TIMER_JSON, "en"), WriteResult::Unsupported);
    }

    #[test]
    fn test_write_read_only() {
        let mut tag = MemoryTag {
            read_only: true,
            ..MemoryTag::blank(137)
        };
        assert_eq!(write(Some(&mut tag), TIMER_JSON, "en"), WriteResult::ReadOnly);
        assert!(tag.message.is_none());
        assert_eq!(tag.closes, 1);
    }

    #[test]
    fn test_write_insufficient_space() {
        let mut tag = MemoryTag::blank(16);
        assert_eq!(
            write(Some(&mut tag), TIMER_JSON, "en"),
            WriteResult::InsufficientSpace
        );
        assert!(tag.message.is_none());
    }

    #[test]
    fn test_write_exact_capacity() {
        let message = NdefMessage::new(vec![NdefRecord::text("en", "abc").unwrap()]).unwrap();
        let mut tag = MemoryTag::blank(message.byte_len());
        assert_eq!(write(Some(&mut tag), "abc", "en"), WriteResult::Success);
    }

    #[test]
    fn test_write_io_failure() {
        let mut tag = MemoryTag {
            fail_io: true,
            ..MemoryTag::blank(137)
        };
        assert_eq!(write(Some(&mut tag), TIMER_JSON, "en"), WriteResult::Io);
        assert_eq!(tag.closes, 1);
    }

    #[test]
    fn test_write_invalid_language() {
        let mut tag = MemoryTag::blank(137);
        assert_eq!(write(Some(&mut tag), "x", "çà"), WriteResult::Format);
        assert_eq!(tag.closes, 0);
    }

    #[test]
    fn test_write_result_messages() {
        assert_eq!(WriteResult::Success.message(), "Tag written successfully!");
        assert!(WriteResult::ReadOnly.to_string().contains("read-only"));
        assert!(WriteResult::Success.is_success());
        assert!(!WriteResult::Io.is_success());
    }

    #[test]
    fn test_write_result_from_tag_error() {
        assert_eq!(
            WriteResult::from(&TagError::tlv("bad")),
            WriteResult::Format
        );
        assert_eq!(
            WriteResult::from(&TagError::NotConnected),
            WriteResult::Io
        );
    }
}
