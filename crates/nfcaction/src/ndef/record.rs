//! NDEF records.

use serde::{Deserialize, Serialize};

use super::text::{TextEncoding, TextPayload};
use super::{NdefError, Result};

/// Record type of the well-known text record.
pub const RTD_TEXT: &[u8] = b"T";

/// Record type of the well-known URI record.
pub const RTD_URI: &[u8] = b"U";

/// Type name format: how the record type field is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tnf {
    /// The record carries no type, id or payload.
    Empty,
    /// NFC Forum well-known type (RTD).
    WellKnown,
    /// RFC 2046 media type.
    MimeMedia,
    /// RFC 3986 absolute URI.
    AbsoluteUri,
    /// NFC Forum external type.
    ExternalType,
    /// Unknown payload type.
    Unknown,
    /// Continuation chunk of a chunked record.
    Unchanged,
    /// Reserved by the NFC Forum.
    Reserved,
}

impl Tnf {
    /// Decode the low three bits of a record header.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0x00 => Self::Empty,
            0x01 => Self::WellKnown,
            0x02 => Self::MimeMedia,
            0x03 => Self::AbsoluteUri,
            0x04 => Self::ExternalType,
            0x05 => Self::Unknown,
            0x06 => Self::Unchanged,
            _ => Self::Reserved,
        }
    }

    /// The three-bit wire value.
    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            Self::Empty => 0x00,
            Self::WellKnown => 0x01,
            Self::MimeMedia => 0x02,
            Self::AbsoluteUri => 0x03,
            Self::ExternalType => 0x04,
            Self::Unknown => 0x05,
            Self::Unchanged => 0x06,
            Self::Reserved => 0x07,
        }
    }
}

impl std::fmt::Display for Tnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::WellKnown => write!(f, "well_known"),
            Self::MimeMedia => write!(f, "mime_media"),
            Self::AbsoluteUri => write!(f, "absolute_uri"),
            Self::ExternalType => write!(f, "external_type"),
            Self::Unknown => write!(f, "unknown"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Reserved => write!(f, "reserved"),
        }
    }
}

/// A single NDEF record.
///
/// Records are immutable once built; the constructors enforce the rules
/// relating the TNF to the type, id and payload fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefRecord {
    tnf: Tnf,
    record_type: Vec<u8>,
    id: Vec<u8>,
    payload: Vec<u8>,
}

impl NdefRecord {
    /// Build a record, validating the TNF against the other fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the TNF is `Unchanged` or `Reserved`, if an
    /// `Empty` record carries data, if an `Unknown` record has a type, or
    /// if the type or id exceed 255 bytes.
    pub fn new(
        tnf: Tnf,
        record_type: impl Into<Vec<u8>>,
        id: impl Into<Vec<u8>>,
        payload: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let record = Self {
            tnf,
            record_type: record_type.into(),
            id: id.into(),
            payload: payload.into(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Build a well-known text record encoded as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the language code is not ASCII or is longer
    /// than 63 bytes.
    pub fn text(language: &str, text: &str) -> Result<Self> {
        let payload = TextPayload::new(TextEncoding::Utf8, language, text).encode()?;
        Self::new(Tnf::WellKnown, RTD_TEXT, Vec::new(), payload)
    }

    /// The type name format.
    #[must_use]
    pub fn tnf(&self) -> Tnf {
        self.tnf
    }

    /// The record type bytes.
    #[must_use]
    pub fn record_type(&self) -> &[u8] {
        &self.record_type
    }

    /// The record id bytes (empty when absent).
    #[must_use]
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// The payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether this is a well-known text record.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.tnf == Tnf::WellKnown && self.record_type == RTD_TEXT
    }

    /// Whether the payload fits the one-byte short record length.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.payload.len() < 256
    }

    /// Number of bytes this record occupies on the wire.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        let payload_len_field = if self.is_short() { 1 } else { 4 };
        let id_len_field = usize::from(!self.id.is_empty());
        2 + payload_len_field
            + id_len_field
            + self.record_type.len()
            + self.id.len()
            + self.payload.len()
    }

    /// Append this record to `out` with the given begin/end flags.
    pub(crate) fn write_to(&self, out: &mut Vec<u8>, first: bool, last: bool) {
        let mut header = self.tnf.bits();
        if first {
            header |= super::message::FLAG_MB;
        }
        if last {
            header |= super::message::FLAG_ME;
        }
        if self.is_short() {
            header |= super::message::FLAG_SR;
        }
        if !self.id.is_empty() {
            header |= super::message::FLAG_IL;
        }

        out.push(header);
        // Lengths were checked in validate().
        #[allow(clippy::cast_possible_truncation)]
        out.push(self.record_type.len() as u8);
        if self.is_short() {
            #[allow(clippy::cast_possible_truncation)]
            out.push(self.payload.len() as u8);
        } else {
            #[allow(clippy::cast_possible_truncation)]
            out.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        }
        if !self.id.is_empty() {
            #[allow(clippy::cast_possible_truncation)]
            out.push(self.id.len() as u8);
        }
        out.extend_from_slice(&self.record_type);
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.payload);
    }

    fn validate(&self) -> Result<()> {
        if self.record_type.len() > 255 {
            return Err(NdefError::FieldTooLong {
                field: "record type",
                len: self.record_type.len(),
            });
        }
        if self.id.len() > 255 {
            return Err(NdefError::FieldTooLong {
                field: "record id",
                len: self.id.len(),
            });
        }

        match self.tnf {
            Tnf::Empty
                if !self.record_type.is_empty() || !self.id.is_empty() || !self.payload.is_empty() =>
            {
                Err(NdefError::InvalidTnf {
                    tnf: self.tnf.bits(),
                    reason: "empty record must not carry type, id or payload",
                })
            }
            Tnf::Unknown if !self.record_type.is_empty() => Err(NdefError::InvalidTnf {
                tnf: self.tnf.bits(),
                reason: "unknown record must not carry a type",
            }),
            Tnf::Unchanged => Err(NdefError::InvalidTnf {
                tnf: self.tnf.bits(),
                reason: "unchanged is only valid inside a chunked record",
            }),
            Tnf::Reserved => Err(NdefError::InvalidTnf {
                tnf: self.tnf.bits(),
                reason: "reserved",
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tnf_bits_round_trip() {
        for bits in 0..8u8 {
            assert_eq!(Tnf::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn test_tnf_from_bits_masks_flags() {
        assert_eq!(Tnf::from_bits(0xD1), Tnf::WellKnown);
    }

    #[test]
    fn test_tnf_display() {
        assert_eq!(Tnf::WellKnown.to_string(), "well_known");
        assert_eq!(Tnf::Unchanged.to_string(), "unchanged");
    }

    #[test]
    fn test_text_record() {
        let record = NdefRecord::text("en", "hello").unwrap();
        assert!(record.is_text());
        assert_eq!(record.tnf(), Tnf::WellKnown);
        assert_eq!(record.record_type(), b"T");
        assert!(record.id().is_empty());
        assert_eq!(record.payload(), b"\x02enhello");
    }

    #[test]
    fn test_text_record_rejects_long_language() {
        let language = "x".repeat(64);
        assert!(matches!(
            NdefRecord::text(&language, "hi"),
            Err(NdefError::InvalidLanguageCode { .. })
        ));
    }

    #[test]
    fn test_uri_record_is_not_text() {
        let record = NdefRecord::new(Tnf::WellKnown, RTD_URI, Vec::new(), b"\x04example.com".to_vec())
            .unwrap();
        assert!(!record.is_text());
    }

    #[test]
    fn test_mime_text_is_not_text_record() {
        let record =
            NdefRecord::new(Tnf::MimeMedia, b"T".to_vec(), Vec::new(), b"hello".to_vec()).unwrap();
        assert!(!record.is_text());
    }

    #[test]
    fn test_empty_record_rules() {
        assert!(NdefRecord::new(Tnf::Empty, Vec::new(), Vec::new(), Vec::new()).is_ok());
        assert!(NdefRecord::new(Tnf::Empty, Vec::new(), Vec::new(), vec![1]).is_err());
    }

    #[test]
    fn test_unknown_record_rejects_type() {
        assert!(NdefRecord::new(Tnf::Unknown, b"x".to_vec(), Vec::new(), vec![1]).is_err());
        assert!(NdefRecord::new(Tnf::Unknown, Vec::new(), Vec::new(), vec![1]).is_ok());
    }

    #[test]
    fn test_unchanged_and_reserved_rejected() {
        assert!(NdefRecord::new(Tnf::Unchanged, Vec::new(), Vec::new(), Vec::new()).is_err());
        assert!(NdefRecord::new(Tnf::Reserved, Vec::new(), Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn test_type_too_long() {
        let result = NdefRecord::new(Tnf::ExternalType, vec![b'a'; 256], Vec::new(), Vec::new());
        assert!(matches!(result, Err(NdefError::FieldTooLong { .. })));
    }

    #[test]
    fn test_byte_len_short_record() {
        let record = NdefRecord::text("en", "hi").unwrap();
        // header + type len + payload len + type + payload(status, "en", "hi")
        assert_eq!(record.byte_len(), 3 + 1 + 5);
    }

    #[test]
    fn test_byte_len_long_record_with_id() {
        let record =
            NdefRecord::new(Tnf::MimeMedia, b"a/b".to_vec(), b"id".to_vec(), vec![0; 300]).unwrap();
        assert!(!record.is_short());
        assert_eq!(record.byte_len(), 2 + 4 + 1 + 3 + 2 + 300);
    }
}
