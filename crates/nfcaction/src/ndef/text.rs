//! The well-known text record payload.
//!
//! Layout: one status byte, the language code, then the text.
//!
//! ```text
//! bit 7     encoding (0 = UTF-8, 1 = UTF-16)
//! bit 6     reserved
//! bits 5..0 language code length
//! ```

use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8};
use serde::{Deserialize, Serialize};

use super::{NdefError, Result};

/// Longest language code the status byte can describe.
pub const MAX_LANGUAGE_CODE_LEN: usize = 0x3F;

const STATUS_UTF16: u8 = 0x80;
const STATUS_LANGUAGE_MASK: u8 = 0x3F;

/// Character encoding of a text record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// UTF-8 text.
    #[default]
    Utf8,
    /// UTF-16 text, big-endian unless a byte-order mark says otherwise.
    Utf16,
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => write!(f, "UTF-8"),
            Self::Utf16 => write!(f, "UTF-16"),
        }
    }
}

/// Decoded contents of a text record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    /// Encoding declared by the status byte.
    pub encoding: TextEncoding,
    /// IANA language code, e.g. `en`.
    pub language: String,
    /// The text itself.
    pub text: String,
}

impl TextPayload {
    /// Create a payload.
    #[must_use]
    pub fn new(encoding: TextEncoding, language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            encoding,
            language: language.into(),
            text: text.into(),
        }
    }

    /// Decode a text record payload.
    ///
    /// Invalid byte sequences in the text are replaced with U+FFFD rather
    /// than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`NdefError::EmptyTextPayload`] for an empty payload and
    /// [`NdefError::MalformedTextPayload`] when no text byte follows the
    /// language code.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let Some(&status) = payload.first() else {
            return Err(NdefError::EmptyTextPayload);
        };

        let language_len = usize::from(status & STATUS_LANGUAGE_MASK);
        let encoding = if status & STATUS_UTF16 == 0 {
            TextEncoding::Utf8
        } else {
            TextEncoding::Utf16
        };

        if payload.len() <= language_len + 1 {
            return Err(NdefError::MalformedTextPayload {
                language_len,
                payload_len: payload.len(),
            });
        }

        let language = String::from_utf8_lossy(&payload[1..=language_len]).into_owned();
        let body = &payload[language_len + 1..];
        let text = match encoding {
            TextEncoding::Utf8 => UTF_8.decode_without_bom_handling(body).0.into_owned(),
            TextEncoding::Utf16 => decode_utf16(body),
        };

        Ok(Self {
            encoding,
            language,
            text,
        })
    }

    /// Encode this payload.
    ///
    /// UTF-16 text is written big-endian without a byte-order mark.
    ///
    /// # Errors
    ///
    /// Returns [`NdefError::InvalidLanguageCode`] if the language code is not
    /// ASCII or longer than [`MAX_LANGUAGE_CODE_LEN`].
    pub fn encode(&self) -> Result<Vec<u8>> {
        if !self.language.is_ascii() || self.language.len() > MAX_LANGUAGE_CODE_LEN {
            return Err(NdefError::InvalidLanguageCode {
                code: self.language.clone(),
            });
        }

        // Checked above: fits in six bits.
        #[allow(clippy::cast_possible_truncation)]
        let mut status = self.language.len() as u8;
        if self.encoding == TextEncoding::Utf16 {
            status |= STATUS_UTF16;
        }

        let mut out = Vec::with_capacity(1 + self.language.len() + self.text.len() * 2);
        out.push(status);
        out.extend_from_slice(self.language.as_bytes());
        match self.encoding {
            TextEncoding::Utf8 => out.extend_from_slice(self.text.as_bytes()),
            TextEncoding::Utf16 => {
                for unit in self.text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
        Ok(out)
    }
}

/// Decode UTF-16 text, honouring only the `FE FF` and `FF FE` byte order
/// marks. Without one the text is big-endian.
fn decode_utf16(body: &[u8]) -> String {
    let (encoding, text) = match body {
        [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
        [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
        _ => (UTF_16BE, body),
    };
    encoding.decode_without_bom_handling(text).0.into_owned()
}
