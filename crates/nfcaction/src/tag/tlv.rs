//! TLV blocks of an NFC Forum Type 2 tag data area.

use std::ops::Range;

use super::{Result, TagError};

const TLV_NULL: u8 = 0x00;
const TLV_NDEF: u8 = 0x03;
const TLV_TERMINATOR: u8 = 0xFE;

/// Marker for the three-byte length form.
const LONG_LENGTH: u8 = 0xFF;

/// Largest value the three-byte length form can express.
pub(crate) const MAX_TLV_LENGTH: usize = 0xFFFE;

/// Location of the NDEF message TLV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NdefTlv {
    /// Offset of the TLV type byte.
    pub start: usize,
    /// The message bytes.
    pub value: Range<usize>,
}

/// Find the first NDEF message TLV.
///
/// Returns `Ok(None)` when a terminator or the end of the area is reached
/// first.
pub(crate) fn find_ndef(area: &[u8]) -> Result<Option<NdefTlv>> {
    let mut offset = 0;
    while offset < area.len() {
        let start = offset;
        let tlv_type = area[offset];
        offset += 1;

        match tlv_type {
            TLV_NULL => continue,
            TLV_TERMINATOR => return Ok(None),
            _ => {}
        }

        let (length, header_len) = read_length(&area[offset..])
            .ok_or_else(|| TagError::tlv(format!("truncated length at offset {offset}")))?;
        offset += header_len;

        let end = offset + length;
        if end > area.len() {
            return Err(TagError::tlv(format!(
                "TLV 0x{tlv_type:02X} at offset {start} declares {length} bytes, {} available",
                area.len() - offset
            )));
        }

        if tlv_type == TLV_NDEF {
            return Ok(Some(NdefTlv {
                start,
                value: offset..end,
            }));
        }
        offset = end;
    }
    Ok(None)
}

/// Encode `message` as an NDEF TLV followed by a terminator.
pub(crate) fn encode_ndef(message: &[u8]) -> Result<Vec<u8>> {
    let len = message.len();
    if len > MAX_TLV_LENGTH {
        return Err(TagError::Capacity {
            needed: len,
            capacity: MAX_TLV_LENGTH,
        });
    }

    let mut out = Vec::with_capacity(len + 5);
    out.push(TLV_NDEF);
    if len < usize::from(LONG_LENGTH) {
        #[allow(clippy::cast_possible_truncation)]
        out.push(len as u8);
    } else {
        out.push(LONG_LENGTH);
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(len as u16).to_be_bytes());
    }
    out.extend_from_slice(message);
    out.push(TLV_TERMINATOR);
    Ok(out)
}

fn read_length(bytes: &[u8]) -> Option<(usize, usize)> {
    match bytes.first()? {
        &LONG_LENGTH => {
            let raw = bytes.get(1..3)?;
            Some((usize::from(u16::from_be_bytes([raw[0], raw[1]])), 3))
        }
        &short => Some((usize::from(short), 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ndef_simple() {
        let area = [0x03, 0x02, 0xAA, 0xBB, 0xFE];
        let tlv = find_ndef(&area).unwrap().unwrap();
        assert_eq!(tlv.start, 0);
        assert_eq!(&area[tlv.value], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_find_ndef_skips_null_and_lock_control() {
        let area = [0x00, 0x01, 0x03, 0xA0, 0x10, 0x44, 0x03, 0x01, 0x7F, 0xFE];
        let tlv = find_ndef(&area).unwrap().unwrap();
        assert_eq!(tlv.start, 6);
        assert_eq!(&area[tlv.value], &[0x7F]);
    }

    #[test]
    fn test_find_ndef_empty_value() {
        let area = [0x03, 0x00, 0xFE];
        let tlv = find_ndef(&area).unwrap().unwrap();
        assert!(tlv.value.is_empty());
    }

    #[test]
    fn test_find_ndef_terminator_first() {
        assert_eq!(find_ndef(&[0xFE, 0x03, 0x00]).unwrap(), None);
    }

    #[test]
    fn test_find_ndef_no_ndef_tlv() {
        assert_eq!(find_ndef(&[0x00, 0x00, 0x00]).unwrap(), None);
        assert_eq!(find_ndef(&[]).unwrap(), None);
    }

    #[test]
    fn test_find_ndef_long_length() {
        let mut area = vec![0x03, 0xFF, 0x01, 0x00];
        area.extend(vec![0x55; 256]);
        area.push(0xFE);
        let tlv = find_ndef(&area).unwrap().unwrap();
        assert_eq!(tlv.value, 4..260);
    }

    #[test]
    fn test_find_ndef_overlong_length() {
        let err = find_ndef(&[0x03, 0x09, 0x01]).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_find_ndef_truncated_length() {
        assert!(find_ndef(&[0x03]).is_err());
        assert!(find_ndef(&[0x03, 0xFF, 0x01]).is_err());
    }

    #[test]
    fn test_encode_short() {
        assert_eq!(encode_ndef(&[1, 2]).unwrap(), vec![0x03, 0x02, 1, 2, 0xFE]);
    }

    #[test]
    fn test_encode_long() {
        let encoded = encode_ndef(&[0u8; 300]).unwrap();
        assert_eq!(&encoded[..4], &[0x03, 0xFF, 0x01, 0x2C]);
        assert_eq!(encoded.len(), 4 + 300 + 1);
        let tlv = find_ndef(&encoded).unwrap().unwrap();
        assert_eq!(tlv.value, 4..304);
    }

    #[test]
    fn test_encode_boundary_uses_long_form() {
        let encoded = encode_ndef(&[0u8; 255]).unwrap();
        assert_eq!(&encoded[..4], &[0x03, 0xFF, 0x00, 0xFF]);
    }

    #[test]
    fn test_encode_too_large() {
        assert!(matches!(
            encode_ndef(&vec![0u8; MAX_TLV_LENGTH + 1]),
            Err(TagError::Capacity { .. })
        ));
    }
}
