//! NDEF messages and their binary encoding.

use tracing::trace;

use super::record::{NdefRecord, Tnf};
use super::{NdefError, Result, MAX_PAYLOAD_SIZE};

pub(crate) const FLAG_MB: u8 = 0x80;
pub(crate) const FLAG_ME: u8 = 0x40;
pub(crate) const FLAG_CF: u8 = 0x20;
pub(crate) const FLAG_SR: u8 = 0x10;
pub(crate) const FLAG_IL: u8 = 0x08;

/// An ordered, non-empty list of NDEF records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefMessage {
    records: Vec<NdefRecord>,
}

impl NdefMessage {
    /// Create a message from its records.
    ///
    /// # Errors
    ///
    /// Returns [`NdefError::EmptyMessage`] if `records` is empty.
    pub fn new(records: Vec<NdefRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(NdefError::EmptyMessage);
        }
        Ok(Self { records })
    }

    /// The records of this message, in order.
    #[must_use]
    pub fn records(&self) -> &[NdefRecord] {
        &self.records
    }

    /// The first record. Messages are never empty.
    #[must_use]
    pub fn first(&self) -> &NdefRecord {
        &self.records[0]
    }

    /// Number of bytes [`to_bytes`](Self::to_bytes) produces.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.records.iter().map(NdefRecord::byte_len).sum()
    }

    /// Serialize the message. Records are never emitted as chunks.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        let last = self.records.len() - 1;
        for (i, record) in self.records.iter().enumerate() {
            record.write_to(&mut out, i == 0, i == last);
        }
        out
    }

    /// Serialize the message as lowercase hex digits.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse a message written as hex digits. Surrounding whitespace is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hex`](crate::Error::Hex) if the input is not hex and
    /// [`Error::Ndef`](crate::Error::Ndef) if the bytes are not a message.
    pub fn from_hex(input: &str) -> crate::Result<Self> {
        let bytes = hex::decode(input.trim())?;
        Ok(Self::parse(&bytes)?)
    }

    /// Parse a complete message.
    ///
    /// Chunked records are reassembled into a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is truncated, the begin/end flags are
    /// inconsistent, bytes follow the last record, a payload is larger than
    /// [`MAX_PAYLOAD_SIZE`], a chunk sequence is malformed, or a TNF is
    /// invalid for its record.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let mut records = Vec::new();
        let mut chunk: Option<PendingChunk> = None;
        let mut index = 0usize;

        loop {
            if reader.is_empty() && index > 0 {
                return Err(NdefError::MissingMessageEnd);
            }

            let header = reader.u8()?;
            let message_begin = header & FLAG_MB != 0;
            let message_end = header & FLAG_ME != 0;
            let chunked = header & FLAG_CF != 0;
            let short = header & FLAG_SR != 0;
            let has_id = header & FLAG_IL != 0;
            let tnf = Tnf::from_bits(header);

            if index == 0 && !message_begin {
                return Err(NdefError::MissingMessageBegin);
            }
            if index > 0 && message_begin {
                return Err(NdefError::UnexpectedMessageBegin { index });
            }

            let type_len = usize::from(reader.u8()?);
            let payload_len = if short {
                usize::from(reader.u8()?)
            } else {
                reader.u32()? as usize
            };
            let id_len = if has_id { usize::from(reader.u8()?) } else { 0 };

            if payload_len > MAX_PAYLOAD_SIZE {
                return Err(NdefError::PayloadTooLarge { size: payload_len });
            }

            let record_type = reader.take(type_len)?.to_vec();
            let id = reader.take(id_len)?.to_vec();
            let payload = reader.take(payload_len)?;

            trace!(index, %tnf, type_len, payload_len, id_len, chunked, "Parsed record header");

            match chunk.as_mut() {
                Some(pending) => {
                    if tnf != Tnf::Unchanged || type_len != 0 || has_id {
                        return Err(NdefError::MalformedChunk {
                            reason: "continuation chunk must use the unchanged TNF without type or id",
                        });
                    }
                    pending.payload.extend_from_slice(payload);
                    if pending.payload.len() > MAX_PAYLOAD_SIZE {
                        return Err(NdefError::PayloadTooLarge {
                            size: pending.payload.len(),
                        });
                    }
                    if !chunked {
                        if let Some(done) = chunk.take() {
                            records.push(done.finish()?);
                        }
                    }
                }
                None => {
                    if tnf == Tnf::Unchanged {
                        return Err(NdefError::InvalidTnf {
                            tnf: tnf.bits(),
                            reason: "unchanged outside a chunked record",
                        });
                    }
                    if chunked {
                        chunk = Some(PendingChunk {
                            tnf,
                            record_type,
                            id,
                            payload: payload.to_vec(),
                        });
                    } else {
                        records.push(NdefRecord::new(tnf, record_type, id, payload.to_vec())?);
                    }
                }
            }

            index += 1;

            if message_end {
                if chunk.is_some() {
                    return Err(NdefError::MalformedChunk {
                        reason: "message ended inside a chunked record",
                    });
                }
                break;
            }
        }

        if !reader.is_empty() {
            return Err(NdefError::TrailingBytes {
                count: reader.remaining(),
            });
        }

        Self::new(records)
    }
}

/// First chunk of a chunked record, extended as continuations arrive.
#[derive(Debug)]
struct PendingChunk {
    tnf: Tnf,
    record_type: Vec<u8>,
    id: Vec<u8>,
    payload: Vec<u8>,
}

impl PendingChunk {
    fn finish(self) -> Result<NdefRecord> {
        NdefRecord::new(self.tnf, self.record_type, self.id, self.payload)
    }
}

/// Bounds-checked reader over the input bytes.
#[derive(Debug)]
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(NdefError::Truncated {
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}
