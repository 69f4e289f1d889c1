//! # Record - hex record model and line codec
//!
//! One [`Record`] per `:`-prefixed line of a hex image. Records carry a
//! 16-bit local address; extension records shift every following record's
//! local address into a 32-bit absolute space.
//!
//! ## Line layout
//!
//! ```text
//! ┌───┬────┬──────┬────┬──────────────┬────┐
//! │ : │ LL │ AAAA │ TT │ DD ... (LL×) │ CC │
//! └───┴────┴──────┴────┴──────────────┴────┘
//!   LL    payload length (1 byte)
//!   AAAA  local address (big-endian u16)
//!   TT    record kind (00..05)
//!   DD    payload bytes
//!   CC    two's complement of the byte sum of LL..DD
//! ```
//!
//! All fields are uppercase hexadecimal on output; input accepts either
//! case.
//!
//! ## Kinds
//!
//! | Code | Kind                   | Payload                       |
//! |------|------------------------|-------------------------------|
//! | 00   | Data                   | bytes at local address        |
//! | 01   | EndOfFile              | empty                         |
//! | 02   | ExtensionSegment       | segment base (× 16)           |
//! | 03   | StartSegmentAddress    | CS:IP                         |
//! | 04   | ExtensionLinear        | upper 16 address bits         |
//! | 05   | StartLinearAddress     | 32-bit EIP                    |
//!
//! ## Extension links
//!
//! A record does not own its extension. [`Record::extension`] is the
//! *position* of the nearest earlier extension record in the owning
//! [`Document`], which keeps links valid while records are spliced in
//! (see [`Document::insert`]).

mod address;
mod codec;
mod document;
mod format;
mod sink;

pub use address::{
    contribution, encode_offset, extension_payload, AddressError, LOCAL_ADDRESS_MAX,
};
pub use codec::{decode_line, parse_line, serialize_line, DecodeError, MIN_LINE_LEN, RECORD_MARK};
pub use document::Document;
pub use format::HexFormat;
pub use sink::{DiagnosticSink, Discard, TracingSink};

use byteorder::{BigEndian, ReadBytesExt};
use std::fmt;

/// The closed set of record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Data,
    EndOfFile,
    ExtensionSegment,
    StartSegmentAddress,
    ExtensionLinear,
    StartLinearAddress,
}

impl RecordKind {
    /// The `TT` byte written on the wire.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            RecordKind::Data => 0x00,
            RecordKind::EndOfFile => 0x01,
            RecordKind::ExtensionSegment => 0x02,
            RecordKind::StartSegmentAddress => 0x03,
            RecordKind::ExtensionLinear => 0x04,
            RecordKind::StartLinearAddress => 0x05,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(RecordKind::Data),
            0x01 => Some(RecordKind::EndOfFile),
            0x02 => Some(RecordKind::ExtensionSegment),
            0x03 => Some(RecordKind::StartSegmentAddress),
            0x04 => Some(RecordKind::ExtensionLinear),
            0x05 => Some(RecordKind::StartLinearAddress),
            _ => None,
        }
    }

    /// Returns `true` for the two kinds that shift later records' addresses.
    #[must_use]
    pub fn is_extension(&self) -> bool {
        matches!(self, RecordKind::ExtensionSegment | RecordKind::ExtensionLinear)
    }
}

/// Execution start address carried by a start record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAddress {
    /// 80x86 real mode `CS:IP`.
    Segment { cs: u16, ip: u16 },
    /// 32-bit `EIP`.
    Linear(u32),
}

/// Two's complement of the byte sum of `bytes`.
///
/// ```
/// assert_eq!(record::checksum(&[0x03, 0x00, 0x30, 0x00, 0x02, 0x33, 0x7A]), 0x1E);
/// ```
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    byte_sum(bytes).wrapping_neg()
}

fn byte_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A single hex record.
///
/// `declared_len` and `checksum` are stored exactly as read so that a
/// parsed image serializes back byte-for-byte; use
/// [`update_metadata`](Record::update_metadata) to make them consistent with
/// the payload again.
#[derive(Debug, Clone)]
pub struct Record {
    pub kind: RecordKind,
    /// 16-bit local address; only meaningful for data records.
    pub address: u16,
    pub payload: Vec<u8>,
    pub declared_len: u8,
    pub checksum: u8,
    /// Position of the nearest earlier extension record in the owning
    /// document, if any.
    pub extension: Option<usize>,
    /// Physical input line this record came from; `None` when synthesized.
    pub source_line: Option<u64>,
}

/// `source_line` is diagnostic only and does not take part in equality.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.address == other.address
            && self.payload == other.payload
            && self.declared_len == other.declared_len
            && self.checksum == other.checksum
            && self.extension == other.extension
    }
}

impl Eq for Record {}

impl Record {
    /// Synthesizes a record with consistent length and checksum.
    ///
    /// Payloads longer than 255 bytes cannot be declared; the length field
    /// saturates and [`is_length_valid`](Record::is_length_valid) reports it.
    #[must_use]
    pub fn new(kind: RecordKind, address: u16, payload: Vec<u8>, extension: Option<usize>) -> Self {
        let mut record = Self {
            kind,
            address,
            payload,
            declared_len: 0,
            checksum: 0,
            extension,
            source_line: None,
        };
        record.update_metadata();
        record
    }

    #[must_use]
    pub fn data(address: u16, payload: Vec<u8>, extension: Option<usize>) -> Self {
        Self::new(RecordKind::Data, address, payload, extension)
    }

    #[must_use]
    pub fn end_of_file() -> Self {
        Self::new(RecordKind::EndOfFile, 0, Vec::new(), None)
    }

    /// Number of payload bytes actually held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    #[must_use]
    pub fn is_data(&self) -> bool {
        self.kind == RecordKind::Data
    }

    /// Checksum over the fields as currently stored.
    #[must_use]
    pub fn calculate_checksum(&self) -> u8 {
        let [hi, lo] = self.address.to_be_bytes();
        let header = [self.declared_len, hi, lo, self.kind.code()];
        byte_sum(&header)
            .wrapping_add(byte_sum(&self.payload))
            .wrapping_neg()
    }

    #[must_use]
    pub fn is_checksum_valid(&self) -> bool {
        self.calculate_checksum() == self.checksum
    }

    #[must_use]
    pub fn is_length_valid(&self) -> bool {
        self.payload.len() == usize::from(self.declared_len)
    }

    /// Length and checksum both agree with the payload.
    #[must_use]
    pub fn is_metadata_valid(&self) -> bool {
        self.is_length_valid() && self.is_checksum_valid()
    }

    /// Recomputes `declared_len` and `checksum` from the payload.
    pub fn update_metadata(&mut self) {
        self.declared_len = u8::try_from(self.payload.len()).unwrap_or(u8::MAX);
        self.checksum = self.calculate_checksum();
    }

    /// Copies payload bytes starting at `offset` into `out`, returning how
    /// many were copied.
    pub fn read_into(&self, offset: usize, out: &mut [u8]) -> usize {
        let Some(available) = self.payload.get(offset..) else {
            return 0;
        };
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        n
    }

    /// Replaces payload bytes starting at `offset` with a prefix of `bytes`
    /// that fits inside the record, then refreshes length and checksum.
    ///
    /// Returns the number of bytes replaced.
    pub fn overwrite(&mut self, offset: usize, bytes: &[u8]) -> usize {
        let Some(target) = self.payload.get_mut(offset..) else {
            return 0;
        };
        let n = target.len().min(bytes.len());
        target[..n].copy_from_slice(&bytes[..n]);
        self.update_metadata();
        n
    }

    /// Decodes the payload of a start record.
    ///
    /// Returns `None` for other kinds or a payload of the wrong size.
    #[must_use]
    pub fn start_address(&self) -> Option<StartAddress> {
        let mut rdr = self.payload.as_slice();
        match self.kind {
            RecordKind::StartSegmentAddress if self.payload.len() == 4 => {
                let cs = rdr.read_u16::<BigEndian>().ok()?;
                let ip = rdr.read_u16::<BigEndian>().ok()?;
                Some(StartAddress::Segment { cs, ip })
            }
            RecordKind::StartLinearAddress if self.payload.len() == 4 => {
                rdr.read_u32::<BigEndian>().ok().map(StartAddress::Linear)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_line(self))
    }
}

#[cfg(test)]
mod tests;
