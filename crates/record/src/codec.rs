//! Line codec: one textual record to/from a [`Record`].
//!
//! Decoding is strict about content (every field must be hex, the kind must
//! be known) and lenient about framing: a missing `:` marker is repaired
//! and reported. [`parse_line`] is the skip-and-continue entry point used
//! by document parsing; [`decode_line`] is the strict core.

use std::fmt::Write as _;

use thiserror::Error;

use crate::sink::DiagnosticSink;
use crate::{Record, RecordKind};

/// Marker that starts every record.
pub const RECORD_MARK: char = ':';

/// Shortest encodable line: marker + length + address + kind + checksum.
pub const MIN_LINE_LEN: usize = 1 + 2 + 4 + 2 + 2;

/// Why a single line could not be decoded.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("line has {len} characters, below the minimum of {MIN_LINE_LEN}")]
    TooShort { len: usize },

    #[error("invalid hex symbols: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("unknown record kind {0:#04x}")]
    UnknownKind(u8),
}

/// Decodes one `:`-prefixed, already trimmed line.
///
/// The declared length and checksum are kept as read, even when they
/// disagree with the payload; callers check them with
/// [`Record::is_metadata_valid`].
///
/// # Errors
///
/// [`DecodeError::TooShort`] if the line cannot hold the fixed fields,
/// [`DecodeError::InvalidHex`] on any non-hex digit or an odd number of
/// payload digits, [`DecodeError::UnknownKind`] for kind bytes above `05`.
pub fn decode_line(line: &str) -> Result<Record, DecodeError> {
    let bytes = line.as_bytes();
    let n = bytes.len();
    if n < MIN_LINE_LEN {
        return Err(DecodeError::TooShort { len: n });
    }

    let mut declared_len = [0u8; 1];
    let mut address = [0u8; 2];
    let mut kind = [0u8; 1];
    let mut checksum = [0u8; 1];
    hex::decode_to_slice(&bytes[1..3], &mut declared_len)?;
    hex::decode_to_slice(&bytes[3..7], &mut address)?;
    hex::decode_to_slice(&bytes[7..9], &mut kind)?;
    hex::decode_to_slice(&bytes[n - 2..], &mut checksum)?;
    let payload = hex::decode(&bytes[9..n - 2])?;

    let kind = RecordKind::from_code(kind[0]).ok_or(DecodeError::UnknownKind(kind[0]))?;

    Ok(Record {
        kind,
        address: u16::from_be_bytes(address),
        payload,
        declared_len: declared_len[0],
        checksum: checksum[0],
        extension: None,
        source_line: None,
    })
}

/// Parses one raw line, reporting problems to `sink` instead of failing.
///
/// Returns `None` when the line had to be dropped. A successfully parsed
/// record is linked to `extension`, the position of the latest extension
/// record parsed before it.
pub fn parse_line(
    line_number: u64,
    raw: &str,
    extension: Option<usize>,
    sink: &mut dyn DiagnosticSink,
) -> Option<Record> {
    let trimmed = raw.trim();
    let repaired;
    let line = if trimmed.starts_with(RECORD_MARK) {
        trimmed
    } else {
        sink.log(
            line_number,
            trimmed,
            "line does not start with ':'; prefixed it and continuing",
        );
        repaired = format!("{RECORD_MARK}{trimmed}");
        repaired.as_str()
    };

    match decode_line(line) {
        Ok(mut record) => {
            record.extension = extension;
            record.source_line = Some(line_number);
            Some(record)
        }
        Err(e) => {
            sink.log(line_number, line, &format!("{e}; skipping line"));
            None
        }
    }
}

/// Encodes `record` as a single line without a terminator.
///
/// Uses the stored length and checksum, so this is the exact inverse of
/// [`decode_line`] for any decodable line written in uppercase.
#[must_use]
pub fn serialize_line(record: &Record) -> String {
    let mut out = String::with_capacity(MIN_LINE_LEN + record.payload.len() * 2);
    out.push(RECORD_MARK);
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{:02X}{:04X}{:02X}",
        record.declared_len,
        record.address,
        record.kind.code()
    );
    out.push_str(&hex::encode_upper(&record.payload));
    let _ = write!(out, "{:02X}", record.checksum);
    out
}
