//! Address resolution for extension records.
//!
//! ```text
//! linear  (04): offset = value << 16     value = offset >> 16
//! segment (02): offset = value * 16      value = offset / 16
//! absolute     = offset(extension) + local address
//! ```

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use thiserror::Error;

use crate::RecordKind;

/// Largest local address a record can carry.
pub const LOCAL_ADDRESS_MAX: u64 = 0xFFFF;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// Asked for the offset contribution of a kind that has none.
    #[error("{0:?} is not an address extension kind")]
    InvalidExtensionKind(RecordKind),

    /// The offset needed for `address` does not fit an extension payload.
    #[error("address {address:#x} cannot be expressed with a {kind:?} record")]
    AddressOutOfRange { kind: RecordKind, address: u64 },

    /// A record links to a position that holds no extension record.
    #[error("extension link {0} does not point at an extension record")]
    DanglingExtension(usize),

    /// An extension record whose payload is not exactly one 16-bit value.
    #[error("{kind:?} record carries {len} payload bytes, expected 2")]
    MalformedExtension { kind: RecordKind, len: usize },
}

/// The 16-bit big-endian value of an extension payload.
fn payload_value(kind: RecordKind, payload: &[u8]) -> Result<u64, AddressError> {
    if payload.len() != 2 {
        return Err(AddressError::MalformedExtension {
            kind,
            len: payload.len(),
        });
    }
    Ok(u64::from(BigEndian::read_u16(payload)))
}

/// Offset that an extension record of `kind` with `payload` adds to the
/// local address of the records it governs.
///
/// # Errors
///
/// [`AddressError::InvalidExtensionKind`] for any kind other than the two
/// extension kinds, [`AddressError::MalformedExtension`] unless `payload`
/// is exactly two bytes.
pub fn contribution(kind: RecordKind, payload: &[u8]) -> Result<u64, AddressError> {
    match kind {
        RecordKind::ExtensionLinear => Ok(payload_value(kind, payload)? << 16),
        RecordKind::ExtensionSegment => Ok(payload_value(kind, payload)? * 16),
        other => Err(AddressError::InvalidExtensionKind(other)),
    }
}

/// Inverse of [`contribution`]: the 16-bit payload value of an extension
/// of `kind` whose window starts at or just below `address`.
///
/// # Errors
///
/// [`AddressError::InvalidExtensionKind`] for non-extension kinds,
/// [`AddressError::AddressOutOfRange`] if the value does not fit 16 bits.
pub fn encode_offset(kind: RecordKind, address: u64) -> Result<u16, AddressError> {
    let value = match kind {
        RecordKind::ExtensionLinear => address >> 16,
        RecordKind::ExtensionSegment => address / 16,
        other => return Err(AddressError::InvalidExtensionKind(other)),
    };
    u16::try_from(value).map_err(|_| AddressError::AddressOutOfRange { kind, address })
}

/// Two-byte payload of a new extension record covering `address`.
///
/// # Errors
///
/// Same as [`encode_offset`].
pub fn extension_payload(kind: RecordKind, address: u64) -> Result<Vec<u8>, AddressError> {
    let value = encode_offset(kind, address)?;
    let mut payload = Vec::with_capacity(2);
    // Writing into a Vec cannot fail.
    let _ = payload.write_u16::<BigEndian>(value);
    Ok(payload)
}
