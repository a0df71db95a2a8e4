//! Record codec
//!
//! On-medium layout of one entry and of the end-of-store marker.
//!
//! ## Layout
//! ```text
//! ┌─────────────┬─────────────┬───────────────┬──────────────┐
//! │ KeyLen (2)  │     Key     │ ValueLen (2)  │    Value     │  record
//! └─────────────┴─────────────┴───────────────┴──────────────┘
//!   ... records back to back from offset 0, append order ...
//! ┌─────────────┐
//! │ 0x00 0x00   │  terminator (KeyLen == 0)
//! └─────────────┘
//! ```
//!
//! Lengths are little-endian. No header, magic, checksum or padding.

use crate::error::Result;
use crate::medium::Medium;

/// Size of a KeyLen or ValueLen field
pub const LEN_FIELD_SIZE: usize = 2;

/// Size of the end-of-store marker
pub const TERMINATOR_SIZE: usize = 2;

/// Largest key or value a length field can describe
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Encode a length field
pub fn encode_len(len: u16) -> [u8; LEN_FIELD_SIZE] {
    len.to_le_bytes()
}

/// Decode a length field
pub fn decode_len(bytes: [u8; LEN_FIELD_SIZE]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// Bytes occupied by one record with the given payload sizes
pub fn record_size(key_len: usize, value_len: usize) -> usize {
    LEN_FIELD_SIZE + key_len + LEN_FIELD_SIZE + value_len
}

/// Read a length field at a logical offset
pub fn read_len<M: Medium + ?Sized>(medium: &mut M, at: usize) -> Result<u16> {
    let lo = medium.fetch(at)?;
    let hi = medium.fetch(at + 1)?;
    Ok(decode_len([lo, hi]))
}

/// Write a length field at a logical offset
pub fn write_len<M: Medium + ?Sized>(medium: &mut M, at: usize, len: u16) -> Result<()> {
    let [lo, hi] = encode_len(len);
    medium.store(at, lo)?;
    medium.store(at + 1, hi)
}

/// Write the end-of-store marker at a logical offset
pub fn write_terminator<M: Medium + ?Sized>(medium: &mut M, at: usize) -> Result<()> {
    write_len(medium, at, 0)
}

/// Encode one record exactly as it appears on the medium
///
/// Callers must keep both payloads within `MAX_FIELD_LEN`.
pub fn encode_record(key: &[u8], value: &[u8]) -> Vec<u8> {
    debug_assert!(key.len() <= MAX_FIELD_LEN && value.len() <= MAX_FIELD_LEN);

    let mut bytes = Vec::with_capacity(record_size(key.len(), value.len()));
    bytes.extend_from_slice(&encode_len(key.len() as u16));
    bytes.extend_from_slice(key);
    bytes.extend_from_slice(&encode_len(value.len() as u16));
    bytes.extend_from_slice(value);
    bytes
}
