//! Unsigned LEB128 varints (multiformats unsigned-varint / protobuf varint)

use thiserror::Error;

/// Longest varint accepted on read (enough for 63 bits)
pub const MAX_VARINT_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarintError {
    #[error("unexpected end of data in varint")]
    Truncated,
    #[error("varint longer than {MAX_VARINT_LEN} bytes")]
    Overflow,
}

/// Append `value` to `out`
pub fn encode(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Encoded length of `value`
pub fn encoded_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Decode a varint from the start of `data`
/// Returns (value, bytes consumed)
pub fn decode(data: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value: u64 = 0;
    for (i, byte) in data.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(VarintError::Overflow);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if data.len() >= MAX_VARINT_LEN {
        Err(VarintError::Overflow)
    } else {
        Err(VarintError::Truncated)
    }
}
