//! CAR (v1) block archives
//!
//! `varint(header_len) ‖ header ‖ { varint(len) ‖ cid ‖ payload }*`
//!
//! The reader never interprets the header; it returns every record after it.
//! The writer emits a DAG-CBOR header `{"roots": [..], "version": 1}`.

use thiserror::Error;

use crate::cid::{Cid, CidError};
use crate::types::Block;
use crate::varint::{self, VarintError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CarError {
    #[error("Varint error at offset {offset}: {source}")]
    Varint { offset: usize, source: VarintError },
    #[error("Record at offset {offset} needs {len} bytes, {available} available")]
    Truncated {
        offset: usize,
        len: usize,
        available: usize,
    },
    #[error("Empty record at offset {0}")]
    EmptyRecord(usize),
    #[error("Invalid CID in record at offset {offset}: {source}")]
    InvalidCid { offset: usize, source: CidError },
    #[error("Hash mismatch for {0}")]
    HashMismatch(Cid),
    #[error("Too many roots for header: {0}")]
    TooManyRoots(usize),
}

/// Read one length-prefixed record starting at `offset`
/// Returns (record body, offset after the record)
fn read_record(data: &[u8], offset: usize) -> Result<(&[u8], usize), CarError> {
    let (len, used) =
        varint::decode(&data[offset..]).map_err(|source| CarError::Varint { offset, source })?;
    let start = offset + used;
    let available = data.len() - start;
    let len = usize::try_from(len).unwrap_or(usize::MAX);
    if len > available {
        return Err(CarError::Truncated {
            offset,
            len,
            available,
        });
    }
    Ok((&data[start..start + len], start + len))
}

/// Parse an archive into its blocks, skipping the header
///
/// Any malformed record fails the whole read.
pub fn read_car(data: &[u8]) -> Result<Vec<Block>, CarError> {
    let (_header, mut offset) = read_record(data, 0)?;

    let mut blocks = Vec::new();
    while offset < data.len() {
        let record_offset = offset;
        let (record, next) = read_record(data, offset)?;
        if record.is_empty() {
            return Err(CarError::EmptyRecord(record_offset));
        }

        let (cid, used) = Cid::read_prefix(record).map_err(|source| CarError::InvalidCid {
            offset: record_offset,
            source,
        })?;
        let block = Block::new(cid, record[used..].to_vec());
        if !block.verify() {
            return Err(CarError::HashMismatch(cid));
        }

        blocks.push(block);
        offset = next;
    }

    Ok(blocks)
}

/// DAG-CBOR header: `{"roots": [cid..], "version": 1}`
/// Keys are in canonical (length-first) order.
fn encode_header(roots: &[Cid]) -> Result<Vec<u8>, CarError> {
    if roots.len() > 23 {
        return Err(CarError::TooManyRoots(roots.len()));
    }

    let mut out = Vec::new();
    out.push(0xa2); // map(2)
    out.push(0x65); // text(5)
    out.extend_from_slice(b"roots");
    out.push(0x80 | roots.len() as u8); // array(n)
    for root in roots {
        let cid = root.to_bytes();
        out.extend_from_slice(&[0xd8, 0x2a]); // tag(42)
        out.push(0x58); // bytes, 1-byte length
        out.push((cid.len() + 1) as u8);
        out.push(0x00); // multibase identity prefix
        out.extend_from_slice(&cid);
    }
    out.push(0x67); // text(7)
    out.extend_from_slice(b"version");
    out.push(0x01);
    Ok(out)
}

/// Write blocks into an archive with the given roots
pub fn write_car(roots: &[Cid], blocks: &[Block]) -> Result<Vec<u8>, CarError> {
    let header = encode_header(roots)?;

    let mut out = Vec::with_capacity(
        header.len() + blocks.iter().map(|b| b.len() + 48).sum::<usize>() + 8,
    );
    varint::encode(header.len() as u64, &mut out);
    out.extend_from_slice(&header);

    for block in blocks {
        let cid = block.cid.to_bytes();
        varint::encode((cid.len() + block.len()) as u64, &mut out);
        out.extend_from_slice(&cid);
        out.extend_from_slice(&block.data);
    }

    Ok(out)
}
