//! DAG-PB encoding/decoding for directory nodes
//!
//! File blocks are stored raw (not wrapped). Directory nodes are protobuf
//! `PBNode` messages carrying a UnixFS directory marker.
//!
//! **Determinism:** links are written exactly in the order given, so the
//! caller controls ordering (the builder sorts by name). Field order follows
//! DAG-PB canonical form: all links (field 2) first, then data (field 1).
//!
//! Wire layout:
//! - PBNode.Links (2): repeated PBLink
//!   - PBLink.Hash (1): binary CID
//!   - PBLink.Name (2): UTF-8 name
//!   - PBLink.Tsize (3): varint cumulative size
//! - PBNode.Data (1): UnixFS `Data { Type = Directory }`

use thiserror::Error;

use crate::cid::{Cid, CidError};
use crate::types::sha256;
use crate::varint::{self, VarintError};

/// UnixFS `Data` message with `Type = Directory` (field 1, varint 1)
pub const DIRECTORY_MARKER: [u8; 2] = [0x08, 0x01];

const WIRE_VARINT: u64 = 0;
const WIRE_LEN: u64 = 2;

/// Error type for codec operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Varint error: {0}")]
    Varint(#[from] VarintError),
    #[error("Invalid link CID: {0}")]
    InvalidCid(#[from] CidError),
    #[error("Unexpected field {field} with wire type {wire_type}")]
    UnexpectedField { field: u64, wire_type: u64 },
    #[error("Length-delimited field overruns node ({0} bytes)")]
    Overrun(usize),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Link name is not UTF-8")]
    InvalidName,
    #[error("Not a directory node")]
    NotDirectory,
}

/// A named link inside a directory node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirLink {
    pub name: String,
    pub cid: Cid,
    /// Cumulative size of the linked DAG
    pub size: u64,
}

impl DirLink {
    pub fn new(name: impl Into<String>, cid: Cid, size: u64) -> Self {
        Self {
            name: name.into(),
            cid,
            size,
        }
    }
}

fn put_key(field: u64, wire_type: u64, out: &mut Vec<u8>) {
    varint::encode((field << 3) | wire_type, out);
}

fn put_bytes(field: u64, bytes: &[u8], out: &mut Vec<u8>) {
    put_key(field, WIRE_LEN, out);
    varint::encode(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

fn encode_link(link: &DirLink) -> Vec<u8> {
    let mut out = Vec::with_capacity(link.cid.encoded_len() + link.name.len() + 16);
    put_bytes(1, &link.cid.to_bytes(), &mut out);
    put_bytes(2, link.name.as_bytes(), &mut out);
    put_key(3, WIRE_VARINT, &mut out);
    varint::encode(link.size, &mut out);
    out
}

/// Encode an ordered link list as a directory node
pub fn encode_directory(links: &[DirLink]) -> Vec<u8> {
    let mut out = Vec::new();
    for link in links {
        put_bytes(2, &encode_link(link), &mut out);
    }
    put_bytes(1, &DIRECTORY_MARKER, &mut out);
    out
}

/// Encode a directory node and compute its hash
pub fn encode_and_hash(links: &[DirLink]) -> (Vec<u8>, crate::types::Hash) {
    let data = encode_directory(links);
    let hash = sha256(&data);
    (data, hash)
}

/// Minimal protobuf field reader
struct Fields<'a> {
    data: &'a [u8],
    offset: usize,
}

enum Value<'a> {
    Varint(u64),
    Bytes(&'a [u8]),
}

impl<'a> Fields<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn varint(&mut self) -> Result<u64, CodecError> {
        let (value, used) = varint::decode(&self.data[self.offset..])?;
        self.offset += used;
        Ok(value)
    }

    fn next_field(&mut self) -> Result<Option<(u64, Value<'a>)>, CodecError> {
        if self.offset >= self.data.len() {
            return Ok(None);
        }
        let key = self.varint()?;
        let (field, wire_type) = (key >> 3, key & 0x7);
        match wire_type {
            WIRE_VARINT => Ok(Some((field, Value::Varint(self.varint()?)))),
            WIRE_LEN => {
                let len = self.varint()? as usize;
                let end = self
                    .offset
                    .checked_add(len)
                    .filter(|end| *end <= self.data.len())
                    .ok_or(CodecError::Overrun(len))?;
                let bytes = &self.data[self.offset..end];
                self.offset = end;
                Ok(Some((field, Value::Bytes(bytes))))
            }
            _ => Err(CodecError::UnexpectedField { field, wire_type }),
        }
    }
}

fn decode_link(data: &[u8]) -> Result<DirLink, CodecError> {
    let mut cid = None;
    let mut name = None;
    let mut size = 0;

    let mut fields = Fields::new(data);
    while let Some((field, value)) = fields.next_field()? {
        match (field, value) {
            (1, Value::Bytes(bytes)) => cid = Some(Cid::from_bytes(bytes)?),
            (2, Value::Bytes(bytes)) => {
                name = Some(
                    std::str::from_utf8(bytes)
                        .map_err(|_| CodecError::InvalidName)?
                        .to_string(),
                )
            }
            (3, Value::Varint(v)) => size = v,
            (field, Value::Varint(_)) => {
                return Err(CodecError::UnexpectedField { field, wire_type: WIRE_VARINT })
            }
            (field, Value::Bytes(_)) => {
                return Err(CodecError::UnexpectedField { field, wire_type: WIRE_LEN })
            }
        }
    }

    Ok(DirLink {
        name: name.ok_or(CodecError::MissingField("Name"))?,
        cid: cid.ok_or(CodecError::MissingField("Hash"))?,
        size,
    })
}

/// Decode a directory node back to its links
pub fn decode_directory(data: &[u8]) -> Result<Vec<DirLink>, CodecError> {
    let mut links = Vec::new();
    let mut marker = None;

    let mut fields = Fields::new(data);
    while let Some((field, value)) = fields.next_field()? {
        match (field, value) {
            (1, Value::Bytes(bytes)) => marker = Some(bytes),
            (2, Value::Bytes(bytes)) => links.push(decode_link(bytes)?),
            (field, Value::Varint(_)) => {
                return Err(CodecError::UnexpectedField { field, wire_type: WIRE_VARINT })
            }
            (field, Value::Bytes(_)) => {
                return Err(CodecError::UnexpectedField { field, wire_type: WIRE_LEN })
            }
        }
    }

    match marker {
        Some(bytes) if bytes == DIRECTORY_MARKER => Ok(links),
        _ => Err(CodecError::NotDirectory),
    }
}

/// Check if data is a directory node
pub fn is_directory_node(data: &[u8]) -> bool {
    decode_directory(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_directory_bytes() {
        let encoded = encode_directory(&[]);
        assert_eq!(encoded, vec![0x0a, 0x02, 0x08, 0x01]);
    }

    #[test]
    fn test_empty_directory_cid() {
        let (_, hash) = encode_and_hash(&[]);
        assert_eq!(
            Cid::directory(hash).to_string(),
            "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354"
        );
    }

    #[test]
    fn test_encode_decode_links() {
        let links = vec![
            DirLink::new("file1.txt", Cid::raw([1u8; 32]), 100),
            DirLink::new("dir", Cid::directory([2u8; 32]), 4242),
        ];

        let encoded = encode_directory(&links);
        let decoded = decode_directory(&encoded).unwrap();

        assert_eq!(decoded, links);
    }

    #[test]
    fn test_encoder_keeps_given_order() {
        let a = DirLink::new("a", Cid::raw([1u8; 32]), 1);
        let b = DirLink::new("b", Cid::raw([2u8; 32]), 1);

        let ab = encode_directory(&[a.clone(), b.clone()]);
        let ba = encode_directory(&[b.clone(), a.clone()]);

        assert_ne!(ab, ba);
        assert_eq!(decode_directory(&ba).unwrap(), vec![b, a]);
    }

    #[test]
    fn test_encoding_determinism() {
        let links = vec![DirLink::new("file.txt", Cid::raw([42u8; 32]), 100)];
        let (data1, hash1) = encode_and_hash(&links);
        let (data2, hash2) = encode_and_hash(&links);
        assert_eq!(data1, data2);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_link_field_layout() {
        let link = DirLink::new("x", Cid::raw([0u8; 32]), 2);
        let encoded = encode_directory(&[link]);
        // PBNode.Links key, then PBLink.Hash key and CID length
        assert_eq!(encoded[0], 0x12);
        assert_eq!(&encoded[2..4], &[0x0a, 36]);
        assert!(encoded.ends_with(&[0x0a, 0x02, 0x08, 0x01]));
    }

    #[test]
    fn test_raw_bytes_are_not_directories() {
        assert!(!is_directory_node(b"hello world"));
        assert!(!is_directory_node(&[]));
        assert!(is_directory_node(&encode_directory(&[])));
    }

    #[test]
    fn test_truncated_node() {
        let encoded = encode_directory(&[DirLink::new("a", Cid::raw([3u8; 32]), 9)]);
        let err = decode_directory(&encoded[..10]).unwrap_err();
        assert!(matches!(err, CodecError::Overrun(_)));
    }
}
