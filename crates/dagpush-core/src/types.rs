//! Core value types shared by every stage of the pipeline
//!
//! A block is stored as CID -> bytes, where the CID is derived from
//! SHA256(bytes). Blocks are never mutated after creation.

use sha2::{Digest, Sha256};

use crate::cid::Cid;

/// 32-byte SHA256 hash used as content address
pub type Hash = [u8; 32];

/// SHA256 of `data`
pub fn sha256(data: &[u8]) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(data));
    hash
}

/// Convert hash to hex string
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Kind of content a CID points to
///
/// Values are the multicodec codes written into the binary CID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u64)]
pub enum ContentType {
    /// Raw file bytes (leaf)
    Raw = 0x55,
    /// DAG-PB directory node
    Directory = 0x70,
}

impl ContentType {
    /// Multicodec code
    pub fn code(self) -> u64 {
        self as u64
    }

    /// Create from multicodec code
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x55 => Some(ContentType::Raw),
            0x70 => Some(ContentType::Directory),
            _ => None,
        }
    }
}

/// Unit of storage and upload: a CID and the bytes it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub cid: Cid,
    pub data: Vec<u8>,
}

impl Block {
    pub fn new(cid: Cid, data: Vec<u8>) -> Self {
        Self { cid, data }
    }

    /// Raw leaf block: CID is derived from the bytes
    pub fn raw(data: Vec<u8>) -> Self {
        let cid = Cid::raw(sha256(&data));
        Self { cid, data }
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check that re-hashing the payload reproduces the CID digest
    pub fn verify(&self) -> bool {
        sha256(&self.data) == self.cid.digest
    }
}

/// A named input file for the tree builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Slash-delimited relative path
    pub path: String,
    pub content: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}
