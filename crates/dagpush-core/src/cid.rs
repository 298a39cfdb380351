//! Content identifiers (CIDv1 over SHA2-256)
//!
//! Binary form: `varint(version) ‖ varint(codec) ‖ varint(0x12) ‖ varint(32) ‖ digest`.
//! Text form: multibase base32 (lowercase, unpadded) with a `b` prefix.

use std::fmt;
use std::str::FromStr;

use data_encoding::{DecodeError, BASE32_NOPAD};
use thiserror::Error;

use crate::types::{ContentType, Hash};
use crate::varint::{self, VarintError};

/// The only CID version produced or accepted
pub const CID_VERSION: u64 = 1;

/// Multihash code for SHA2-256
pub const SHA2_256: u64 = 0x12;

/// SHA2-256 digest length
pub const DIGEST_LEN: usize = 32;

/// Multibase prefix for lowercase base32
const MULTIBASE_BASE32: char = 'b';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidError {
    #[error("Invalid digest length: expected {DIGEST_LEN}, got {0}")]
    InvalidDigestLength(usize),
    #[error("Unsupported CID version: {0}")]
    UnsupportedVersion(u64),
    #[error("Unsupported content codec: 0x{0:x}")]
    UnsupportedCodec(u64),
    #[error("Unsupported multihash: 0x{0:x}")]
    UnsupportedHash(u64),
    #[error("Varint error: {0}")]
    Varint(#[from] VarintError),
    #[error("Truncated CID")]
    Truncated,
    #[error("Trailing bytes after CID: {0}")]
    TrailingBytes(usize),
    #[error("Invalid multibase prefix: {0:?}")]
    InvalidMultibase(Option<char>),
    #[error("Invalid base32 character: {0:?}")]
    InvalidBase32(char),
    #[error("Non-canonical base32: {0}")]
    Base32(#[from] DecodeError),
}

/// Versioned, hash-derived content identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    pub version: u64,
    pub content_type: ContentType,
    pub digest: Hash,
}

/// Pack a digest into a CID
pub fn pack(digest: &[u8], version: u64, content_type: ContentType) -> Result<Cid, CidError> {
    if version != CID_VERSION {
        return Err(CidError::UnsupportedVersion(version));
    }
    let digest: Hash = digest
        .try_into()
        .map_err(|_| CidError::InvalidDigestLength(digest.len()))?;
    Ok(Cid {
        version,
        content_type,
        digest,
    })
}

impl Cid {
    /// CIDv1 for raw leaf bytes
    pub fn raw(digest: Hash) -> Self {
        Self {
            version: CID_VERSION,
            content_type: ContentType::Raw,
            digest,
        }
    }

    /// CIDv1 for a DAG-PB directory node
    pub fn directory(digest: Hash) -> Self {
        Self {
            version: CID_VERSION,
            content_type: ContentType::Directory,
            digest,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.content_type == ContentType::Directory
    }

    /// Binary form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        varint::encode(self.version, &mut out);
        varint::encode(self.content_type.code(), &mut out);
        varint::encode(SHA2_256, &mut out);
        varint::encode(DIGEST_LEN as u64, &mut out);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Length of the binary form
    pub fn encoded_len(&self) -> usize {
        varint::encoded_len(self.version)
            + varint::encoded_len(self.content_type.code())
            + varint::encoded_len(SHA2_256)
            + varint::encoded_len(DIGEST_LEN as u64)
            + DIGEST_LEN
    }

    /// Parse a CID from the start of `data`
    /// Returns (cid, bytes consumed)
    pub fn read_prefix(data: &[u8]) -> Result<(Self, usize), CidError> {
        let mut offset = 0;

        let (version, used) = varint::decode(data)?;
        offset += used;
        if version != CID_VERSION {
            return Err(CidError::UnsupportedVersion(version));
        }

        let (codec, used) = varint::decode(&data[offset..])?;
        offset += used;
        let content_type =
            ContentType::from_code(codec).ok_or(CidError::UnsupportedCodec(codec))?;

        let (hash_code, used) = varint::decode(&data[offset..])?;
        offset += used;
        if hash_code != SHA2_256 {
            return Err(CidError::UnsupportedHash(hash_code));
        }

        let (digest_len, used) = varint::decode(&data[offset..])?;
        offset += used;
        if digest_len != DIGEST_LEN as u64 {
            return Err(CidError::InvalidDigestLength(digest_len as usize));
        }
        if data.len() < offset + DIGEST_LEN {
            return Err(CidError::Truncated);
        }

        let cid = pack(&data[offset..offset + DIGEST_LEN], version, content_type)?;
        Ok((cid, offset + DIGEST_LEN))
    }

    /// Parse a complete binary CID
    pub fn from_bytes(data: &[u8]) -> Result<Self, CidError> {
        let (cid, used) = Self::read_prefix(data)?;
        if used != data.len() {
            return Err(CidError::TrailingBytes(data.len() - used));
        }
        Ok(cid)
    }

    /// Parse the multibase text form
    pub fn parse(s: &str) -> Result<Self, CidError> {
        let mut chars = s.chars();
        match chars.next() {
            Some(MULTIBASE_BASE32) => {}
            other => return Err(CidError::InvalidMultibase(other)),
        }
        let bytes = decode_base32(chars.as_str())?;
        Self::from_bytes(&bytes)
    }

    /// Short form for log lines
    pub fn short(&self) -> String {
        let s = self.to_string();
        let start = s.len().saturating_sub(12);
        format!("…{}", &s[start..])
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", MULTIBASE_BASE32, encode_base32(&self.to_bytes()))
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Multibase base32 body: RFC 4648 alphabet, lowercase, unpadded
fn encode_base32(data: &[u8]) -> String {
    BASE32_NOPAD.encode(data).to_ascii_lowercase()
}

/// Inverse of [`encode_base32`]; rejects uppercase, bad lengths and
/// non-zero trailing bits
fn decode_base32(s: &str) -> Result<Vec<u8>, CidError> {
    if let Some(c) = s.chars().find(|c| !matches!(c, 'a'..='z' | '2'..='7')) {
        return Err(CidError::InvalidBase32(c));
    }
    Ok(BASE32_NOPAD.decode(s.to_ascii_uppercase().as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sha256;

    #[test]
    fn test_pack_rejects_bad_digest_length() {
        assert_eq!(
            pack(&[0u8; 31], 1, ContentType::Raw),
            Err(CidError::InvalidDigestLength(31))
        );
        assert_eq!(
            pack(&[0u8; 33], 1, ContentType::Raw),
            Err(CidError::InvalidDigestLength(33))
        );
    }

    #[test]
    fn test_pack_rejects_other_versions() {
        assert_eq!(
            pack(&[0u8; 32], 0, ContentType::Directory),
            Err(CidError::UnsupportedVersion(0))
        );
    }

    #[test]
    fn test_pack_is_pure() {
        let digest = sha256(b"hi");
        let a = pack(&digest, 1, ContentType::Raw).unwrap();
        let b = pack(&digest, 1, ContentType::Raw).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Cid::raw(digest));
        assert_ne!(a, Cid::directory(digest));
    }

    #[test]
    fn test_empty_raw_block_cid() {
        let cid = Cid::raw(sha256(b""));
        assert_eq!(
            cid.to_string(),
            "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku"
        );
    }

    #[test]
    fn test_binary_layout() {
        let cid = Cid::directory([7u8; 32]);
        let bytes = cid.to_bytes();
        assert_eq!(&bytes[..4], &[0x01, 0x70, 0x12, 0x20]);
        assert_eq!(bytes.len(), 36);
        assert_eq!(cid.encoded_len(), 36);
        assert_eq!(Cid::from_bytes(&bytes).unwrap(), cid);
    }

    #[test]
    fn test_display_parse_roundtrip() {
        for cid in [Cid::raw(sha256(b"a")), Cid::directory(sha256(b"b"))] {
            let text = cid.to_string();
            assert!(text.starts_with("baf"));
            assert_eq!(Cid::parse(&text).unwrap(), cid);
            assert_eq!(text.parse::<Cid>().unwrap(), cid);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Cid::parse("Qmabc"),
            Err(CidError::InvalidMultibase(Some('Q')))
        );
        assert_eq!(Cid::parse(""), Err(CidError::InvalidMultibase(None)));
        assert_eq!(Cid::parse("bafy!"), Err(CidError::InvalidBase32('!')));
    }

    #[test]
    fn test_base32_rfc4648_vectors() {
        assert_eq!(encode_base32(b""), "");
        assert_eq!(encode_base32(b"f"), "my");
        assert_eq!(encode_base32(b"fo"), "mzxq");
        assert_eq!(encode_base32(b"foo"), "mzxw6");
        assert_eq!(encode_base32(b"foob"), "mzxw6yq");
        assert_eq!(encode_base32(b"fooba"), "mzxw6ytb");
        assert_eq!(encode_base32(b"foobar"), "mzxw6ytboi");
        assert_eq!(decode_base32("mzxw6ytboi").unwrap(), b"foobar");
    }

    #[test]
    fn test_base32_rejects_non_canonical_input() {
        // "my" is the only encoding of "f"; "mz" carries a set trailing bit
        assert!(matches!(decode_base32("mz"), Err(CidError::Base32(_))));
        // a lone trailing symbol cannot complete a byte
        assert!(matches!(decode_base32("mzxw6a"), Err(CidError::Base32(_))));
        assert_eq!(decode_base32("MZXW6"), Err(CidError::InvalidBase32('M')));
    }

    #[test]
    fn test_parse_accepts_only_display_form() {
        let cid = Cid::raw(sha256(b"hi"));
        let text = cid.to_string();
        assert_eq!(Cid::parse(&text), Ok(cid));

        let extended = format!("{}a", text);
        assert!(Cid::parse(&extended).is_err());

        let shouting = format!("b{}", text[1..].to_ascii_uppercase());
        assert!(matches!(
            Cid::parse(&shouting),
            Err(CidError::InvalidBase32(_))
        ));
    }

    #[test]
    fn test_read_prefix_and_trailing() {
        let cid = Cid::raw([1u8; 32]);
        let mut bytes = cid.to_bytes();
        bytes.extend_from_slice(b"payload");

        let (parsed, used) = Cid::read_prefix(&bytes).unwrap();
        assert_eq!(parsed, cid);
        assert_eq!(used, 36);
        assert_eq!(Cid::from_bytes(&bytes), Err(CidError::TrailingBytes(7)));
    }

    #[test]
    fn test_read_prefix_rejects_foreign_codecs() {
        // dag-cbor
        let mut bytes = vec![0x01, 0x71, 0x12, 0x20];
        bytes.extend_from_slice(&[0u8; 32]);
        assert_eq!(Cid::from_bytes(&bytes), Err(CidError::UnsupportedCodec(0x71)));

        // blake2b-256
        let mut bytes = vec![0x01, 0x55, 0xa0, 0xe4, 0x02, 0x20];
        bytes.extend_from_slice(&[0u8; 32]);
        assert_eq!(Cid::from_bytes(&bytes), Err(CidError::UnsupportedHash(0xb220)));

        assert_eq!(
            Cid::from_bytes(&[0x01, 0x55, 0x12, 0x20, 0x00]),
            Err(CidError::Truncated)
        );
    }
}
