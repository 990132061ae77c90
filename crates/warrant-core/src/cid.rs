//! Content identifiers.
//!
//! A [`Cid`] names a block by the Blake3 hash of its bytes plus a codec tag
//! saying how those bytes are encoded. The binary form follows the CIDv1
//! convention: `version || codec || multihash-code || digest-length || digest`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::{read_varint, write_varint};
use crate::error::CodecError;

/// Codec tag for canonical CBOR blocks.
pub const CBOR: u64 = 0x71;

/// Codec tag for raw (opaque) byte blocks.
pub const RAW: u64 = 0x55;

/// CBOR tag carrying a link in block data (dag-cbor convention).
pub const LINK_TAG: u64 = 42;

/// Multihash code for Blake3 with a 256-bit digest.
const BLAKE3_CODE: u64 = 0x1e;

/// Digest length in bytes.
const DIGEST_LEN: usize = 32;

/// A content identifier: codec tag plus 32-byte Blake3 digest.
///
/// Two blocks with the same bytes and codec have the same `Cid`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    codec: u64,
    digest: [u8; 32],
}

impl Cid {
    /// Create from a codec tag and a precomputed digest.
    pub const fn new(codec: u64, digest: [u8; 32]) -> Self {
        Self { codec, digest }
    }

    /// Compute the identifier of `bytes` under the given codec tag.
    pub fn of(codec: u64, bytes: &[u8]) -> Self {
        Self {
            codec,
            digest: *blake3::hash(bytes).as_bytes(),
        }
    }

    /// The codec tag.
    pub const fn codec(&self) -> u64 {
        self.codec
    }

    /// The raw digest.
    pub const fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Encode to the CIDv1-style binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + DIGEST_LEN);
        write_varint(&mut buf, 1);
        write_varint(&mut buf, self.codec);
        write_varint(&mut buf, BLAKE3_CODE);
        write_varint(&mut buf, DIGEST_LEN as u64);
        buf.extend_from_slice(&self.digest);
        buf
    }

    /// Parse the binary form, requiring the whole buffer to be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let (cid, consumed) = Self::read_from(bytes)?;
        if consumed != bytes.len() {
            return Err(CodecError::Cid("trailing bytes".into()));
        }
        Ok(cid)
    }

    /// Parse a `Cid` from the front of `bytes`, returning it and the number
    /// of bytes consumed. Used by framed containers that pack `cid || data`.
    pub fn read_from(bytes: &[u8]) -> Result<(Self, usize), CodecError> {
        let mut offset = 0;

        let (version, n) = read_varint(&bytes[offset..])?;
        offset += n;
        if version != 1 {
            return Err(CodecError::Cid(format!("unsupported version: {version}")));
        }

        let (codec, n) = read_varint(&bytes[offset..])?;
        offset += n;

        let (hash_code, n) = read_varint(&bytes[offset..])?;
        offset += n;
        if hash_code != BLAKE3_CODE {
            return Err(CodecError::Cid(format!(
                "unsupported hash code: {hash_code:#x}"
            )));
        }

        let (len, n) = read_varint(&bytes[offset..])?;
        offset += n;
        if len as usize != DIGEST_LEN {
            return Err(CodecError::Cid(format!("unexpected digest length: {len}")));
        }

        let rest = &bytes[offset..];
        if rest.len() < DIGEST_LEN {
            return Err(CodecError::Cid("truncated digest".into()));
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&rest[..DIGEST_LEN]);
        offset += DIGEST_LEN;

        Ok((Self { codec, digest }, offset))
    }

    /// Convert the digest to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({:#x}:{})", self.codec, &self.to_hex()[..16])
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Cid {
    fn as_ref(&self) -> &[u8] {
        &self.digest
    }
}

// Links travel in block data as CBOR tag 42 over the binary form.
impl Serialize for Cid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let tagged: ciborium::tag::Required<serde_bytes::ByteBuf, LINK_TAG> =
            ciborium::tag::Required(serde_bytes::ByteBuf::from(self.to_bytes()));
        tagged.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tagged =
            ciborium::tag::Required::<serde_bytes::ByteBuf, LINK_TAG>::deserialize(deserializer)?;
        Cid::from_bytes(&tagged.0).map_err(serde::de::Error::custom)
    }
}
