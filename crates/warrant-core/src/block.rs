//! Blocks: immutable `(cid, bytes)` pairs.

use bytes::Bytes;

use crate::cid::{self, Cid};

/// An immutable content-addressed block. `Bytes` is cheaply clonable, so
/// blocks can be aliased across views and archives without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    cid: Cid,
    bytes: Bytes,
}

impl Block {
    /// Create a block from a precomputed identifier and its bytes.
    ///
    /// The caller is responsible for `cid` actually addressing `bytes`;
    /// use [`Block::cbor`] or [`Block::raw`] to compute it.
    pub fn new(cid: Cid, bytes: Bytes) -> Self {
        Self { cid, bytes }
    }

    /// Create a canonical-CBOR block, hashing the bytes.
    pub fn cbor(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            cid: Cid::of(cid::CBOR, &bytes),
            bytes,
        }
    }

    /// Create a raw byte block, hashing the bytes.
    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            cid: Cid::of(cid::RAW, &bytes),
            bytes,
        }
    }

    /// The block's identifier.
    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    /// The block's bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The byte length of the block.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the block is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Anything addressable by a content identifier: blocks and the typed views
/// built over them.
pub trait ContentAddressed {
    /// The root content identifier.
    fn cid(&self) -> &Cid;
}

impl ContentAddressed for Block {
    fn cid(&self) -> &Cid {
        &self.cid
    }
}
