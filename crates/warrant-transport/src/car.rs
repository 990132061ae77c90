//! The content-addressable archive container ("CAR").
//!
//! Layout: a varint-length-prefixed CBOR header `{roots, version}` followed
//! by varint-length-prefixed sections of `cid-bytes || block-bytes`. Blocks
//! are addressed by content, so their order inside the archive is
//! irrelevant and duplicates collapse by identifier; root order is the
//! caller's order and is preserved.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::trace;

use warrant_core::codec::{self, read_varint, write_varint};
use warrant_core::{Block, BlockStore, Cid};

use crate::error::CarError;

const VERSION: u64 = 1;

/// A decoded archive: ordered roots plus the block set they reach into.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    pub roots: Vec<Cid>,
    pub blocks: BlockStore,
}

impl Archive {
    /// An empty archive.
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    roots: Vec<Cid>,
    version: u64,
}

/// Encode an archive to bytes.
pub fn encode(archive: &Archive) -> Result<Bytes, CarError> {
    let header = codec::encode(&Header {
        roots: archive.roots.clone(),
        version: VERSION,
    })?;

    let mut out = Vec::with_capacity(header.len() + 16);
    write_varint(&mut out, header.len() as u64);
    out.extend_from_slice(&header);

    for block in archive.blocks.blocks() {
        let cid = block.cid().to_bytes();
        write_varint(&mut out, (cid.len() + block.len()) as u64);
        out.extend_from_slice(&cid);
        out.extend_from_slice(block.bytes());
    }

    trace!(
        roots = archive.roots.len(),
        blocks = archive.blocks.len(),
        bytes = out.len(),
        "encoded archive"
    );
    Ok(Bytes::from(out))
}

/// Decode an archive from bytes.
///
/// Each block's bytes are checked against its declared identifier; decoding
/// never dereferences roots, so missing child blocks surface later as view
/// degradation, not here.
pub fn decode(bytes: &[u8]) -> Result<Archive, CarError> {
    let (header_len, consumed) = read_varint(bytes)?;
    let mut offset = consumed;

    let header_end = offset
        .checked_add(header_len as usize)
        .filter(|end| *end <= bytes.len())
        .ok_or(CarError::Truncated)?;
    let header: Header =
        codec::decode(&bytes[offset..header_end]).map_err(|e| CarError::Header(e.to_string()))?;
    if header.version != VERSION {
        return Err(CarError::Version(header.version));
    }
    offset = header_end;

    let mut blocks = BlockStore::new();
    while offset < bytes.len() {
        let (section_len, consumed) = read_varint(&bytes[offset..])?;
        offset += consumed;

        let section_end = offset
            .checked_add(section_len as usize)
            .filter(|end| *end <= bytes.len())
            .ok_or(CarError::Truncated)?;
        let section = &bytes[offset..section_end];
        offset = section_end;

        let (cid, cid_len) = Cid::read_from(section)?;
        let data = &section[cid_len..];
        if Cid::of(cid.codec(), data) != cid {
            return Err(CarError::DigestMismatch);
        }
        blocks.insert(Block::new(cid, Bytes::copy_from_slice(data)));
    }

    trace!(
        roots = header.roots.len(),
        blocks = blocks.len(),
        "decoded archive"
    );
    Ok(Archive {
        roots: header.roots,
        blocks,
    })
}
