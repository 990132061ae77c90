//! The DAG view layer: block stores, lookups, and transitive iteration.
//!
//! A [`BlockStore`] is owned by exactly one builder while a token is under
//! construction; once the final root is written the store is frozen behind
//! an `Arc` and shared read-only across every view and reader. Merging two
//! graphs (for transport) copies blocks into a fresh store, never mutates a
//! shared one.

use ciborium::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

use crate::block::{Block, ContentAddressed};
use crate::cid::{Cid, LINK_TAG};
use crate::codec;
use crate::error::{CodecError, ViewError};

/// An insertion-ordered `Cid -> Block` map.
///
/// Insertion order is preserved so archives built from a store are
/// byte-deterministic; lookups stay O(1).
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: IndexMap<Cid, Block>,
}

impl BlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block, returning `false` if it was already present.
    /// Duplicate inserts collapse: keys are content identifiers.
    pub fn insert(&mut self, block: Block) -> bool {
        let cid = *block.cid();
        self.blocks.insert(cid, block).is_none()
    }

    /// Copy every block from an iterator into the store.
    pub fn extend(&mut self, blocks: impl IntoIterator<Item = Block>) {
        for block in blocks {
            self.insert(block);
        }
    }

    /// Look up a block by identifier.
    pub fn get(&self, cid: &Cid) -> Option<&Block> {
        self.blocks.get(cid)
    }

    /// Whether a block is present.
    pub fn contains(&self, cid: &Cid) -> bool {
        self.blocks.contains_key(cid)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }
}

/// Look up `link`, tolerating absence.
pub fn get<'a>(link: &Cid, blocks: &'a BlockStore) -> Option<&'a Block> {
    blocks.get(link)
}

/// Look up `link`, treating absence as an error.
pub fn require<'a>(link: &Cid, blocks: &'a BlockStore) -> Result<&'a Block, ViewError> {
    blocks.get(link).ok_or(ViewError::BlockNotFound(*link))
}

/// Canonically encode `value`, hash it, insert the resulting block into
/// `store`, and return the block as the new root.
pub fn write_into<T: Serialize>(value: &T, store: &mut BlockStore) -> Result<Block, CodecError> {
    let bytes = codec::encode(value)?;
    let block = Block::cbor(bytes);
    store.insert(block.clone());
    Ok(block)
}

/// Extract every link (CBOR tag 42) from a block's data.
///
/// Blocks that do not decode as CBOR (raw payloads) have no links.
pub fn links(block: &Block) -> Vec<Cid> {
    let mut out = Vec::new();
    if let Ok(value) = codec::decode_value(block.bytes()) {
        collect_links(&value, &mut out);
    }
    out
}

fn collect_links(value: &Value, out: &mut Vec<Cid>) {
    match value {
        Value::Tag(tag, inner) if *tag == LINK_TAG => {
            if let Value::Bytes(bytes) = inner.as_ref() {
                if let Ok(cid) = Cid::from_bytes(bytes) {
                    out.push(cid);
                }
            }
        }
        Value::Tag(_, inner) => collect_links(inner, out),
        Value::Array(items) => {
            for item in items {
                collect_links(item, out);
            }
        }
        Value::Map(entries) => {
            for (key, val) in entries {
                collect_links(key, out);
                collect_links(val, out);
            }
        }
        _ => {}
    }
}

/// Lazily iterate every block transitively reachable from `root`.
///
/// Ordering guarantee: dependencies before dependents (post-order), with the
/// root yielded last. Each block is yielded at most once; subgraphs whose
/// blocks are absent from the store are skipped rather than failing, and the
/// visited set terminates traversal over any hash graph.
pub fn iterate<'a>(root: &Cid, blocks: &'a BlockStore) -> Blocks<'a> {
    let mut iter = Blocks {
        store: blocks,
        visited: HashSet::new(),
        stack: Vec::new(),
    };
    iter.descend(*root);
    iter
}

/// Iterator over a block graph, produced by [`iterate`].
pub struct Blocks<'a> {
    store: &'a BlockStore,
    visited: HashSet<Cid>,
    stack: Vec<Frame<'a>>,
}

struct Frame<'a> {
    block: &'a Block,
    links: std::vec::IntoIter<Cid>,
}

impl<'a> Blocks<'a> {
    fn descend(&mut self, cid: Cid) {
        if !self.visited.insert(cid) {
            return;
        }
        if let Some(block) = self.store.get(&cid) {
            self.stack.push(Frame {
                block,
                links: links(block).into_iter(),
            });
        }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let child = match self.stack.last_mut() {
                None => return None,
                Some(frame) => frame.links.next(),
            };
            match child {
                Some(cid) => self.descend(cid),
                None => match self.stack.pop() {
                    Some(frame) => return Some(frame.block),
                    None => return None,
                },
            }
        }
    }
}

/// A reference that either resolved to a typed view or degraded to the bare
/// link because the referenced blocks were not locally available.
#[derive(Debug, Clone, PartialEq)]
pub enum MaybeResolved<T> {
    /// The referenced blocks were present; a full view is available.
    Resolved(T),
    /// The referenced root block was absent (or undecodable); only the link
    /// is known.
    Unresolved(Cid),
}

impl<T> MaybeResolved<T> {
    /// The resolved view, if any.
    pub fn resolved(&self) -> Option<&T> {
        match self {
            MaybeResolved::Resolved(view) => Some(view),
            MaybeResolved::Unresolved(_) => None,
        }
    }

    /// Whether the reference resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(self, MaybeResolved::Resolved(_))
    }
}

impl<T: ContentAddressed> MaybeResolved<T> {
    /// The link, whether or not it resolved.
    pub fn cid(&self) -> &Cid {
        match self {
            MaybeResolved::Resolved(view) => view.cid(),
            MaybeResolved::Unresolved(cid) => cid,
        }
    }
}

impl<T> From<Cid> for MaybeResolved<T> {
    fn from(cid: Cid) -> Self {
        MaybeResolved::Unresolved(cid)
    }
}
