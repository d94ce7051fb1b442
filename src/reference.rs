// patricia-trie
// Copyright (C) 2026 the patricia-trie authors

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Reference rule (component D): how a parent points at a child node.

use sha3::{Digest, Keccak256};

/// A 32-byte Keccak-256 digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash32(pub [u8; 32]);

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash32(bytes)
    }
}

/// Computes the Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> Hash32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash32(hasher.finalize().into())
}

/// The canonical root hash of an empty trie: `keccak256` of the item-codec
/// encoding of the empty byte string (Ethereum's well-known value).
pub fn empty_trie_root() -> Hash32 {
    keccak256(&[0x80])
}

/// A reference to a child node: either its serialization embedded inline
/// (when shorter than 32 bytes) or the digest of a node persisted to the
/// store. Never ambiguous to decode — see [`crate::node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Inline(Vec<u8>),
    Hash(Hash32),
}

impl NodeRef {
    /// The reference to the Blank node.
    ///
    /// # Returns
    ///
    /// An inline reference wrapping the empty node's serialization
    /// (`0x80`), which is always short enough to stay inline, so Blank is
    /// never special-cased elsewhere in this module.
    pub fn blank() -> Self {
        NodeRef::Inline(vec![0x80])
    }

    /// Reports whether this reference points at the Blank node.
    ///
    /// # Returns
    ///
    /// `true` if this is the inline empty-node reference, `false` otherwise.
    pub fn is_blank(&self) -> bool {
        matches!(self, NodeRef::Inline(bytes) if bytes == &[0x80])
    }

    /// Builds the reference for an already-serialized node.
    ///
    /// # Arguments
    ///
    /// * `store` - where the bytes are persisted when they are long enough
    ///   to require hashing.
    /// * `serialized` - the node's item-codec encoding.
    ///
    /// # Returns
    ///
    /// The bytes themselves, inline, when shorter than 32 bytes; otherwise
    /// their Keccak-256 digest, after writing `store[digest] = serialized`.
    pub fn for_serialized(store: &mut dyn crate::store::Store, serialized: Vec<u8>) -> Self {
        if serialized.len() < 32 {
            NodeRef::Inline(serialized)
        } else {
            let hash = keccak256(&serialized);
            store.put(hash.0.to_vec(), serialized);
            NodeRef::Hash(hash)
        }
    }

    /// Resolves this reference to the raw node bytes it designates.
    pub fn resolve(&self, store: &dyn crate::store::Store) -> crate::error::TrieResult<Vec<u8>> {
        match self {
            NodeRef::Inline(bytes) => Ok(bytes.clone()),
            NodeRef::Hash(hash) => store.get(hash.as_ref()).ok_or(crate::error::TrieError::MissingNode(*hash)),
        }
    }

    /// The 32-byte digest of this reference's target, hashing inline bytes
    /// on demand (§4.E: `root_hash` always returns a digest).
    pub fn digest(&self) -> Hash32 {
        match self {
            NodeRef::Inline(bytes) => keccak256(bytes),
            NodeRef::Hash(hash) => *hash,
        }
    }
}
