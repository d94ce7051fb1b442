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

//! Node taxonomy and item-codec serialization (component C).
//!
//! The four-variant node algebra is modeled as a tagged sum type rather than
//! a trait-object hierarchy, matching the teacher's `NodeType` enum; each
//! recursion step pattern-matches on it directly.

use rlp::{Rlp, RlpStream};

use crate::error::{TrieError, TrieResult};
use crate::nibble::{self, Nibbles};
use crate::reference::{Hash32, NodeRef};

/// A single MPT node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// The empty node.
    Blank,
    /// Terminates a key: `path` is the remaining nibbles, `value` the stored bytes.
    Leaf { path: Nibbles, value: Vec<u8> },
    /// Compresses a shared nibble run down to a single child reference.
    Extension { path: Nibbles, child: NodeRef },
    /// 16 nibble-indexed child slots plus a terminator value for keys ending here.
    Branch { slots: [NodeRef; 16], value: Vec<u8> },
}

impl Node {
    /// A fresh, valueless branch: all slots blank, no terminator.
    pub fn empty_branch() -> Self {
        Node::Branch {
            slots: std::array::from_fn(|_| NodeRef::blank()),
            value: Vec::new(),
        }
    }

    /// Serializes this node through the item codec (§4.C).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Node::Blank => vec![0x80],

            Node::Leaf { path, value } => {
                let path_bytes = nibble::encode(path, true);
                let mut stream = RlpStream::new_list(2);
                stream.append(&path_bytes);
                stream.append(value);
                stream.out().to_vec()
            }

            Node::Extension { path, child } => {
                let path_bytes = nibble::encode(path, false);
                let mut stream = RlpStream::new_list(2);
                stream.append(&path_bytes);
                append_ref(&mut stream, child);
                stream.out().to_vec()
            }

            Node::Branch { slots, value } => {
                let mut stream = RlpStream::new_list(17);
                for slot in slots {
                    append_ref(&mut stream, slot);
                }
                stream.append(value);
                stream.out().to_vec()
            }
        }
    }

    /// Deserializes a node from its item-codec bytes.
    pub fn decode(bytes: &[u8]) -> TrieResult<Node> {
        let rlp = Rlp::new(bytes);

        if rlp.is_data() {
            let data = rlp.data().map_err(|_| TrieError::MalformedNode)?;
            return if data.is_empty() { Ok(Node::Blank) } else { Err(TrieError::MalformedNode) };
        }

        let count = rlp.item_count().map_err(|_| TrieError::MalformedNode)?;
        match count {
            2 => {
                let path_item = rlp.at(0).map_err(|_| TrieError::MalformedNode)?;
                let path_bytes = path_item.data().map_err(|_| TrieError::MalformedNode)?;
                let (path, is_leaf) = nibble::decode(path_bytes)?;
                let payload = rlp.at(1).map_err(|_| TrieError::MalformedNode)?;

                if is_leaf {
                    let value = payload.data().map_err(|_| TrieError::MalformedNode)?.to_vec();
                    Ok(Node::Leaf { path, value })
                } else {
                    Ok(Node::Extension { path, child: decode_ref(&payload)? })
                }
            }

            17 => {
                let mut slots: [NodeRef; 16] = std::array::from_fn(|_| NodeRef::blank());
                for (i, slot) in slots.iter_mut().enumerate() {
                    let item = rlp.at(i).map_err(|_| TrieError::MalformedNode)?;
                    *slot = decode_ref(&item)?;
                }
                let value_item = rlp.at(16).map_err(|_| TrieError::MalformedNode)?;
                let value = value_item.data().map_err(|_| TrieError::MalformedNode)?.to_vec();
                Ok(Node::Branch { slots, value })
            }

            _ => Err(TrieError::MalformedNode),
        }
    }
}

fn append_ref(stream: &mut RlpStream, reference: &NodeRef) {
    match reference {
        // The child's own encoding is already a complete item (data or list);
        // splice it in verbatim rather than re-encoding.
        NodeRef::Inline(bytes) => {
            stream.append_raw(bytes, 1);
        }
        NodeRef::Hash(hash) => {
            stream.append(&hash.0.to_vec());
        }
    }
}

fn decode_ref(item: &Rlp) -> TrieResult<NodeRef> {
    if item.is_data() {
        let data = item.data().map_err(|_| TrieError::MalformedNode)?;
        if data.len() == 32 {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(data);
            return Ok(NodeRef::Hash(Hash32(hash)));
        }
    }
    Ok(NodeRef::Inline(item.as_raw().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_encodes_to_the_empty_string() {
        assert_eq!(Node::Blank.encode(), vec![0x80]);
    }

    #[test]
    fn blank_round_trips() {
        assert_eq!(Node::decode(&Node::Blank.encode()).unwrap(), Node::Blank);
    }

    #[test]
    fn leaf_round_trips() {
        let node = Node::Leaf { path: vec![1, 2, 3], value: b"value".to_vec() };
        assert_eq!(Node::decode(&node.encode()).unwrap(), node);
    }

    #[test]
    fn leaf_round_trips_with_even_path() {
        let node = Node::Leaf { path: vec![1, 2, 3, 4], value: b"value".to_vec() };
        assert_eq!(Node::decode(&node.encode()).unwrap(), node);
    }

    #[test]
    fn extension_over_inline_child_round_trips() {
        let child = NodeRef::Inline(Node::Leaf { path: vec![9], value: b"x".to_vec() }.encode());
        let node = Node::Extension { path: vec![1, 2], child };
        assert_eq!(Node::decode(&node.encode()).unwrap(), node);
    }

    #[test]
    fn extension_over_hashed_child_round_trips() {
        let child = NodeRef::Hash(crate::reference::keccak256(&vec![0u8; 40]));
        let node = Node::Extension { path: vec![1, 2], child };
        assert_eq!(Node::decode(&node.encode()).unwrap(), node);
    }

    #[test]
    fn branch_round_trips_with_mixed_slots() {
        let mut slots: [NodeRef; 16] = std::array::from_fn(|_| NodeRef::blank());
        slots[3] = NodeRef::Inline(Node::Leaf { path: vec![], value: b"v3".to_vec() }.encode());
        slots[9] = NodeRef::Hash(crate::reference::keccak256(&vec![1u8; 50]));
        let node = Node::Branch { slots, value: b"term".to_vec() };
        assert_eq!(Node::decode(&node.encode()).unwrap(), node);
    }

    #[test]
    fn branch_with_empty_terminator_round_trips() {
        let node = Node::empty_branch();
        assert_eq!(Node::decode(&node.encode()).unwrap(), node);
    }

    #[test]
    fn decode_rejects_wrong_list_length() {
        let mut stream = RlpStream::new_list(3);
        stream.append(&vec![0x20u8]);
        stream.append(&b"a".to_vec());
        stream.append(&b"b".to_vec());
        assert_eq!(Node::decode(&stream.out().to_vec()), Err(TrieError::MalformedNode));
    }

    #[test]
    fn decode_rejects_non_empty_data_at_top_level() {
        let mut stream = RlpStream::new();
        stream.append(&b"not-blank".to_vec());
        assert_eq!(Node::decode(&stream.out().to_vec()), Err(TrieError::MalformedNode));
    }
}
