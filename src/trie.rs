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

//! Trie core (component E): stateful get/update/delete over nibble paths.
//!
//! Every mutation is logically functional — each rebuilt node gets a fresh
//! reference, and the trie swaps its root to the new reference only once the
//! whole recursive rebuild has succeeded. A failure partway through leaves
//! the prior root untouched; whatever nodes were written to the store along
//! the way are simply unreferenced garbage (§7, §9 "Mutation shape").

use crate::error::{TrieError, TrieResult};
use crate::nibble::{self, Nibbles};
use crate::node::Node;
use crate::reference::{Hash32, NodeRef};
use crate::store::Store;

/// A Modified Merkle Patricia Trie over an external `Store`.
pub struct Trie<S: Store> {
    store: S,
    root: NodeRef,
}

impl<S: Store> Trie<S> {
    /// Creates a new trie.
    ///
    /// # Arguments
    ///
    /// * `store` - the backing store new nodes are written to.
    ///
    /// # Returns
    ///
    /// A trie whose root is the canonical empty-trie reference.
    pub fn new(store: S) -> Self {
        Self { store, root: NodeRef::blank() }
    }

    /// Reconstructs a trie handle pointing at a previously observed root
    /// hash.
    ///
    /// # Arguments
    ///
    /// * `store` - a store already populated with the nodes reachable from
    ///   `root_hash` (e.g. a clone or shared handle of the store a prior
    ///   trie wrote to).
    /// * `root_hash` - a digest previously returned by `root_hash()`.
    ///
    /// # Returns
    ///
    /// A trie positioned at `root_hash`. The canonical empty-trie hash maps
    /// back to the blank root without requiring a store entry (the empty
    /// node is never written to the store).
    pub fn with_root_hash(store: S, root_hash: Hash32) -> Self {
        let root = if root_hash == crate::reference::empty_trie_root() { NodeRef::blank() } else { NodeRef::Hash(root_hash) };
        Self { store, root }
    }

    /// The current root reference — inline bytes or a 32-byte digest.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Gives access to the backing store.
    ///
    /// # Returns
    ///
    /// A reference to the store this trie writes through, for callers that
    /// want to share or snapshot it (e.g. to open a second handle at a
    /// previously observed root hash).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The canonical 32-byte root hash, even when the root is inline.
    pub fn root_hash(&self) -> Hash32 {
        let hash = self.root.digest();
        tracing::trace!(root = %hex_digest(&hash), "root hash computed");
        hash
    }

    /// Looks up `key`, failing with `KeyNotFound` if it has no mapping.
    pub fn get(&self, key: &[u8]) -> TrieResult<Vec<u8>> {
        let path = nibble::to_nibbles(key);
        self.get_at(&self.root, &path)
    }

    fn get_at(&self, node_ref: &NodeRef, path: &[u8]) -> TrieResult<Vec<u8>> {
        match self.load(node_ref)? {
            Node::Blank => Err(TrieError::KeyNotFound),

            Node::Leaf { path: lp, value } => {
                if lp == path {
                    Ok(value)
                } else {
                    Err(TrieError::KeyNotFound)
                }
            }

            Node::Extension { path: ep, child } => {
                if path.len() >= ep.len() && path[..ep.len()] == ep[..] {
                    self.get_at(&child, &path[ep.len()..])
                } else {
                    Err(TrieError::KeyNotFound)
                }
            }

            Node::Branch { slots, value } => {
                if path.is_empty() {
                    if value.is_empty() {
                        Err(TrieError::KeyNotFound)
                    } else {
                        Ok(value)
                    }
                } else {
                    self.get_at(&slots[path[0] as usize], &path[1..])
                }
            }
        }
    }

    /// Inserts or overwrites the mapping for `key`. Rejects empty values:
    /// the empty byte string is reserved as the branch "no terminator"
    /// sentinel (§9 "Open question").
    pub fn update(&mut self, key: &[u8], value: Vec<u8>) -> TrieResult<()> {
        if value.is_empty() {
            return Err(TrieError::EmptyValue);
        }
        let path = nibble::to_nibbles(key);
        let new_root = self.update_at(&self.root.clone(), &path, value)?;
        self.root = new_root;
        tracing::debug!(key_len = key.len(), root = %hex_digest(&self.root_hash()), "trie update");
        Ok(())
    }

    fn update_at(&mut self, node_ref: &NodeRef, path: &[u8], value: Vec<u8>) -> TrieResult<NodeRef> {
        let node = self.load(node_ref)?;

        match node {
            Node::Blank => Ok(self.store_node(&Node::Leaf { path: path.to_vec(), value })),

            Node::Leaf { path: lp, value: old_value } => {
                if lp == path {
                    Ok(self.store_node(&Node::Leaf { path: lp, value }))
                } else {
                    self.branch_for_two(&lp, old_value, path, value)
                }
            }

            Node::Extension { path: ep, child } => {
                let shared = nibble::common_prefix(&ep, path);
                if shared == ep.len() {
                    let new_child = self.update_at(&child, &path[shared..], value)?;
                    self.rebuild_extension(ep, new_child)
                } else {
                    self.split_extension(&ep, child, path, value, shared)
                }
            }

            Node::Branch { mut slots, value: terminator } => {
                if path.is_empty() {
                    self.rebuild_branch(slots, value)
                } else {
                    let idx = path[0] as usize;
                    slots[idx] = self.update_at(&slots[idx], &path[1..], value)?;
                    self.rebuild_branch(slots, terminator)
                }
            }
        }
    }

    /// Removes the mapping for `key`, failing with `KeyNotFound` if absent.
    pub fn delete(&mut self, key: &[u8]) -> TrieResult<()> {
        let path = nibble::to_nibbles(key);
        let new_root = self.delete_at(&self.root.clone(), &path)?;
        self.root = new_root;
        tracing::debug!(key_len = key.len(), root = %hex_digest(&self.root_hash()), "trie delete");
        Ok(())
    }

    fn delete_at(&mut self, node_ref: &NodeRef, path: &[u8]) -> TrieResult<NodeRef> {
        match self.load(node_ref)? {
            Node::Blank => Err(TrieError::KeyNotFound),

            Node::Leaf { path: lp, .. } => {
                if lp == path {
                    Ok(NodeRef::blank())
                } else {
                    Err(TrieError::KeyNotFound)
                }
            }

            Node::Extension { path: ep, child } => {
                if path.len() < ep.len() || path[..ep.len()] != ep[..] {
                    return Err(TrieError::KeyNotFound);
                }
                let new_child = self.delete_at(&child, &path[ep.len()..])?;
                self.rebuild_extension(ep, new_child)
            }

            Node::Branch { mut slots, mut value } => {
                if path.is_empty() {
                    if value.is_empty() {
                        return Err(TrieError::KeyNotFound);
                    }
                    value = Vec::new();
                } else {
                    let idx = path[0] as usize;
                    if slots[idx].is_blank() {
                        return Err(TrieError::KeyNotFound);
                    }
                    slots[idx] = self.delete_at(&slots[idx], &path[1..])?;
                }
                self.rebuild_branch(slots, value)
            }
        }
    }

    /// Builds the branch (optionally extension-wrapped) that replaces a
    /// `Leaf` whose path diverges from the key being inserted (§4.E.2,
    /// the `Leaf` case).
    fn branch_for_two(&mut self, old_path: &[u8], old_value: Vec<u8>, new_path: &[u8], new_value: Vec<u8>) -> TrieResult<NodeRef> {
        let shared = nibble::common_prefix(old_path, new_path);
        let mut slots: [NodeRef; 16] = std::array::from_fn(|_| NodeRef::blank());
        let mut terminator = Vec::new();

        let old_rest = &old_path[shared..];
        if old_rest.is_empty() {
            terminator = old_value;
        } else {
            let leaf = Node::Leaf { path: old_rest[1..].to_vec(), value: old_value };
            slots[old_rest[0] as usize] = self.store_node(&leaf);
        }

        let new_rest = &new_path[shared..];
        if new_rest.is_empty() {
            terminator = new_value;
        } else {
            let leaf = Node::Leaf { path: new_rest[1..].to_vec(), value: new_value };
            slots[new_rest[0] as usize] = self.store_node(&leaf);
        }

        let branch = self.rebuild_branch(slots, terminator)?;
        if shared == 0 {
            Ok(branch)
        } else {
            self.rebuild_extension(old_path[..shared].to_vec(), branch)
        }
    }

    /// Splits an `Extension` whose path diverges from the key being
    /// inserted (§4.E.2, the `Extension` case).
    fn split_extension(&mut self, ext_path: &[u8], child: NodeRef, new_path: &[u8], new_value: Vec<u8>, shared: usize) -> TrieResult<NodeRef> {
        let mut slots: [NodeRef; 16] = std::array::from_fn(|_| NodeRef::blank());
        let mut terminator = Vec::new();

        let ext_rest = &ext_path[shared..];
        let ext_idx = ext_rest[0] as usize;
        slots[ext_idx] = if ext_rest.len() == 1 { child } else { self.store_node(&Node::Extension { path: ext_rest[1..].to_vec(), child }) };

        let new_rest = &new_path[shared..];
        if new_rest.is_empty() {
            terminator = new_value;
        } else {
            let leaf = Node::Leaf { path: new_rest[1..].to_vec(), value: new_value };
            slots[new_rest[0] as usize] = self.store_node(&leaf);
        }

        let branch = self.rebuild_branch(slots, terminator)?;
        if shared == 0 {
            Ok(branch)
        } else {
            self.rebuild_extension(new_path[..shared].to_vec(), branch)
        }
    }

    /// Wraps `child_ref` in an `Extension` by `prefix`, applying
    /// normalization rules 1-3 (§4.E.4) so the result never points at a
    /// `Blank` or another `Extension`, and never at a bare `Leaf`.
    fn rebuild_extension(&mut self, prefix: Nibbles, child_ref: NodeRef) -> TrieResult<NodeRef> {
        let node = match self.load(&child_ref)? {
            Node::Blank => Node::Blank,

            Node::Extension { path: child_path, child: grandchild } => {
                let mut merged = prefix;
                merged.extend(child_path);
                Node::Extension { path: merged, child: grandchild }
            }

            Node::Leaf { path: child_path, value } => {
                let mut merged = prefix;
                merged.extend(child_path);
                Node::Leaf { path: merged, value }
            }

            Node::Branch { .. } => Node::Extension { path: prefix, child: child_ref },
        };
        Ok(self.store_node(&node))
    }

    /// Assembles a `Branch` from `slots`/`value`, applying normalization
    /// rules 4-6 (§4.E.4) so the result never has zero slots with a value,
    /// nor exactly one slot with an empty terminator.
    fn rebuild_branch(&mut self, slots: [NodeRef; 16], value: Vec<u8>) -> TrieResult<NodeRef> {
        let occupied: Vec<usize> = (0..16).filter(|&i| !slots[i].is_blank()).collect();

        let node = match (occupied.len(), value.is_empty()) {
            (0, false) => Node::Leaf { path: Vec::new(), value },
            (0, true) => Node::Blank,

            (1, true) => {
                let i = occupied[0];
                let child_ref = slots[i].clone();
                match self.load(&child_ref)? {
                    Node::Leaf { path: child_path, value } => {
                        let mut merged = vec![i as u8];
                        merged.extend(child_path);
                        Node::Leaf { path: merged, value }
                    }
                    Node::Extension { path: child_path, child: grandchild } => {
                        let mut merged = vec![i as u8];
                        merged.extend(child_path);
                        Node::Extension { path: merged, child: grandchild }
                    }
                    Node::Branch { .. } => Node::Extension { path: vec![i as u8], child: child_ref },
                    Node::Blank => unreachable!("slot {i} was reported occupied"),
                }
            }

            _ => Node::Branch { slots, value },
        };
        Ok(self.store_node(&node))
    }

    fn load(&self, node_ref: &NodeRef) -> TrieResult<Node> {
        Node::decode(&node_ref.resolve(&self.store)?)
    }

    fn store_node(&mut self, node: &Node) -> NodeRef {
        let reference = NodeRef::for_serialized(&mut self.store, node.encode());
        tracing::trace!(kind = node_kind(node), inline = matches!(reference, NodeRef::Inline(_)), "node rebuilt");
        reference
    }
}

fn node_kind(node: &Node) -> &'static str {
    match node {
        Node::Blank => "blank",
        Node::Leaf { .. } => "leaf",
        Node::Extension { .. } => "extension",
        Node::Branch { .. } => "branch",
    }
}

fn hex_digest(hash: &Hash32) -> String {
    hash.0.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn trie() -> Trie<InMemoryStore> {
        Trie::new(InMemoryStore::new())
    }

    #[test]
    fn empty_trie_has_the_canonical_root_hash() {
        assert_eq!(trie().root_hash(), crate::reference::empty_trie_root());
    }

    #[test]
    fn get_on_empty_trie_fails() {
        assert_eq!(trie().get(b"anything"), Err(TrieError::KeyNotFound));
    }

    #[test]
    fn single_key_round_trips() {
        let mut t = trie();
        t.update(b"dog", b"puppy".to_vec()).unwrap();
        assert_eq!(t.get(b"dog").unwrap(), b"puppy".to_vec());
    }

    #[test]
    fn update_rejects_empty_value_and_leaves_root_unchanged() {
        let mut t = trie();
        t.update(b"dog", b"puppy".to_vec()).unwrap();
        let before = t.root_hash();
        assert_eq!(t.update(b"dog", Vec::new()), Err(TrieError::EmptyValue));
        assert_eq!(t.root_hash(), before);
    }

    #[test]
    fn overwriting_a_key_replaces_its_value() {
        let mut t = trie();
        t.update(b"a", b"1".to_vec()).unwrap();
        t.update(b"a", b"2".to_vec()).unwrap();
        assert_eq!(t.get(b"a").unwrap(), b"2".to_vec());

        let mut only_second = trie();
        only_second.update(b"a", b"2".to_vec()).unwrap();
        assert_eq!(t.root_hash(), only_second.root_hash());
    }

    #[test]
    fn insertion_order_does_not_affect_root_hash() {
        let pairs = [(&b"key1"[..], &b"val1"[..]), (b"key2", b"val2"), (b"key3", b"val3")];

        let mut forward = trie();
        for (k, v) in pairs {
            forward.update(k, v.to_vec()).unwrap();
        }

        let mut reverse = trie();
        for (k, v) in pairs.iter().rev() {
            reverse.update(k, v.to_vec()).unwrap();
        }

        assert_eq!(forward.root_hash(), reverse.root_hash());
    }

    #[test]
    fn delete_is_the_inverse_of_update() {
        let mut t = trie();
        t.update(b"dog", b"puppy".to_vec()).unwrap();
        t.update(b"doge", b"coin".to_vec()).unwrap();
        let before = t.root_hash();

        t.update(b"horse", b"stallion".to_vec()).unwrap();
        t.delete(b"horse").unwrap();

        assert_eq!(t.root_hash(), before);
    }

    #[test]
    fn deleting_everything_restores_the_empty_root() {
        let mut t = trie();
        for (k, v) in [(&b"do"[..], &b"verb"[..]), (b"dog", b"puppy"), (b"doge", b"coin"), (b"horse", b"stallion")] {
            t.update(k, v.to_vec()).unwrap();
        }
        for k in [&b"horse"[..], b"doge", b"dog", b"do"] {
            t.delete(k).unwrap();
        }
        assert_eq!(t.root_hash(), crate::reference::empty_trie_root());
    }

    #[test]
    fn delete_missing_key_fails() {
        let mut t = trie();
        t.update(b"dog", b"puppy".to_vec()).unwrap();
        assert_eq!(t.delete(b"cat"), Err(TrieError::KeyNotFound));
    }

    #[test]
    fn reconstructing_from_a_stale_root_sees_the_old_mapping() {
        let mut t = trie();
        t.update(b"do", b"verb".to_vec()).unwrap();
        t.update(b"dog", b"puppy".to_vec()).unwrap();
        t.update(b"doge", b"coin".to_vec()).unwrap();
        t.update(b"horse", b"stallion".to_vec()).unwrap();
        let h1 = t.root_hash();

        t.delete(b"doge").unwrap();
        let h2 = t.root_hash();
        assert_ne!(h1, h2);

        let store = store_snapshot(&t);
        let from_h1 = Trie::with_root_hash(store, h1);
        assert_eq!(from_h1.get(b"doge").unwrap(), b"coin".to_vec());
        assert_eq!(t.get(b"doge"), Err(TrieError::KeyNotFound));
    }

    fn store_snapshot(t: &Trie<InMemoryStore>) -> InMemoryStore {
        // Both handles share the same content-addressed entries; cloning the
        // store is enough since entries already written for H1 are never
        // removed by later mutations (no GC, §3 "Lifecycle").
        t.store.clone()
    }

    #[test]
    fn reconstructing_from_a_missing_root_fails_on_first_access() {
        let store = InMemoryStore::new();
        let bogus = crate::reference::keccak256(b"never written");
        let t = Trie::with_root_hash(store, bogus);
        assert_eq!(t.get(b"anything"), Err(TrieError::MissingNode(bogus)));
    }

    #[test]
    fn empty_key_is_a_valid_mapping() {
        let mut t = trie();
        t.update(b"", b"value".to_vec()).unwrap();
        assert_eq!(t.get(b"").unwrap(), b"value".to_vec());
    }

    #[test]
    fn keys_that_are_prefixes_of_one_another_coexist() {
        let mut t = trie();
        t.update(b"do", b"verb".to_vec()).unwrap();
        t.update(b"dog", b"puppy".to_vec()).unwrap();
        assert_eq!(t.get(b"do").unwrap(), b"verb".to_vec());
        assert_eq!(t.get(b"dog").unwrap(), b"puppy".to_vec());
    }
}
