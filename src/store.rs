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

//! Store adapter (component F): a thin key→bytes mapping.
//!
//! The trie is generic over this trait so that callers can back it with
//! whatever persistence they already run (a disk KV store, an object store,
//! ...); this crate ships only the in-memory reference implementation used
//! by its own tests.

use std::collections::HashMap;

/// A mapping from 32-byte digest keys to opaque node serializations.
///
/// Implementations are not required to support deletion; the trie never
/// deletes from the store (old nodes are simply left unreferenced).
pub trait Store {
    /// Fetches the bytes stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Stores `value` under `key`. Overwriting an existing key with the same
    /// content is a no-op in practice, since keys are content-derived.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Reports whether `key` is present.
    fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Reference `Store` implementation backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: HashMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    ///
    /// # Returns
    ///
    /// A store with no entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for InMemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let mut store = InMemoryStore::new();
        store.put(b"k".to_vec(), b"v".to_vec());
        assert_eq!(store.get(b"k"), Some(b"v".to_vec()));
    }

    #[test]
    fn missing_key_resolves_to_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get(b"absent"), None);
        assert!(!store.contains(b"absent"));
    }

    #[test]
    fn put_is_idempotent_for_identical_content() {
        let mut store = InMemoryStore::new();
        store.put(b"k".to_vec(), b"v".to_vec());
        store.put(b"k".to_vec(), b"v".to_vec());
        assert_eq!(store.len(), 1);
    }
}
