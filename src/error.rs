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

//! Error types for the trie's public and internal operations.

use thiserror::Error;

use crate::reference::Hash32;

/// Errors that can occur while operating on a [`crate::trie::Trie`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// Lookup or delete against a key with no mapping.
    #[error("key not found")]
    KeyNotFound,

    /// `update` was called with a zero-length value.
    #[error("update value must not be empty")]
    EmptyValue,

    /// `from_nibbles` was handed an odd-length nibble sequence.
    #[error("nibble sequence has odd length")]
    InvalidNibbleLength,

    /// An encoded path's prefix byte or parity bit is inconsistent.
    #[error("invalid path encoding")]
    InvalidPathEncoding,

    /// A node's item-codec serialization failed the structural checks in §4.C.
    #[error("malformed node encoding")]
    MalformedNode,

    /// A 32-byte reference resolved to nothing in the store.
    #[error("missing node for reference {}", hex_digest(.0))]
    MissingNode(Hash32),

    /// Passed through unchanged from a `Store` implementation's own failure mode.
    #[error("storage error: {0}")]
    StorageError(String),
}

fn hex_digest(hash: &Hash32) -> String {
    hash.0.iter().map(|b| format!("{b:02x}")).collect()
}

pub type TrieResult<T> = Result<T, TrieError>;
