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

//! Nibble-path routing (component A).
//!
//! Keys are routed through the trie as sequences of 4-bit nibbles rather than
//! raw bytes, and a node's stored path additionally carries a 2-bit prefix
//! that records both its node kind (leaf vs extension) and nibble parity.
//!
//! ```text
//!     high nibble of byte 0
//!     +---+---+----------+--------+
//!     | _ | _ | is_leaf  | parity |
//!     +---+---+----------+--------+
//!         3   2      1        0
//! ```
//!
//! The low bit of the flag nibble is the parity of the remaining nibble
//! count (`0` even, `1` odd); the next bit up distinguishes leaf paths from
//! extension paths.

use crate::error::{TrieError, TrieResult};

/// A sequence of 4-bit values, each in `0..16`.
pub type Nibbles = Vec<u8>;

/// Expands a byte key into nibbles, high nibble first.
pub fn to_nibbles(bytes: &[u8]) -> Nibbles {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    for byte in bytes {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    nibbles
}

/// Packs nibbles back into bytes. Fails if the nibble count is odd.
pub fn from_nibbles(nibbles: &[u8]) -> TrieResult<Vec<u8>> {
    if nibbles.len() % 2 != 0 {
        return Err(TrieError::InvalidNibbleLength);
    }
    Ok(nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

/// Encodes a nibble path with its hex-prefix flag byte.
///
/// `is_leaf` selects the leaf vs extension prefix; parity is derived from
/// `nibbles.len()`.
pub fn encode(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let odd = nibbles.len() % 2 == 1;
    let kind = if is_leaf { 2 } else { 0 };
    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);

    if odd {
        out.push(((kind + 1) << 4) | nibbles[0]);
        for pair in nibbles[1..].chunks(2) {
            out.push((pair[0] << 4) | pair[1]);
        }
    } else {
        out.push(kind << 4);
        for pair in nibbles.chunks(2) {
            out.push((pair[0] << 4) | pair[1]);
        }
    }

    out
}

/// Decodes a hex-prefixed path back into its nibbles and leaf/extension kind.
pub fn decode(bytes: &[u8]) -> TrieResult<(Nibbles, bool)> {
    if bytes.is_empty() {
        return Err(TrieError::InvalidPathEncoding);
    }

    let flag = bytes[0] >> 4;
    if flag > 3 {
        return Err(TrieError::InvalidPathEncoding);
    }
    let is_leaf = flag & 0b10 != 0;
    let odd = flag & 0b01 != 0;

    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    if odd {
        nibbles.push(bytes[0] & 0x0f);
    } else if bytes[0] & 0x0f != 0 {
        // Even-length paths must have a zeroed low nibble in the flag byte.
        return Err(TrieError::InvalidPathEncoding);
    }

    for &byte in &bytes[1..] {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }

    Ok((nibbles, is_leaf))
}

/// Length of the longest shared prefix between two nibble sequences.
pub fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
