//! The token ring: a sorted, deduplicated view of every token the cluster
//! reported, each bound to the element (typically a host) that primarily
//! owns it.

use std::collections::BTreeMap;

use crate::routing::Token;

/// A continuous hash ring: a sorted sequence of `(Token, E)` entries,
/// implicitly closing into a circle via the "next token clockwise" relation.
///
/// Each token appears at most once. The ring is rebuilt wholesale on
/// topology changes, never mutated incrementally, so a plain sorted vector
/// with binary search is all the structure needed.
#[derive(Debug, Clone)]
pub struct TokenRing<E> {
    ring: Vec<(Token, E)>,
}

impl<E> TokenRing<E> {
    /// Builds the ring from `(token, element)` entries.
    ///
    /// If several entries carry the same token, the last one in iteration
    /// order wins. When the entries come from an unordered map (as they do
    /// during a rebuild from gossip data), which owner survives such a
    /// collision is therefore unspecified; exactly one of them is kept.
    pub(crate) fn new(entries: impl IntoIterator<Item = (Token, E)>) -> Self {
        let deduplicated: BTreeMap<Token, E> = entries.into_iter().collect();
        Self {
            ring: deduplicated.into_iter().collect(),
        }
    }

    /// Iterates over all entries of the ring, starting at the lowest token.
    pub fn iter(&self) -> impl Iterator<Item = &(Token, E)> {
        self.ring.iter()
    }

    /// Walks the ring clockwise starting at the first entry whose token is
    /// greater than or equal to `token`. After the highest token the walk
    /// wraps around to the lowest one. Each entry is visited exactly once.
    pub fn ring_range(&self, token: Token) -> impl Iterator<Item = &(Token, E)> {
        let start = self.ring.partition_point(|entry| entry.0 < token);

        self.ring[start..]
            .iter()
            .chain(self.ring.iter())
            .take(self.ring.len())
    }

    /// The entry owning `token` under the `(start, end]` range convention:
    /// the entry for `token` itself if it is a ring member, otherwise the
    /// nearest successor, wrapping past the highest token to the first
    /// entry. `None` only on an empty ring.
    pub fn successor(&self, token: Token) -> Option<&(Token, E)> {
        match self.ring.binary_search_by_key(&token, |entry| entry.0) {
            Ok(i) => self.ring.get(i),
            Err(i) if i < self.ring.len() => self.ring.get(i),
            Err(_) => self.ring.first(),
        }
    }

    /// The element bound to exactly `token`, if that token is a ring member.
    pub fn get(&self, token: Token) -> Option<&E> {
        self.ring
            .binary_search_by_key(&token, |entry| entry.0)
            .ok()
            .map(|i| &self.ring[i].1)
    }

    /// The number of distinct tokens in the ring.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` if the ring contains no tokens.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
