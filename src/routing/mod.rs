//! This module holds entities whose goal is to enable routing requests
//! directly to replicas, that is, choosing the nodes which really own the
//! data a request concerns.
//!
//! This includes:
//! - token and token range representation,
//! - partitioners, which compute a token based on a partition key,
//! - the token ring, a sorted view of all known tokens,
//! - replication strategies, which turn primary token ownership into full
//!   replica sets.

pub mod partitioner;
pub mod replication;
pub mod ring;

use std::fmt;

/// Token is a position on the ring, the result of hashing a partition key.
///
/// It is an i64 with one caveat: `i64::MIN` is never produced by hashing.
/// It is reserved as the minimum token, the sentinel closing the ring
/// (see [`PartitionerName::min_token`](partitioner::PartitionerName::min_token)).
/// Hash results equal to `i64::MIN` are normalized to `i64::MAX`, the same
/// way Cassandra's Murmur3 partitioner does it.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct Token {
    value: i64,
}

impl Token {
    /// Creates a new token with the given value.
    #[inline]
    pub fn new(value: i64) -> Self {
        Self { value }
    }

    /// The raw position on the ring.
    #[inline]
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A `(start, end]` slice of the ring: start exclusive, end inclusive.
///
/// For replica lookups a range is identified by its *end* token: the
/// replicas of a range are the replicas of the token that terminates it.
/// A range wraps around the top of the ring when `end <= start`; in
/// particular `(min_token, min_token]` denotes the whole ring.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct TokenRange {
    start: Token,
    end: Token,
}

impl TokenRange {
    /// Creates a new range. `start` is exclusive, `end` inclusive.
    pub fn new(start: Token, end: Token) -> Self {
        Self { start, end }
    }

    /// The exclusive start of the range.
    pub fn start(&self) -> Token {
        self.start
    }

    /// The inclusive end of the range; the token that identifies the range
    /// for replica lookups.
    pub fn end(&self) -> Token {
        self.end
    }

    /// Whether the range crosses the top of the ring back to the lowest
    /// tokens.
    pub fn wraps_around(&self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::{Token, TokenRange};

    #[test]
    fn token_ordering_follows_value() {
        assert!(Token::new(i64::MIN) < Token::new(-1));
        assert!(Token::new(-1) < Token::new(0));
        assert!(Token::new(0) < Token::new(i64::MAX));
    }

    #[test]
    fn range_wrap_around() {
        assert!(!TokenRange::new(Token::new(10), Token::new(20)).wraps_around());
        assert!(TokenRange::new(Token::new(20), Token::new(10)).wraps_around());
        // The full-ring range is considered wrapping: it starts and ends on
        // the same sentinel.
        assert!(TokenRange::new(Token::new(i64::MIN), Token::new(i64::MIN)).wraps_around());
    }

    #[test]
    fn range_display() {
        let range = TokenRange::new(Token::new(-5), Token::new(7));
        assert_eq!(range.to_string(), "(-5, 7]");
    }
}
