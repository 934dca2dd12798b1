//! Partitioners are algorithms that can compute a token for a given
//! partition key, ultimately allowing optimised routing of requests.
//! A partitioner also defines the textual form of tokens, as reported by
//! the cluster's gossip, and the minimum token closing the ring.
//!
//! Currently one partitioner is supported:
//! - Murmur3Partitioner
//!     - the default partitioner,
//!     - modified for compatibility with Cassandra's buggy implementation.

use bytes::Buf;
use std::num::Wrapping;

use crate::errors::TokenParseError;
use crate::routing::Token;

/// The partitioner in use by the cluster, acting as the token factory.
///
/// Resolved from the fully-qualified partitioner class name reported by the
/// nodes. Tokens produced by different partitioners live in different spaces
/// and are never compared with each other.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[non_exhaustive]
pub enum PartitionerName {
    /// Cassandra-compatible Murmur3, hashing keys onto the full i64 space.
    #[default]
    Murmur3,
}

impl PartitionerName {
    /// Recognizes a partitioner by the class name reported by the cluster,
    /// e.g. `org.apache.cassandra.dht.Murmur3Partitioner`.
    pub fn from_str(name: &str) -> Option<Self> {
        if name.ends_with("Murmur3Partitioner") {
            Some(PartitionerName::Murmur3)
        } else {
            None
        }
    }

    /// Parses a token from the textual form used in gossip and system tables.
    pub fn parse_token(&self, text: &str) -> Result<Token, TokenParseError> {
        match self {
            PartitionerName::Murmur3 => text
                .parse::<i64>()
                .map(Token::new)
                .map_err(|_| TokenParseError {
                    token: text.to_owned(),
                }),
        }
    }

    /// Hashes a serialized partition key to its token. Deterministic and
    /// total: any byte sequence has a token.
    pub fn hash_one(&self, partition_key: &[u8]) -> Token {
        match self {
            PartitionerName::Murmur3 => murmur3_token(partition_key),
        }
    }

    /// The minimum token of this partitioner's space. Never produced by
    /// hashing; used as both ends of the range covering the whole ring.
    pub fn min_token(&self) -> Token {
        match self {
            PartitionerName::Murmur3 => Token::new(i64::MIN),
        }
    }
}

const C1: Wrapping<i64> = Wrapping(0x87c3_7b91_1142_53d5_u64 as i64);
const C2: Wrapping<i64> = Wrapping(0x4cf5_ad43_2745_937f_u64 as i64);

#[inline]
fn rotl64(v: Wrapping<i64>, n: u32) -> Wrapping<i64> {
    Wrapping((v.0 << n) | (v.0 as u64 >> (64 - n)) as i64)
}

#[inline]
fn fmix(mut k: Wrapping<i64>) -> Wrapping<i64> {
    k ^= Wrapping((k.0 as u64 >> 33) as i64);
    k *= Wrapping(0xff51afd7ed558ccd_u64 as i64);
    k ^= Wrapping((k.0 as u64 >> 33) as i64);
    k *= Wrapping(0xc4ceb9fe1a85ec53_u64 as i64);
    k ^= Wrapping((k.0 as u64 >> 33) as i64);

    k
}

// The x64/128 variant of Murmur3, truncated to the low 64 bits, with
// Cassandra's long-standing sign-extension bug reproduced in the tail
// handling (bytes are read as i8, not u8). Both quirks are required for
// tokens to agree with what the cluster computes server-side.
fn murmur3_token(data: &[u8]) -> Token {
    let mut h1 = Wrapping(0_i64);
    let mut h2 = Wrapping(0_i64);

    let mut body = data;
    while body.len() >= 16 {
        let mut k1 = Wrapping(body.get_i64_le());
        let mut k2 = Wrapping(body.get_i64_le());

        k1 *= C1;
        k1 = rotl64(k1, 31);
        k1 *= C2;
        h1 ^= k1;

        h1 = rotl64(h1, 27);
        h1 += h2;
        h1 = h1 * Wrapping(5) + Wrapping(0x52dce729);

        k2 *= C2;
        k2 = rotl64(k2, 33);
        k2 *= C1;
        h2 ^= k2;

        h2 = rotl64(h2, 31);
        h2 += h1;
        h2 = h2 * Wrapping(5) + Wrapping(0x38495ab5);
    }

    let tail = body;
    let mut k1 = Wrapping(0_i64);
    let mut k2 = Wrapping(0_i64);

    if tail.len() > 8 {
        for i in (8..tail.len()).rev() {
            k2 ^= Wrapping(tail[i] as i8 as i64) << ((i - 8) * 8);
        }

        k2 *= C2;
        k2 = rotl64(k2, 33);
        k2 *= C1;
        h2 ^= k2;
    }

    if !tail.is_empty() {
        for i in (0..std::cmp::min(8, tail.len())).rev() {
            k1 ^= Wrapping(tail[i] as i8 as i64) << (i * 8);
        }

        k1 *= C1;
        k1 = rotl64(k1, 31);
        k1 *= C2;
        h1 ^= k1;
    }

    h1 ^= Wrapping(data.len() as i64);
    h2 ^= Wrapping(data.len() as i64);

    h1 += h2;
    h2 += h1;

    h1 = fmix(h1);
    h2 = fmix(h2);

    h1 += h2;

    // i64::MIN is reserved for the minimum token.
    Token::new(if h1.0 == i64::MIN { i64::MAX } else { h1.0 })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::PartitionerName;
    use crate::errors::TokenParseError;
    use crate::utils::test_utils::setup_tracing;

    fn assert_correct_murmur3_hash(pk: &'static str, expected_hash: i64) {
        let hash = PartitionerName::Murmur3.hash_one(pk.as_bytes()).value();
        assert_eq!(hash, expected_hash);
    }

    #[test]
    fn test_murmur3_partitioner() {
        setup_tracing();
        for s in [
            ("test", -6017608668500074083),
            ("xd", 4507812186440344727),
            ("primary_key", -1632642444691073360),
            ("kremówki", 4354931215268080151),
        ] {
            assert_correct_murmur3_hash(s.0, s.1);
        }
    }

    #[test]
    fn murmur3_hash_is_total() {
        setup_tracing();
        // Empty and block-boundary inputs must hash without panicking.
        for len in [0, 1, 7, 8, 9, 15, 16, 17, 32] {
            let data = vec![0xa5_u8; len];
            PartitionerName::Murmur3.hash_one(&data);
        }
    }

    #[test]
    fn partitioner_name_resolution() {
        assert_eq!(
            PartitionerName::from_str("org.apache.cassandra.dht.Murmur3Partitioner"),
            Some(PartitionerName::Murmur3)
        );
        assert_eq!(
            PartitionerName::from_str("Murmur3Partitioner"),
            Some(PartitionerName::Murmur3)
        );
        assert_eq!(
            PartitionerName::from_str("org.apache.cassandra.dht.RandomPartitioner"),
            None
        );
    }

    #[test]
    fn parse_token_roundtrip() {
        let partitioner = PartitionerName::Murmur3;
        assert_eq!(
            partitioner.parse_token("-9223372036854775808").unwrap(),
            partitioner.min_token()
        );
        assert_eq!(partitioner.parse_token("42").unwrap().value(), 42);
        assert_matches!(
            partitioner.parse_token("not-a-token"),
            Err(TokenParseError { token }) if token == "not-a-token"
        );
    }
}
