//! The token map: one immutable, internally consistent snapshot of the
//! built ring and its per-keyspace replica projections.
//!
//! A snapshot is assembled in a single pass by [`TokenMap::build`] and never
//! mutated once published (keyspace removal excepted, which the store
//! performs on a private clone before republishing). Rebuilds produce a
//! brand-new instance.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use crate::cluster::host::Host;
use crate::cluster::metadata::Keyspace;
use crate::routing::partitioner::PartitionerName;
use crate::routing::ring::TokenRing;
use crate::routing::{Token, TokenRange};

/// The snapshot of the token ring and the replica placement derived from it.
#[derive(Debug, Clone)]
pub struct TokenMap {
    partitioner: PartitionerName,
    /// The global ring: every known token bound to its primary owner.
    ring: TokenRing<Arc<Host>>,
    /// The global partition of the token space into `(start, end]` ranges.
    token_ranges: HashSet<TokenRange>,
    /// Per keyspace: replica set of every ring token.
    token_to_hosts: HashMap<String, HashMap<Token, HashSet<Arc<Host>>>>,
    /// Per keyspace: the ranges each host is a replica for.
    hosts_to_ranges: HashMap<String, HashMap<Arc<Host>, HashSet<TokenRange>>>,
    /// All hosts that took part in this rebuild.
    hosts: HashSet<Arc<Host>>,
    /// The tokens each host primarily owns, as recorded by this rebuild.
    primary_tokens: HashMap<Arc<Host>, BTreeSet<Token>>,
}

impl TokenMap {
    /// Builds a fresh snapshot from per-host raw token ownership and the
    /// keyspace catalog.
    ///
    /// Pure and side-effect free: nothing is observable until the returned
    /// value is published. Unparseable raw tokens are skipped one by one —
    /// gossip data is allowed to be transiently malformed and a single bad
    /// token must not fail the whole rebuild.
    pub(crate) fn build(
        partitioner: PartitionerName,
        host_tokens: &HashMap<Arc<Host>, Vec<String>>,
        keyspaces: &[Keyspace],
    ) -> Self {
        let mut entries: Vec<(Token, Arc<Host>)> = Vec::new();
        let mut primary_tokens: HashMap<Arc<Host>, BTreeSet<Token>> = HashMap::new();

        for (host, raw_tokens) in host_tokens {
            for raw in raw_tokens {
                match partitioner.parse_token(raw) {
                    Ok(token) => {
                        entries.push((token, Arc::clone(host)));
                        primary_tokens
                            .entry(Arc::clone(host))
                            .or_default()
                            .insert(token);
                    }
                    Err(err) => {
                        warn!("Host {} reported an invalid token, skipping it: {}", host, err);
                    }
                }
            }
        }

        // If two hosts reported the same token, the ring records whichever
        // entry was inserted last; with iteration over an unordered map that
        // pick is unspecified. Exactly one owner is recorded either way.
        let ring: TokenRing<Arc<Host>> = TokenRing::new(entries);
        let token_ranges = make_token_ranges(&ring, partitioner);

        let mut token_to_hosts = HashMap::with_capacity(keyspaces.len());
        let mut hosts_to_ranges = HashMap::with_capacity(keyspaces.len());
        for keyspace in keyspaces {
            let ks_tokens = match &keyspace.strategy {
                Some(strategy) => strategy.compute_token_to_replica_map(&ring),
                // No replication config: each token lives only on its
                // primary owner.
                None => ring
                    .iter()
                    .map(|(token, host)| (*token, HashSet::from([Arc::clone(host)])))
                    .collect(),
            };

            let ks_ranges = if ring.len() == 1 {
                // The single range was forced to (min, min], so its end token
                // is not a ring member; map every reported host to it
                // directly instead of going through the replica map.
                host_tokens
                    .keys()
                    .map(|host| (Arc::clone(host), token_ranges.clone()))
                    .collect()
            } else {
                ranges_per_host(&token_ranges, &ks_tokens)
            };

            token_to_hosts.insert(keyspace.name.clone(), ks_tokens);
            hosts_to_ranges.insert(keyspace.name.clone(), ks_ranges);
        }

        TokenMap {
            partitioner,
            hosts: host_tokens.keys().cloned().collect(),
            ring,
            token_ranges,
            token_to_hosts,
            hosts_to_ranges,
            primary_tokens,
        }
    }

    /// The partitioner this snapshot was built with.
    pub fn partitioner(&self) -> PartitionerName {
        self.partitioner
    }

    /// The global ring.
    pub fn ring(&self) -> &TokenRing<Arc<Host>> {
        &self.ring
    }

    /// The token ranges that define data distribution in the ring.
    pub fn token_ranges(&self) -> &HashSet<TokenRange> {
        &self.token_ranges
    }

    /// All hosts that took part in building this snapshot.
    pub fn hosts(&self) -> &HashSet<Arc<Host>> {
        &self.hosts
    }

    /// The tokens `host` primarily owns, or `None` if it owns none.
    pub fn primary_tokens(&self, host: &Host) -> Option<&BTreeSet<Token>> {
        self.primary_tokens.get(host)
    }

    /// The replicas of the range owning `token` in `keyspace`.
    ///
    /// If `token` is a ring member its replica set is returned directly;
    /// otherwise ownership belongs to the range whose end boundary is the
    /// nearest successor on the ring, wrapping past the last entry to the
    /// first. `None` for an unknown keyspace or an empty ring.
    pub fn replicas_for_token(
        &self,
        keyspace: &str,
        token: Token,
    ) -> Option<&HashSet<Arc<Host>>> {
        let ks_tokens = self.token_to_hosts.get(keyspace)?;

        if let Some(replicas) = ks_tokens.get(&token) {
            return Some(replicas);
        }

        let (successor, _) = self.ring.successor(token)?;
        ks_tokens.get(successor)
    }

    /// The replicas of `range` in `keyspace`: by construction, the replicas
    /// of the range's end token.
    pub fn replicas_for_range(
        &self,
        keyspace: &str,
        range: &TokenRange,
    ) -> Option<&HashSet<Arc<Host>>> {
        self.replicas_for_token(keyspace, range.end())
    }

    /// The token ranges `host` is a replica for under `keyspace`.
    pub fn ranges_for_host(&self, keyspace: &str, host: &Host) -> Option<&HashSet<TokenRange>> {
        self.hosts_to_ranges.get(keyspace)?.get(host)
    }

    /// Purges a keyspace's replica projections. The global ring and range
    /// set stay untouched since they are not keyspace-scoped.
    pub(crate) fn remove_keyspace(&mut self, keyspace: &str) {
        self.token_to_hosts.remove(keyspace);
        self.hosts_to_ranges.remove(keyspace);
    }

    /// Whether this snapshot has any replica projection for `keyspace`.
    pub fn knows_keyspace(&self, keyspace: &str) -> bool {
        self.token_to_hosts.contains_key(keyspace)
    }
}

fn make_token_ranges(
    ring: &TokenRing<Arc<Host>>,
    partitioner: PartitionerName,
) -> HashSet<TokenRange> {
    // A one-token ring still covers the whole space; the generic formula
    // below would degenerate to the zero-width (t, t].
    if ring.len() == 1 {
        let min = partitioner.min_token();
        return HashSet::from([TokenRange::new(min, min)]);
    }

    let tokens: Vec<Token> = ring.iter().map(|(token, _)| *token).collect();
    (0..tokens.len())
        .map(|i| TokenRange::new(tokens[i], tokens[(i + 1) % tokens.len()]))
        .collect()
}

fn ranges_per_host(
    token_ranges: &HashSet<TokenRange>,
    ks_tokens: &HashMap<Token, HashSet<Arc<Host>>>,
) -> HashMap<Arc<Host>, HashSet<TokenRange>> {
    let mut ks_ranges: HashMap<Arc<Host>, HashSet<TokenRange>> = HashMap::new();

    for range in token_ranges {
        let Some(replicas) = ks_tokens.get(&range.end()) else {
            continue;
        };
        for host in replicas {
            ks_ranges
                .entry(Arc::clone(host))
                .or_default()
                .insert(*range);
        }
    }

    ks_ranges
}
