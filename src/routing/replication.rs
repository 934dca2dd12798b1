//! Replication strategies: the policies that convert per-token primary
//! ownership into the full replica set of every token, per keyspace.

use std::cmp;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use itertools::Itertools;

use crate::cluster::host::{Host, HostRef};
use crate::errors::KeyspaceStrategyError;
use crate::routing::ring::TokenRing;
use crate::routing::Token;

/// A replication strategy of a keyspace.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReplicationStrategy {
    /// Replicates every token to a fixed number of distinct hosts, walking
    /// the ring clockwise from the token.
    Simple {
        /// The number of distinct replicas requested per token.
        replication_factor: usize,
    },
    /// Replicates independently per datacenter, preferring to spread
    /// replicas across distinct racks within each datacenter.
    NetworkTopology {
        /// Replication factors of datacenters with given names.
        datacenter_repfactors: HashMap<String, usize>,
    },
    /// Data never leaves a single node; used for node-local system
    /// keyspaces. The cross-node replica set of every token is empty, so
    /// callers must not rely on replication for such keyspaces.
    Local,
    /// Every host replicates every token; used for small cluster-wide
    /// system data.
    Everywhere,
}

impl ReplicationStrategy {
    /// Instantiates a strategy from a keyspace's raw replication config, as
    /// reported on schema change.
    ///
    /// Both fully-qualified (`org.apache.cassandra.locator.SimpleStrategy`)
    /// and short (`SimpleStrategy`) class names are accepted. An
    /// unrecognized class is an error — no silent fallback to a default
    /// strategy, as routing based on a guessed strategy would be wrong in a
    /// way the caller could never detect.
    pub fn from_config(config: &HashMap<String, String>) -> Result<Self, KeyspaceStrategyError> {
        let class = config
            .get("class")
            .ok_or(KeyspaceStrategyError::MissingClassForStrategyDefinition)?;

        let strategy = match class.as_str() {
            "org.apache.cassandra.locator.SimpleStrategy" | "SimpleStrategy" => {
                let rep_factor_str = config
                    .get("replication_factor")
                    .ok_or(KeyspaceStrategyError::MissingReplicationFactorForSimpleStrategy)?;

                let replication_factor = usize::from_str(rep_factor_str)
                    .map_err(KeyspaceStrategyError::ReplicationFactorParseError)?;

                ReplicationStrategy::Simple { replication_factor }
            }
            "org.apache.cassandra.locator.NetworkTopologyStrategy" | "NetworkTopologyStrategy" => {
                let mut datacenter_repfactors: HashMap<String, usize> =
                    HashMap::with_capacity(config.len());

                for (key, value) in config {
                    if key == "class" {
                        continue;
                    }
                    // Apart from 'class' the config may only hold per-dc
                    // replication factors.
                    let rep_factor = usize::from_str(value).map_err(|_| {
                        KeyspaceStrategyError::UnexpectedNetworkTopologyStrategyOption {
                            key: key.clone(),
                            value: value.clone(),
                        }
                    })?;

                    datacenter_repfactors.insert(key.clone(), rep_factor);
                }

                ReplicationStrategy::NetworkTopology {
                    datacenter_repfactors,
                }
            }
            "org.apache.cassandra.locator.LocalStrategy" | "LocalStrategy" => {
                ReplicationStrategy::Local
            }
            "org.apache.cassandra.locator.EverywhereStrategy" | "EverywhereStrategy" => {
                ReplicationStrategy::Everywhere
            }
            _ => return Err(KeyspaceStrategyError::UnsupportedStrategy(class.clone())),
        };

        Ok(strategy)
    }

    /// Computes the replica set of every ring token under this strategy.
    ///
    /// The result is total over the ring: every ring token has an entry.
    /// When a configured replication factor exceeds the number of available
    /// hosts (globally or within a datacenter), all available hosts are
    /// returned for that scope instead of failing.
    pub fn compute_token_to_replica_map(
        &self,
        ring: &TokenRing<Arc<Host>>,
    ) -> HashMap<Token, HashSet<Arc<Host>>> {
        match self {
            ReplicationStrategy::Simple { replication_factor } => {
                simple_strategy_map(ring, *replication_factor)
            }
            ReplicationStrategy::NetworkTopology {
                datacenter_repfactors,
            } => network_topology_map(ring, datacenter_repfactors),
            ReplicationStrategy::Local => {
                ring.iter().map(|(token, _)| (*token, HashSet::new())).collect()
            }
            ReplicationStrategy::Everywhere => {
                let all_hosts: HashSet<Arc<Host>> =
                    ring.iter().map(|(_, host)| Arc::clone(host)).collect();
                ring.iter()
                    .map(|(token, _)| (*token, all_hosts.clone()))
                    .collect()
            }
        }
    }
}

fn simple_strategy_map(
    ring: &TokenRing<Arc<Host>>,
    replication_factor: usize,
) -> HashMap<Token, HashSet<Arc<Host>>> {
    let distinct_hosts = ring.iter().map(|(_, host)| host).unique().count();
    let num_to_take = cmp::min(replication_factor, distinct_hosts);

    ring.iter()
        .map(|(token, _)| {
            let replicas: HashSet<Arc<Host>> = ring
                .ring_range(*token)
                .map(|(_, host)| host)
                .unique()
                .take(num_to_take)
                .cloned()
                .collect();
            (*token, replicas)
        })
        .collect()
}

/// A single datacenter's slice of the global ring, precomputed once per
/// strategy evaluation.
struct DatacenterRing {
    ring: TokenRing<Arc<Host>>,
    host_count: usize,
    rack_count: usize,
}

fn network_topology_map(
    ring: &TokenRing<Arc<Host>>,
    datacenter_repfactors: &HashMap<String, usize>,
) -> HashMap<Token, HashSet<Arc<Host>>> {
    // Walking a datacenter-filtered ring is equivalent to walking the global
    // one and skipping hosts from other datacenters, and much cheaper when
    // done once per token per datacenter.
    let mut entries_per_dc: HashMap<&str, Vec<(Token, Arc<Host>)>> = HashMap::new();
    for (token, host) in ring.iter() {
        if let Some(dc) = host.datacenter.as_deref() {
            entries_per_dc
                .entry(dc)
                .or_default()
                .push((*token, Arc::clone(host)));
        }
    }

    let dc_rings: HashMap<&str, DatacenterRing> = entries_per_dc
        .into_iter()
        .map(|(dc, entries)| {
            let dc_ring = TokenRing::new(entries);
            let host_count = dc_ring.iter().map(|(_, host)| host).unique().count();
            // A missing rack label counts as its own rack.
            let rack_count = dc_ring
                .iter()
                .map(|(_, host)| host.rack.as_deref())
                .unique()
                .count();
            (
                dc,
                DatacenterRing {
                    ring: dc_ring,
                    host_count,
                    rack_count,
                },
            )
        })
        .collect();

    ring.iter()
        .map(|(token, _)| {
            let mut replicas: HashSet<Arc<Host>> = HashSet::new();
            for (dc, replication_factor) in datacenter_repfactors {
                let Some(dc_ring) = dc_rings.get(dc.as_str()) else {
                    // A datacenter configured in the keyspace but absent
                    // from the ring simply contributes no replicas.
                    continue;
                };
                replicas.extend(replicas_in_datacenter(dc_ring, *token, *replication_factor));
            }
            (*token, replicas)
        })
        .collect()
}

/// Collects this datacenter's replicas for `token`: distinct hosts in ring
/// order, each new rack preferred over a repeated one. Hosts from already
/// seen racks are deferred, and only admitted once every rack of the
/// datacenter is represented.
fn replicas_in_datacenter(
    dc: &DatacenterRing,
    token: Token,
    replication_factor: usize,
) -> Vec<Arc<Host>> {
    let num_to_take = cmp::min(replication_factor, dc.host_count);
    let mut replicas: Vec<Arc<Host>> = Vec::with_capacity(num_to_take);
    let mut seen_racks: BTreeSet<Option<&str>> = BTreeSet::new();
    let mut deferred: Vec<HostRef<'_>> = Vec::new();

    for (_, host) in dc
        .ring
        .ring_range(token)
        .unique_by(|(_, host)| host.address)
    {
        if replicas.len() == num_to_take {
            break;
        }

        if seen_racks.insert(host.rack.as_deref()) {
            replicas.push(Arc::clone(host));
        } else {
            deferred.push(host);
        }

        if seen_racks.len() == dc.rack_count {
            // Every rack is represented now; rack repeats are acceptable.
            for repeat in deferred.drain(..) {
                if replicas.len() == num_to_take {
                    break;
                }
                replicas.push(Arc::clone(repeat));
            }
        }
    }

    replicas
}
