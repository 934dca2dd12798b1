//! Concurrent metadata store: host and keyspace catalogs plus the atomically
//! published token map snapshot.
//!
//! Reads never block. The token map behaves copy-on-write: a rebuild
//! assembles a complete new [`TokenMap`] off to the side and publishes it
//! with a single pointer swap, so a reader either sees the previous snapshot
//! or the new one, never a half-built state. Writers (rebuilds and keyspace
//! removals) are serialized through an internal lock.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::cluster::host::Host;
use crate::cluster::metadata::{handle_id, Keyspace};
use crate::cluster::token_map::TokenMap;
use crate::errors::{NewTokenError, NotInitializedError};
use crate::routing::partitioner::PartitionerName;
use crate::routing::{Token, TokenRange};

/// Cluster metadata: hosts, keyspaces and the current token map snapshot.
#[derive(Debug, Default)]
pub struct MetadataStore {
    hosts: DashMap<SocketAddr, Arc<Host>>,
    keyspaces: DashMap<String, Keyspace>,
    token_map: ArcSwapOption<TokenMap>,
    // Serializes token map writers; readers go through `token_map` directly.
    rebuild_lock: Mutex<()>,
}

impl MetadataStore {
    /// Creates an empty store with no token map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the token map from per-host raw token ownership and
    /// publishes the result atomically.
    ///
    /// `partitioner` is the class name reported by the cluster; when `None`,
    /// the partitioner of the current snapshot is reused, and the rebuild is
    /// skipped if there is no snapshot to take it from. An empty
    /// `host_tokens` is a no-op as well: the previous snapshot stays
    /// published rather than being replaced with an empty ring.
    pub fn rebuild_token_map(
        &self,
        partitioner: Option<&str>,
        host_tokens: &HashMap<Arc<Host>, Vec<String>>,
    ) {
        let _guard = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if host_tokens.is_empty() {
            debug!("No token ownership data, keeping the current token map");
            return;
        }

        let partitioner_name = match partitioner {
            Some(name) => match PartitionerName::from_str(name) {
                Some(resolved) => resolved,
                None => {
                    warn!("Unsupported partitioner '{}', skipping token map rebuild", name);
                    return;
                }
            },
            None => match self.token_map.load_full() {
                Some(current) => current.partitioner(),
                None => {
                    debug!("No partitioner known yet, skipping token map rebuild");
                    return;
                }
            },
        };

        let keyspaces: Vec<Keyspace> = self
            .keyspaces
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let rebuilt = TokenMap::build(partitioner_name, host_tokens, &keyspaces);
        self.token_map.store(Some(Arc::new(rebuilt)));
    }

    /// Registers a host. Returns the stored handle, or `None` if a host with
    /// the same address is already present.
    pub fn add_host(&self, host: Host) -> Option<Arc<Host>> {
        match self.hosts.entry(host.address) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let host = Arc::new(host);
                vacant.insert(Arc::clone(&host));
                Some(host)
            }
        }
    }

    /// Removes a host from the catalog. The token map is left as is until
    /// the next rebuild.
    pub fn remove_host(&self, address: SocketAddr) -> Option<Arc<Host>> {
        self.hosts.remove(&address).map(|(_, host)| host)
    }

    /// Looks up a host by address.
    pub fn get_host(&self, address: SocketAddr) -> Option<Arc<Host>> {
        self.hosts.get(&address).map(|entry| Arc::clone(entry.value()))
    }

    /// All currently known hosts.
    pub fn all_hosts(&self) -> HashSet<Arc<Host>> {
        self.hosts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Registers or replaces a keyspace. Its replica projections appear in
    /// the token map on the next rebuild.
    pub fn add_keyspace(&self, keyspace: Keyspace) {
        self.keyspaces.insert(keyspace.name.clone(), keyspace);
    }

    /// Looks up a keyspace. The name goes through identifier normalization,
    /// so `"Foo"` and `foo` refer to the same keyspace while `"a b"` keeps
    /// its exact quoted form.
    pub fn get_keyspace(&self, name: &str) -> Option<Keyspace> {
        self.keyspaces
            .get(&handle_id(name))
            .map(|entry| entry.value().clone())
    }

    /// All currently known keyspaces.
    pub fn keyspaces(&self) -> Vec<Keyspace> {
        self.keyspaces
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Removes a keyspace from the catalog and purges its projections from
    /// the published token map.
    ///
    /// The purge clones the current snapshot, edits the clone and republishes
    /// it, so concurrent readers keep their consistency guarantee.
    pub fn remove_keyspace(&self, name: &str) -> Option<Keyspace> {
        let name = handle_id(name);
        let removed = self.keyspaces.remove(&name).map(|(_, keyspace)| keyspace);

        let _guard = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = self.token_map.load_full() {
            if current.knows_keyspace(&name) {
                let mut purged = (*current).clone();
                purged.remove_keyspace(&name);
                self.token_map.store(Some(Arc::new(purged)));
            }
        }

        removed
    }

    /// The current token map snapshot, if one has been built.
    pub fn token_map(&self) -> Option<Arc<TokenMap>> {
        self.token_map.load_full()
    }

    /// The token ranges of the current ring. Empty before the first rebuild.
    pub fn token_ranges(&self) -> HashSet<TokenRange> {
        self.token_map
            .load_full()
            .map(|map| map.token_ranges().clone())
            .unwrap_or_default()
    }

    /// The token ranges `host` is a replica for under `keyspace`. Empty for
    /// unknown keyspaces or before the first rebuild.
    pub fn token_ranges_for_host(&self, keyspace: &str, host: &Host) -> HashSet<TokenRange> {
        self.token_map
            .load_full()
            .and_then(|map| map.ranges_for_host(&handle_id(keyspace), host).cloned())
            .unwrap_or_default()
    }

    /// The replicas of the partition identified by the serialized
    /// `partition_key` in `keyspace`. Empty for unknown keyspaces or before
    /// the first rebuild.
    pub fn replicas_for_key(&self, keyspace: &str, partition_key: &[u8]) -> HashSet<Arc<Host>> {
        let Some(map) = self.token_map.load_full() else {
            return HashSet::new();
        };
        let token = map.partitioner().hash_one(partition_key);
        map.replicas_for_token(&handle_id(keyspace), token)
            .cloned()
            .unwrap_or_default()
    }

    /// The replicas of `range` in `keyspace`. Empty for unknown keyspaces or
    /// before the first rebuild.
    pub fn replicas_for_range(&self, keyspace: &str, range: &TokenRange) -> HashSet<Arc<Host>> {
        self.token_map
            .load_full()
            .and_then(|map| map.replicas_for_range(&handle_id(keyspace), range).cloned())
            .unwrap_or_default()
    }

    /// Parses a token string in the format of the partitioner in effect.
    pub fn new_token(&self, text: &str) -> Result<Token, NewTokenError> {
        let map = self.token_map.load_full().ok_or(NotInitializedError)?;
        Ok(map.partitioner().parse_token(text)?)
    }

    /// Constructs a `(start, end]` token range. Requires an initialized
    /// token map, for symmetry with [`Self::new_token`].
    pub fn new_token_range(
        &self,
        start: Token,
        end: Token,
    ) -> Result<TokenRange, NotInitializedError> {
        if self.token_map.load_full().is_none() {
            return Err(NotInitializedError);
        }
        Ok(TokenRange::new(start, end))
    }
}
