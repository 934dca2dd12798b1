//! Client-side token ring and replica placement for Cassandra-compatible
//! clusters.
//!
//! The crate keeps track of cluster metadata that a driver learns from
//! gossip and system tables, and answers routing questions from it:
//!
//! * which token does a serialized partition key hash to,
//! * which hosts replicate that token under a given keyspace's replication
//!   strategy,
//! * which token ranges is a given host a replica for.
//!
//! The entry point is [`MetadataStore`]. Feed it hosts and keyspaces, call
//! [`MetadataStore::rebuild_token_map`] whenever topology or schema changes,
//! and query it concurrently from any number of threads. A rebuild assembles
//! a complete new [`TokenMap`] snapshot and publishes it with one atomic
//! swap, so readers never observe partially updated state.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//!
//! use ringmap::{Host, Keyspace, MetadataStore};
//!
//! let store = MetadataStore::new();
//!
//! let host = store
//!     .add_host(Host {
//!         address: SocketAddr::from(([10, 0, 0, 1], 9042)),
//!         datacenter: Some("dc1".to_owned()),
//!         rack: Some("rack1".to_owned()),
//!     })
//!     .unwrap();
//!
//! let replication = HashMap::from([
//!     ("class".to_owned(), "SimpleStrategy".to_owned()),
//!     ("replication_factor".to_owned(), "1".to_owned()),
//! ]);
//! store.add_keyspace(Keyspace::new("ks", Some(&replication)).unwrap());
//!
//! let host_tokens = HashMap::from([(host, vec!["-42".to_owned(), "9000".to_owned()])]);
//! store.rebuild_token_map(
//!     Some("org.apache.cassandra.dht.Murmur3Partitioner"),
//!     &host_tokens,
//! );
//!
//! let replicas = store.replicas_for_key("ks", b"some partition key");
//! assert_eq!(replicas.len(), 1);
//! ```

pub mod cluster;
pub mod errors;
pub mod routing;
pub(crate) mod utils;

pub use cluster::host::{Host, HostRef};
pub use cluster::metadata::Keyspace;
pub use cluster::store::MetadataStore;
pub use cluster::token_map::TokenMap;
pub use routing::partitioner::PartitionerName;
pub use routing::replication::ReplicationStrategy;
pub use routing::{Token, TokenRange};
