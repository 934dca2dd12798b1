//! Cluster metadata: hosts, keyspaces, and the token map built from them.

pub mod host;
pub mod metadata;
pub mod store;
pub mod token_map;
