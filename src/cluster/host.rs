//! Host representation: a cluster node as seen by the metadata subsystem.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::sync::Arc;

/// A cluster node.
///
/// Hosts are identified by their network address: two `Host` values with
/// equal addresses denote the same node regardless of their datacenter or
/// rack labels. Hosts are created and removed by the
/// [`MetadataStore`](crate::cluster::store::MetadataStore) catalog; the ring
/// index only ever references them through `Arc`.
#[derive(Debug, Clone)]
pub struct Host {
    /// Network address, the stable identity of the node.
    pub address: SocketAddr,
    /// Datacenter label, if known. Consumed by the NetworkTopology
    /// replication strategy.
    pub datacenter: Option<String>,
    /// Rack label within the datacenter, if known.
    pub rack: Option<String>,
}

impl Host {
    /// Creates a new host record.
    pub fn new(address: SocketAddr, datacenter: Option<String>, rack: Option<String>) -> Self {
        Self {
            address,
            datacenter,
            rack,
        }
    }
}

impl PartialEq for Host {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Host {}

impl Hash for Host {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// A way hosts are commonly passed around in this crate.
pub type HostRef<'a> = &'a Arc<Host>;
