//! Peer directory — the registry every view is computed against.
//!
//! `Registry` is the narrow capability the view and pairing code consume.
//! `PeerDirectory` is the in-memory implementation the signaling server
//! registers peers in; any other store can stand in by implementing the trait.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use peerview_core::peer::{PeerId, PeerRecord, DEFAULT_CAPACITY};

/// Outcome of trying to claim a client for a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The client now belongs (or already belonged) to the server.
    Granted,
    /// The client is held by a different server. Claims are sticky.
    Held(PeerId),
    /// The client is no longer in the directory.
    Gone,
}

/// What the view computer needs from a peer directory.
pub trait Registry: Send + Sync {
    /// Look up a single peer.
    fn get_peer(&self, id: PeerId) -> Option<PeerRecord>;

    /// Snapshot of every peer, ascending by id.
    fn peers(&self) -> Vec<PeerRecord>;

    /// Set `client.pair_id = server` unless another server already holds it.
    ///
    /// Must be atomic per client: two servers racing for the same client
    /// get exactly one `Granted`.
    fn claim(&self, client: PeerId, server: PeerId) -> Claim;
}

impl<R: Registry + ?Sized> Registry for Arc<R> {
    fn get_peer(&self, id: PeerId) -> Option<PeerRecord> {
        (**self).get_peer(id)
    }

    fn peers(&self) -> Vec<PeerRecord> {
        (**self).peers()
    }

    fn claim(&self, client: PeerId, server: PeerId) -> Claim {
        (**self).claim(client, server)
    }
}

#[derive(Debug)]
struct Inner {
    peers: BTreeMap<PeerId, PeerRecord>,
    next_id: PeerId,
}

/// In-memory peer directory. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct PeerDirectory {
    inner: Arc<RwLock<Inner>>,
}

impl Default for PeerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                peers: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Register a peer with the default capacity. Returns its new id.
    pub fn add_peer(&self, name: impl Into<String>) -> PeerId {
        self.add_peer_with_capacity(name, DEFAULT_CAPACITY)
    }

    pub fn add_peer_with_capacity(&self, name: impl Into<String>, capacity: u32) -> PeerId {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .peers
            .insert(id, PeerRecord::new(id, name).with_capacity(capacity));
        id
    }

    /// Remove a peer. Clients it had claimed keep their `pair_id`; a claim
    /// only ends when the claimed peer itself leaves.
    pub fn remove_peer(&self, id: PeerId) -> Option<PeerRecord> {
        self.inner.write().peers.remove(&id)
    }

    /// Update liveness. Returns false if the peer is unknown.
    pub fn set_status(&self, id: PeerId, live: bool) -> bool {
        match self.inner.write().peers.get_mut(&id) {
            Some(peer) => {
                peer.status = live;
                true
            }
            None => false,
        }
    }

    /// Update capacity. Returns false if the peer is unknown.
    pub fn set_capacity(&self, id: PeerId, capacity: u32) -> bool {
        match self.inner.write().peers.get_mut(&id) {
            Some(peer) => {
                peer.capacity = capacity;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.inner.read().peers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().peers.is_empty()
    }

    /// Number of peers currently claimed by some server.
    pub fn claimed_count(&self) -> usize {
        self.inner
            .read()
            .peers
            .values()
            .filter(|p| p.pair_id.is_some())
            .count()
    }
}

impl Registry for PeerDirectory {
    fn get_peer(&self, id: PeerId) -> Option<PeerRecord> {
        self.inner.read().peers.get(&id).cloned()
    }

    fn peers(&self) -> Vec<PeerRecord> {
        self.inner.read().peers.values().cloned().collect()
    }

    fn claim(&self, client: PeerId, server: PeerId) -> Claim {
        let mut inner = self.inner.write();
        let Some(peer) = inner.peers.get_mut(&client) else {
            return Claim::Gone;
        };
        match peer.pair_id {
            Some(holder) if holder != server => Claim::Held(holder),
            _ => {
                peer.pair_id = Some(server);
                Claim::Granted
            }
        }
    }
}
