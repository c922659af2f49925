//! Pairing — servers durably claim clients up to their capacity.
//!
//! Selection order for a requesting server:
//!   1. clients it already holds, ascending id
//!   2. unclaimed clients, ascending id
//!
//! The first `capacity` entries are returned and any unclaimed ones among
//! them are claimed. Clients held by another server are never offered.

use parking_lot::Mutex;

use peerview_core::config::PairingConfig;
use peerview_core::peer::{PeerId, PeerRecord};

use crate::directory::{Claim, Registry};

pub struct PairingAssigner {
    config: PairingConfig,
    /// Serializes pairing passes: snapshot, selection and claims run as one unit.
    gate: Mutex<()>,
}

impl PairingAssigner {
    pub fn new(config: PairingConfig) -> Self {
        Self {
            config,
            gate: Mutex::new(()),
        }
    }

    /// Clients `requester` may hold on this pass.
    ///
    /// Without `respect_capacity` every server gets one slot. A capacity of
    /// zero is treated as one.
    pub fn effective_capacity(&self, requester: &PeerRecord) -> usize {
        if !self.config.respect_capacity {
            return 1;
        }
        if requester.capacity == 0 {
            tracing::warn!(
                peer_id = requester.id,
                "server capacity is 0, treating as 1"
            );
            return 1;
        }
        requester.capacity as usize
    }

    /// Select and claim clients for `requester`.
    ///
    /// `candidates` is called under the pairing gate so the snapshot it takes
    /// cannot be invalidated by another pass before the claims land.
    pub fn assign<R, F>(&self, registry: &R, requester: &PeerRecord, candidates: F) -> Vec<PeerRecord>
    where
        R: Registry + ?Sized,
        F: FnOnce(&R) -> Vec<PeerRecord>,
    {
        let _pass = self.gate.lock();
        let capacity = self.effective_capacity(requester);
        let ordered = order_eligible(requester.id, candidates(registry));

        let mut selected = Vec::with_capacity(capacity.min(ordered.len()));
        for mut candidate in ordered {
            if selected.len() == capacity {
                break;
            }
            if candidate.is_claimed_by(requester.id) {
                selected.push(candidate);
                continue;
            }
            match registry.claim(candidate.id, requester.id) {
                Claim::Granted => {
                    tracing::info!(
                        server_id = requester.id,
                        client_id = candidate.id,
                        "client claimed"
                    );
                    candidate.pair_id = Some(requester.id);
                    selected.push(candidate);
                }
                Claim::Held(holder) => {
                    tracing::debug!(
                        server_id = requester.id,
                        client_id = candidate.id,
                        holder,
                        "client claimed elsewhere since snapshot"
                    );
                }
                Claim::Gone => {
                    tracing::debug!(client_id = candidate.id, "client left before claim");
                }
            }
        }
        selected
    }
}

/// Keep candidates that are free or already held by `requester`; held ones
/// first, each tier ascending by id.
pub fn order_eligible(requester: PeerId, candidates: Vec<PeerRecord>) -> Vec<PeerRecord> {
    let mut eligible: Vec<PeerRecord> = candidates
        .into_iter()
        .filter(|c| c.pair_id.is_none() || c.is_claimed_by(requester))
        .collect();
    eligible.sort_by_key(|c| (!c.is_claimed_by(requester), c.id));
    eligible
}
