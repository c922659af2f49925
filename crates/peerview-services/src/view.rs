//! Role-aware peer views.
//!
//! Servers see clients, clients see servers, unidentified peers see
//! everyone. With pairing enabled a server sees only the clients it has
//! claimed. A view is never empty: with nothing to show, the requester
//! gets its own line back.

use peerview_core::config::PairingConfig;
use peerview_core::peer::{render_lines, PeerId, PeerRecord};
use peerview_core::Role;

use crate::directory::Registry;
use crate::pairing::PairingAssigner;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("peer {0} not found")]
    NotFound(PeerId),
}

/// Computes views over any `Registry`.
pub struct PeerView<R> {
    registry: R,
    pairing: PairingConfig,
    assigner: PairingAssigner,
}

impl<R: Registry> PeerView<R> {
    pub fn new(registry: R, pairing: PairingConfig) -> Self {
        Self {
            registry,
            pairing,
            assigner: PairingAssigner::new(pairing),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn pairing(&self) -> PairingConfig {
        self.pairing
    }

    /// The newline-terminated view for `requester`.
    pub fn compute(&self, requester: PeerId) -> Result<String, ViewError> {
        let me = self
            .registry
            .get_peer(requester)
            .ok_or(ViewError::NotFound(requester))?;
        let visible = self.select(&me);

        if visible.is_empty() {
            // The requester's own line is the fallback even if its name is
            // malformed; the view must stay one well-formed line.
            return Ok(format!("{}\n", me.sanitized_line()));
        }
        Ok(render_lines(&visible))
    }

    fn select(&self, me: &PeerRecord) -> Vec<PeerRecord> {
        let role = me.role();
        if role == Role::Server && self.pairing.enabled {
            return self.assigner.assign(&self.registry, me, |registry| {
                renderable(registry.peers(), Some(Role::Client))
            });
        }
        renderable(self.registry.peers(), role.counterpart())
    }
}

/// Drop records that would corrupt the line protocol, optionally keeping
/// only one role.
fn renderable(peers: Vec<PeerRecord>, only: Option<Role>) -> Vec<PeerRecord> {
    peers
        .into_iter()
        .filter(|p| only.map_or(true, |role| p.role() == role))
        .filter(|p| match p.check_renderable() {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(peer_id = p.id, %reason, "skipping malformed peer record");
                false
            }
        })
        .collect()
}
