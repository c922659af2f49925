//! /peers and /status handlers.

use axum::extract::{Query, State};
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use super::signaling::PeerQuery;
use super::{pragma_text, view_error, ApiError, ApiState};

// ── /peers ────────────────────────────────────────────────────────────────────

/// The requesting peer's view. With pairing on, this is what claims clients.
pub async fn handle_peers(
    State(state): State<ApiState>,
    Query(query): Query<PeerQuery>,
) -> Result<Response, ApiError> {
    let view = state.view.compute(query.peer_id).map_err(view_error)?;
    Ok(pragma_text(query.peer_id, view))
}

// ── /status ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub peers: usize,
    pub claimed: usize,
    /// Messages waiting in mailboxes across all peers.
    pub buffered: usize,
    pub pairing: PairingInfo,
}

#[derive(Serialize)]
pub struct PairingInfo {
    pub enabled: bool,
    pub respect_capacity: bool,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let directory = state.view.registry();
    let pairing = state.view.pairing();
    Json(StatusResponse {
        peers: directory.len(),
        claimed: directory.claimed_count(),
        buffered: state.relay.buffered(),
        pairing: PairingInfo {
            enabled: pairing.enabled,
            respect_capacity: pairing.respect_capacity,
        },
    })
}
