//! /sign_in, /sign_out, /message, /wait — the signaling protocol.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use bytes::Bytes;
use serde::Deserialize;

use peerview_core::peer::{validate_name, PeerId, DEFAULT_CAPACITY};
use peerview_services::Delivery;

use super::{pragma_text, relay_error, view_error, ApiError, ApiState};

#[derive(Deserialize)]
pub struct PeerQuery {
    pub peer_id: PeerId,
}

#[derive(Deserialize)]
pub struct MessageQuery {
    pub peer_id: PeerId,
    pub to: PeerId,
}

// ── /sign_in ──────────────────────────────────────────────────────────────────

/// `?peer_name=<name>` or a bare `?<name>`; optional `capacity`.
fn sign_in_params(query: &HashMap<String, String>) -> Result<(String, u32), ApiError> {
    let name = match query.get("peer_name") {
        Some(name) => name.clone(),
        None => query
            .iter()
            .find(|(k, v)| v.is_empty() && k.as_str() != "capacity")
            .map(|(k, _)| k.clone())
            .ok_or((StatusCode::BAD_REQUEST, "missing peer_name".to_string()))?,
    };
    validate_name(&name).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let capacity = match query.get("capacity") {
        Some(v) => v
            .parse()
            .map_err(|_| (StatusCode::BAD_REQUEST, "invalid capacity".to_string()))?,
        None => DEFAULT_CAPACITY,
    };
    Ok((name, capacity))
}

pub async fn handle_sign_in(
    State(state): State<ApiState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let (name, capacity) = sign_in_params(&query)?;
    let id = state.relay.sign_in(&name, capacity);
    let view = state.view.compute(id).map_err(view_error)?;
    Ok(pragma_text(id, view))
}

// ── /sign_out ─────────────────────────────────────────────────────────────────

pub async fn handle_sign_out(
    State(state): State<ApiState>,
    Query(query): Query<PeerQuery>,
) -> Result<StatusCode, ApiError> {
    match state.relay.sign_out(query.peer_id) {
        Some(_) => Ok(StatusCode::OK),
        None => Err((
            StatusCode::NOT_FOUND,
            format!("peer {} not found", query.peer_id),
        )),
    }
}

// ── /message ──────────────────────────────────────────────────────────────────

pub async fn handle_message(
    State(state): State<ApiState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let delivery = state
        .relay
        .send(query.peer_id, query.to, body)
        .map_err(relay_error)?;
    Ok(match delivery {
        Delivery::Direct => StatusCode::OK,
        Delivery::Buffered => StatusCode::ACCEPTED,
    })
}

// ── /wait ─────────────────────────────────────────────────────────────────────

pub async fn handle_wait(
    State(state): State<ApiState>,
    Query(query): Query<PeerQuery>,
) -> Result<Response, ApiError> {
    let envelope = state.relay.wait(query.peer_id).await.map_err(relay_error)?;
    Ok(pragma_text(envelope.from, envelope.body))
}
