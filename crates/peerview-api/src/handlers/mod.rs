//! HTTP API handlers — signaling endpoints and role-aware peer views.

pub mod peers;
pub mod signaling;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use peerview_core::peer::PeerId;
use peerview_services::{PeerDirectory, PeerView, RelayError, SignalRelay, ViewError};

#[derive(Clone)]
pub struct ApiState {
    pub view: Arc<PeerView<PeerDirectory>>,
    pub relay: SignalRelay,
}

impl ApiState {
    /// Both halves must share one directory: views read what the relay registers.
    pub fn new(view: Arc<PeerView<PeerDirectory>>, relay: SignalRelay) -> Self {
        Self { view, relay }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

type ApiError = (StatusCode, String);

/// Body with the peer id in `Pragma`, as signaling clients expect. The body
/// is passed through as-is.
fn pragma_text(id: PeerId, body: impl Into<Body>) -> Response {
    (
        StatusCode::OK,
        [
            (header::PRAGMA, id.to_string()),
            (header::CONTENT_TYPE, "text/plain".to_string()),
        ],
        body.into(),
    )
        .into_response()
}

fn view_error(e: ViewError) -> ApiError {
    match e {
        ViewError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
    }
}

fn relay_error(e: RelayError) -> ApiError {
    let status = match e {
        RelayError::UnknownPeer(_) | RelayError::SignedOut(_) => StatusCode::NOT_FOUND,
        RelayError::MailboxFull(_) => StatusCode::SERVICE_UNAVAILABLE,
        RelayError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    (status, e.to_string())
}

// Re-export handler functions for use in router setup.
pub use peers::{handle_peers, handle_status};
pub use signaling::{handle_message, handle_sign_in, handle_sign_out, handle_wait};
