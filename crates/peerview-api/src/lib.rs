pub mod handlers;

use std::future::Future;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// The signaling routes, webrtc-signal-http compatible, plus `/peers` and `/status`.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::header::PRAGMA]);

    Router::new()
        .route("/sign_in", get(handlers::handle_sign_in))
        .route("/sign_out", get(handlers::handle_sign_out))
        .route("/message", post(handlers::handle_message))
        .route("/wait", get(handlers::handle_wait))
        .route("/peers", get(handlers::handle_peers))
        .route("/status", get(handlers::handle_status))
        .with_state(state)
        .layer(cors)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(state: ApiState, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "signaling API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
