mod config;
mod room;
mod signaling;

pub use config::{BroadcastPolicy, RelayConfig};
pub use room::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
}

/// Bind `config.bind_addr` and serve until the process is stopped.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    serve_on(listener, config).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, config: RelayConfig) -> anyhow::Result<()> {
    info!(
        "Relay listening on {} (broadcast: {:?})",
        listener.local_addr()?,
        config.broadcast
    );
    let service = SignalingService::new(&config);
    axum::serve(listener, router(service)).await?;
    Ok(())
}
