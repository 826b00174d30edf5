//! Server assembly

use std::net::{Ipv4Addr, SocketAddr};

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::create_router;
use crate::AppState;

/// Routes plus tracing and CORS. Every endpoint is a read, so only GET is
/// allowed cross-origin.
pub fn create_app(state: AppState) -> Router {
    create_router(state).layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET])
            .allow_headers(Any),
    )
}

/// Serve on every interface until ctrl-c.
pub async fn start_server(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "routing API listening");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("routing API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("ctrl-c handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}
