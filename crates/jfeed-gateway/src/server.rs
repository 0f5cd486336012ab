//! HTTP server implementation using Axum.

use crate::handlers::{
    handle_cache_clear, handle_cache_stats, handle_health, handle_home, handle_page,
    handle_resolve,
};
use crate::middleware::resolve_redirects;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use jfeed_core::JfeedApi;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Application state shared across handlers.
pub struct AppState {
    pub api: JfeedApi,
}

/// Build the router: JSON API routes plus the page fallback, all behind the
/// redirect middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/home", get(handle_home))
        .route("/api/resolve", get(handle_resolve))
        .route("/api/cache/stats", get(handle_cache_stats))
        .route("/api/cache/clear", post(handle_cache_clear))
        .fallback(handle_page)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn_with_state(state.clone(), resolve_redirects)),
        )
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns the bound address (useful when port=0) and the serving task, which
/// finishes after Ctrl+C or SIGTERM.
pub async fn start_server(
    api: JfeedApi,
    host: &str,
    port: u16,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let state = Arc::new(AppState { api });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, handle))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
