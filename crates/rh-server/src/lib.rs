//! rh-server: HTTP API server for the reelhouse video catalog.
//!
//! This crate ties rh-core and rh-db into a running server. It provides:
//!
//! - Range-capable playback of stored videos ([`range`], [`streamer`])
//! - The video catalog service and its admin capability ([`catalog`], [`gate`])
//! - Multipart uploads, session login and an OpenAPI document
//! - Graceful shutdown via signal handling or a cancellation token

pub mod catalog;
pub mod context;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod range;
pub mod router;
pub mod routes;
pub mod streamer;
pub mod upload;

use std::net::SocketAddr;

use rh_core::config::{AuthConfig, Config};
use rh_db::pool::DbPool;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use crate::context::AppContext;

/// Start the reelhouse server and run until SIGINT/SIGTERM.
pub async fn start(config: Config) -> rh_core::Result<()> {
    start_with_cancel(config, CancellationToken::new()).await
}

/// Start the server; returns after a shutdown signal or when `cancel` fires.
pub async fn start_with_cancel(config: Config, cancel: CancellationToken) -> rh_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    // Initialize database.
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = rh_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    prepare_database(&db, &config.auth)?;

    let upload_dir = &config.storage.upload_dir;
    if !upload_dir.exists() {
        std::fs::create_dir_all(upload_dir)?;
        tracing::info!("Created upload directory {}", upload_dir.display());
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| rh_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| rh_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    let ctx = AppContext::new(db, config);
    serve(listener, ctx, cancel).await
}

/// Seed the configured admin and drop expired sessions.
pub fn prepare_database(db: &DbPool, auth: &AuthConfig) -> rh_core::Result<()> {
    let conn = rh_db::pool::get_conn(db)?;

    if let (Some(username), Some(hash)) = (&auth.username, &auth.password_hash) {
        let user = rh_db::queries::users::ensure_user(&conn, username, hash, "admin")?;
        tracing::info!(username = %user.username, "Admin account ready");
    }

    let now = rh_db::queries::now_timestamp();
    let purged = rh_db::queries::auth::delete_expired_tokens(&conn, &now)?;
    if purged > 0 {
        tracing::info!(purged, "Removed expired sessions");
    }

    Ok(())
}

/// Serve the application on an already-bound listener.
pub async fn serve(
    listener: TcpListener,
    ctx: AppContext,
    cancel: CancellationToken,
) -> rh_core::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on {addr}");
    }

    let app = router::build_router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM) or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}
