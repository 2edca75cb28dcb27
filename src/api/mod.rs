//! HTTP and WebSocket surface
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | /health | `health` |
//! | POST | /tickets | `create_ticket` |
//! | GET | /tickets | `list_tickets` |
//! | GET | /tickets/recent | `recent_tickets` |
//! | GET | /tickets/completed | `completed_tickets` |
//! | GET | /tickets/stats | `ticket_stats` |
//! | GET | /tickets/:id | `get_ticket` |
//! | DELETE | /tickets/:id | `delete_ticket` |
//! | POST | /tickets/:id/assign | `assign_ticket` |
//! | PATCH | /tickets/:id/status | `update_status` |
//! | GET | /tickets/:id/history | `ticket_history` |
//! | GET | /notifications | `list_notifications` |
//! | GET | /notifications/unread-count | `unread_count` |
//! | POST | /notifications/read-all | `mark_all_read` |
//! | POST | /notifications/:id/read | `read_notification` |
//! | GET | /ws/notifications | `notifications_socket` |
//!
//! Every route except `/health` and the socket expects
//! `Authorization: Bearer <token>`.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod ws;

use crate::context::AppContext;
use anyhow::Context as _;
use axum::Router;
use axum::routing::{get, patch, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builds the router over a shared context
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/tickets",
            get(handlers::list_tickets).post(handlers::create_ticket),
        )
        .route("/tickets/recent", get(handlers::recent_tickets))
        .route("/tickets/completed", get(handlers::completed_tickets))
        .route("/tickets/stats", get(handlers::ticket_stats))
        .route(
            "/tickets/:id",
            get(handlers::get_ticket).delete(handlers::delete_ticket),
        )
        .route("/tickets/:id/assign", post(handlers::assign_ticket))
        .route("/tickets/:id/status", patch(handlers::update_status))
        .route("/tickets/:id/history", get(handlers::ticket_history))
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/unread-count", get(handlers::unread_count))
        .route("/notifications/read-all", post(handlers::mark_all_read))
        .route("/notifications/:id/read", post(handlers::read_notification))
        .route("/ws/notifications", get(ws::notifications_socket))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Serves until Ctrl-C, then waits for in-flight deliveries
pub async fn serve(ctx: Arc<AppContext>) -> anyhow::Result<()> {
    let address = ctx.config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(Arc::clone(&ctx)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down, draining notification deliveries");
    ctx.dispatcher.drain().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
