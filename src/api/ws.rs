//! Live notification endpoint
//!
//! `GET /ws/notifications?token=...` (or a bearer header). The caller is
//! authenticated before the upgrade; an unknown token never reaches the
//! registry. Each socket gets a pump that forwards registry payloads as JSON
//! text frames until either side goes away.

use super::error::ApiError;
use super::extract::{ApiQuery, blocking};
use crate::auth::bearer_token;
use crate::context::AppContext;
use crate::error::ServiceDeskError;
use crate::notify::Subscription;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    #[serde(default)]
    pub token: Option<String>,
}

pub async fn notifications_socket(
    State(ctx): State<Arc<AppContext>>,
    ApiQuery(params): ApiQuery<SocketParams>,
    headers: HeaderMap,
    upgrade: Option<WebSocketUpgrade>,
) -> Result<Response, ApiError> {
    let header_token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);
    let token = params
        .token
        .as_deref()
        .or(header_token)
        .ok_or(ServiceDeskError::Unauthenticated)?
        .to_string();
    let user = blocking(&ctx, move |ctx| ctx.authenticator.authenticate(&token)).await?;

    let Some(upgrade) = upgrade else {
        return Err(ApiError::bad_request("expected a WebSocket upgrade"));
    };

    let subscription = ctx.registry.connect(&user.id);
    info!(user = %user.username, connection = %subscription.connection_id(), "live connection opened");

    Ok(upgrade.on_upgrade(move |socket: WebSocket| {
        let (sink, stream) = socket.split();
        pump(sink, stream, subscription)
    }))
}

/// Forwards payloads to `sink` until the client closes or a send fails
///
/// Dropping `subscription` on return removes the connection from the registry.
pub(crate) async fn pump<W, R>(mut sink: W, mut stream: R, mut subscription: Subscription)
where
    W: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        tokio::select! {
            payload = subscription.recv() => {
                let Some(payload) = payload else { break };
                let text = match serde_json::to_string(&payload) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode notification {}: {e}", payload.id);
                        continue;
                    },
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {},
            }
        }
    }

    debug!(
        user = %subscription.user_id(),
        connection = %subscription.connection_id(),
        "live connection closed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Notification, NotificationPayload, Role, TicketBuilder, User};
    use futures::channel::mpsc;

    fn payload(user: &User) -> NotificationPayload {
        let ticket = TicketBuilder::new().title("Printer broken").build();
        let notification = Notification::new(ticket.id.clone(), user.id.clone(), "hello");
        NotificationPayload::new(&notification, &ticket)
    }

    #[tokio::test]
    async fn test_pump_forwards_payloads_as_json() {
        let ctx = AppContext::in_memory().unwrap();
        let user = User::new("tech", Role::Technician);
        let subscription = ctx.registry.connect(&user.id);
        let (out_tx, mut out_rx) = mpsc::unbounded::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();

        let task = tokio::spawn(pump(out_tx, in_rx, subscription));
        ctx.registry.broadcast(&user.id, &payload(&user));

        let Some(Message::Text(text)) = out_rx.next().await else {
            panic!("expected a text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["message"], "hello");
        assert_eq!(value["ticket_title"], "Printer broken");
        assert_eq!(value["ticket_status"], "OPEN");
        assert_eq!(value["read"], false);

        drop(in_tx);
        task.await.unwrap();
        assert_eq!(ctx.registry.connection_count(&user.id), 0);
    }

    #[tokio::test]
    async fn test_close_frame_ends_pump() {
        let ctx = AppContext::in_memory().unwrap();
        let user = User::new("staff", Role::Staff);
        let subscription = ctx.registry.connect(&user.id);
        let (out_tx, _out_rx) = mpsc::unbounded::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();

        in_tx.unbounded_send(Ok(Message::Ping(Vec::new()))).unwrap();
        in_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        pump(out_tx, in_rx, subscription).await;

        assert_eq!(ctx.registry.connection_count(&user.id), 0);
    }
}
