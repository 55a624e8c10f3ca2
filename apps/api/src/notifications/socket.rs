//! # WebSocket Endpoint
//!
//! `GET /ws` upgrades to a socket registered in the [`NotificationHub`].
//!
//! ```text
//! ┌──────────────┐  text frames   ┌──────────────────┐
//! │  client      │ ─────────────► │  receive loop    │──► dispatch()
//! │              │                └──────────────────┘        │
//! │              │  text frames   ┌──────────────────┐        ▼
//! │              │ ◄───────────── │  outgoing task   │◄── listener queue
//! └──────────────┘                └──────────────────┘
//! ```
//!
//! Closing the socket drops the [`Subscription`](super::Subscription),
//! which removes the listener.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use super::protocol::{ClientMessage, ServerMessage};
use super::registry::{ListenerId, NotificationHub};
use crate::state::AppState;

/// Maximum inbound frame size (64 KiB).
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = state.hub.clone();
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: NotificationHub) {
    let (mut sender, mut receiver) = socket.split();
    let (subscription, mut queue) = hub.register();
    let listener = subscription.id();

    info!(listener = %listener, listeners = hub.listener_count(), "Listener connected");
    hub.send_to(listener, ServerMessage::connected(hub.listener_count()));

    // Outgoing message task
    let outgoing_handle = tokio::spawn(async move {
        while let Some(event) = queue.recv().await {
            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!(?e, "Failed to serialize notification");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Main receive loop
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => dispatch(&hub, listener, message),
                Err(e) => {
                    debug!(listener = %listener, error = %e, "Unparseable frame");
                    hub.send_to(
                        listener,
                        ServerMessage::error("invalid_message", format!("Invalid message: {}", e)),
                    );
                }
            },
            Ok(Message::Binary(_)) => {
                hub.send_to(
                    listener,
                    ServerMessage::error("unsupported", "Binary frames are not supported"),
                );
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Control frames are answered by axum
            }
            Ok(Message::Close(_)) => {
                debug!(listener = %listener, "Close frame received");
                break;
            }
            Err(e) => {
                warn!(listener = %listener, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outgoing_handle.abort();
    drop(subscription);
    info!(listener = %listener, listeners = hub.listener_count(), "Listener disconnected");
}

/// Routes one client event: replies go to the sender, everything else is
/// fanned out. `new_sale` skips the sender.
pub(crate) fn dispatch(hub: &NotificationHub, origin: ListenerId, message: ClientMessage) {
    match message {
        ClientMessage::ClientIdentification(identification) => {
            info!(
                listener = %origin,
                client_type = %identification.client_type,
                name = %identification.name,
                "Client identified"
            );
            hub.send_to(origin, ServerMessage::identified(&identification));
        }
        ClientMessage::Ping(_) => {
            hub.send_to(origin, ServerMessage::pong());
        }
        message @ ClientMessage::NewSale(_) => {
            if let Some(event) = ServerMessage::relay(message) {
                hub.broadcast_except(event, origin);
            }
        }
        message => {
            if let Some(event) = ServerMessage::relay(message) {
                hub.broadcast(event);
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::protocol::{IdentificationPayload, NewSalePayload, PingPayload, StockUpdatePayload};

    #[tokio::test]
    async fn test_identification_answers_sender_only() {
        let hub = NotificationHub::default();
        let (me, mut my_queue) = hub.register();
        let (_other, mut other_queue) = hub.register();

        dispatch(
            &hub,
            me.id(),
            ClientMessage::ClientIdentification(IdentificationPayload {
                client_type: "pos".to_string(),
                name: "Caja 1".to_string(),
            }),
        );

        match my_queue.recv().await {
            Some(ServerMessage::IdentificationConfirmed { message, .. }) => {
                assert_eq!(message, "Client Caja 1 identified");
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(other_queue.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let hub = NotificationHub::default();
        let (me, mut queue) = hub.register();

        dispatch(&hub, me.id(), ClientMessage::Ping(PingPayload::default()));

        assert!(matches!(queue.recv().await, Some(ServerMessage::Pong { .. })));
    }

    #[tokio::test]
    async fn test_new_sale_skips_sender() {
        let hub = NotificationHub::default();
        let (seller, mut seller_queue) = hub.register();
        let (_dashboard, mut dashboard_queue) = hub.register();

        dispatch(
            &hub,
            seller.id(),
            ClientMessage::NewSale(NewSalePayload {
                sale_id: 1,
                folio: None,
                total_cents: 10_000,
                client_name: Some("Taller El Pedal".to_string()),
                timestamp: None,
            }),
        );

        assert!(matches!(
            dashboard_queue.recv().await,
            Some(ServerMessage::SaleProcessed { sale_id: 1, .. })
        ));
        assert!(seller_queue.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stock_update_reaches_sender_too() {
        let hub = NotificationHub::default();
        let (me, mut queue) = hub.register();

        dispatch(
            &hub,
            me.id(),
            ClientMessage::StockUpdate(StockUpdatePayload {
                product_id: 3,
                new_stock: 7,
                reason: "Ajuste".to_string(),
                timestamp: None,
            }),
        );

        assert!(matches!(
            queue.recv().await,
            Some(ServerMessage::StockUpdated { product_id: 3, new_stock: 7, .. })
        ));
    }
}
