//! # Real-Time Notifications
//!
//! A [`NotificationHub`] of `/ws` listeners, the JSON protocol they speak,
//! and the announcements the REST routes publish after a commit.
//!
//! Publishing never blocks a request: each listener has a bounded queue
//! and a full queue drops the event for that listener only.

pub mod protocol;
pub mod registry;
pub mod socket;

use ruedas_core::stock::StockLevel;
use ruedas_db::SaleOutcome;

pub use protocol::{ClientMessage, ServerMessage};
pub use registry::{ListenerId, NotificationHub, Subscription};
pub use socket::ws_handler;

/// After a committed sale: `sale_processed`, one `stock_updated` per
/// product, and `low_stock_warning` for products at or below minimum.
pub fn announce_sale(hub: &NotificationHub, outcome: &SaleOutcome, client_name: Option<String>) {
    hub.broadcast(ServerMessage::sale_processed(&outcome.receipt, client_name));
    let reason = format!("Sale {}", outcome.receipt.folio);
    announce_stock(hub, &outcome.stock, &reason);
}

/// `stock_updated` for each level, plus a low-stock warning where due.
pub fn announce_stock(hub: &NotificationHub, levels: &[StockLevel], reason: &str) {
    for level in levels {
        hub.broadcast(ServerMessage::stock_updated(level, reason));
        if level.is_low() {
            hub.broadcast(ServerMessage::low_stock_warning(level));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
