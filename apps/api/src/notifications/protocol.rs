//! # Notification Protocol Messages
//!
//! JSON frames exchanged over `/ws`.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Notification Protocol                                │
//! │                                                                         │
//! │  LIFECYCLE                                                             │
//! │  ─────────                                                             │
//! │  server ───► connection_status { status, message, clients_count }      │
//! │  client ───► client_identification { type, name }                      │
//! │  server ───► identification_confirmed { status, message }              │
//! │                                                                         │
//! │  EVENTS (client-originated, fanned out)                                │
//! │  ──────────────────────────────────────                                │
//! │  stock_update     ───► stock_updated        (everyone)                 │
//! │  new_sale         ───► sale_processed       (everyone but the sender)  │
//! │  new_product      ───► product_created      (everyone)                 │
//! │  low_stock_alert  ───► low_stock_warning    (everyone)                 │
//! │  system_message   ───► system_notification  (everyone)                 │
//! │                                                                         │
//! │  KEEPALIVE                                                             │
//! │  ─────────                                                             │
//! │  ping ───► pong { timestamp, message }     (sender only)               │
//! │                                                                         │
//! │  ERROR                                                                 │
//! │  ─────                                                                 │
//! │  server ───► error { code, message }       (sender only)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Adjacently tagged JSON with snake_case event names:
//! ```json
//! { "type": "stock_updated", "payload": { "product_id": 4, ... } }
//! ```
//!
//! The REST routes publish the same server events after a commit.

use chrono::Utc;
use ruedas_core::entities::Product;
use ruedas_core::sale::SaleReceipt;
use ruedas_core::stock::StockLevel;
use ruedas_core::Money;
use serde::{Deserialize, Serialize};

/// Current server time as RFC 3339.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

// =============================================================================
// Client → Server
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    ClientIdentification(IdentificationPayload),
    StockUpdate(StockUpdatePayload),
    NewSale(NewSalePayload),
    NewProduct(NewProductPayload),
    LowStockAlert(LowStockAlertPayload),
    SystemMessage(SystemMessagePayload),
    Ping(PingPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentificationPayload {
    /// Kind of client (`pos`, `dashboard`, ...).
    #[serde(rename = "type", default)]
    pub client_type: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUpdatePayload {
    pub product_id: i64,
    pub new_stock: i64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSalePayload {
    pub sale_id: i64,
    #[serde(default)]
    pub folio: Option<String>,
    pub total_cents: i64,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductPayload {
    pub product_id: i64,
    pub product_name: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockAlertPayload {
    pub product_id: i64,
    pub product_name: String,
    pub current_stock: i64,
    pub min_stock: i64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMessagePayload {
    pub message: String,
    #[serde(rename = "type", default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PingPayload {
    #[serde(default)]
    pub timestamp: Option<String>,
}

// =============================================================================
// Server → Client
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionStatus {
        status: String,
        message: String,
        clients_count: usize,
    },
    IdentificationConfirmed {
        status: String,
        message: String,
    },
    StockUpdated {
        product_id: i64,
        new_stock: i64,
        reason: String,
        timestamp: String,
    },
    SaleProcessed {
        sale_id: i64,
        folio: Option<String>,
        total_cents: i64,
        client_name: String,
        message: String,
        timestamp: String,
    },
    ProductCreated {
        product_id: i64,
        product_name: String,
        message: String,
        timestamp: String,
    },
    LowStockWarning {
        product_id: i64,
        product_name: String,
        current_stock: i64,
        min_stock: i64,
        message: String,
        timestamp: String,
    },
    SystemNotification {
        message: String,
        #[serde(rename = "type")]
        level: String,
        timestamp: String,
    },
    Pong {
        timestamp: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn connected(clients_count: usize) -> Self {
        ServerMessage::ConnectionStatus {
            status: "connected".to_string(),
            message: "Connected to the notification server".to_string(),
            clients_count,
        }
    }

    pub fn identified(identification: &IdentificationPayload) -> Self {
        ServerMessage::IdentificationConfirmed {
            status: "success".to_string(),
            message: format!("Client {} identified", identification.name),
        }
    }

    pub fn pong() -> Self {
        ServerMessage::Pong {
            timestamp: timestamp(),
            message: "Server alive".to_string(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn stock_updated(level: &StockLevel, reason: impl Into<String>) -> Self {
        ServerMessage::StockUpdated {
            product_id: level.product_id,
            new_stock: level.current_stock,
            reason: reason.into(),
            timestamp: timestamp(),
        }
    }

    pub fn sale_processed(receipt: &SaleReceipt, client_name: Option<String>) -> Self {
        ServerMessage::SaleProcessed {
            sale_id: receipt.sale_id,
            folio: Some(receipt.folio.clone()),
            total_cents: receipt.totals.total_cents,
            client_name: client_name.unwrap_or_else(|| "N/A".to_string()),
            message: format!("New sale processed: {}", receipt.totals.total()),
            timestamp: receipt.sold_at.to_rfc3339(),
        }
    }

    pub fn product_created(product: &Product) -> Self {
        ServerMessage::ProductCreated {
            product_id: product.id,
            product_name: product.name.clone(),
            message: format!("New product: {}", product.name),
            timestamp: timestamp(),
        }
    }

    pub fn low_stock_warning(level: &StockLevel) -> Self {
        ServerMessage::LowStockWarning {
            product_id: level.product_id,
            product_name: level.product_name.clone(),
            current_stock: level.current_stock,
            min_stock: level.stock_min,
            message: low_stock_message(&level.product_name, level.current_stock),
            timestamp: timestamp(),
        }
    }

    /// Server event fanned out for a client-originated one. `None` for
    /// messages that are answered to the sender only.
    pub fn relay(message: ClientMessage) -> Option<Self> {
        let event = match message {
            ClientMessage::StockUpdate(p) => ServerMessage::StockUpdated {
                product_id: p.product_id,
                new_stock: p.new_stock,
                reason: p.reason,
                timestamp: p.timestamp.unwrap_or_else(timestamp),
            },
            ClientMessage::NewSale(p) => ServerMessage::SaleProcessed {
                sale_id: p.sale_id,
                folio: p.folio,
                total_cents: p.total_cents,
                client_name: p.client_name.unwrap_or_else(|| "N/A".to_string()),
                message: format!("New sale processed: {}", Money::from_cents(p.total_cents)),
                timestamp: p.timestamp.unwrap_or_else(timestamp),
            },
            ClientMessage::NewProduct(p) => ServerMessage::ProductCreated {
                message: format!("New product: {}", p.product_name),
                product_id: p.product_id,
                product_name: p.product_name,
                timestamp: p.timestamp.unwrap_or_else(timestamp),
            },
            ClientMessage::LowStockAlert(p) => ServerMessage::LowStockWarning {
                message: low_stock_message(&p.product_name, p.current_stock),
                product_id: p.product_id,
                product_name: p.product_name,
                current_stock: p.current_stock,
                min_stock: p.min_stock,
                timestamp: p.timestamp.unwrap_or_else(timestamp),
            },
            ClientMessage::SystemMessage(p) => ServerMessage::SystemNotification {
                message: p.message,
                level: p.level,
                timestamp: timestamp(),
            },
            ClientMessage::ClientIdentification(_) | ClientMessage::Ping(_) => return None,
        };
        Some(event)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn low_stock_message(product_name: &str, current_stock: i64) -> String {
    format!("Low stock: {} ({} units)", product_name, current_stock)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_wire_format() {
        let raw = json!({
            "type": "client_identification",
            "payload": {"type": "pos", "name": "Caja 1"}
        });

        match serde_json::from_value::<ClientMessage>(raw).unwrap() {
            ClientMessage::ClientIdentification(p) => {
                assert_eq!(p.client_type, "pos");
                assert_eq!(p.name, "Caja 1");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_ping_with_empty_payload() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping","payload":{}}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping(PingPayload { timestamp: None })));
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"reboot","payload":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_message_wire_format() {
        let value = serde_json::to_value(ServerMessage::connected(3)).unwrap();

        assert_eq!(value["type"], "connection_status");
        assert_eq!(value["payload"]["clients_count"], 3);
    }

    #[test]
    fn test_relay_new_sale() {
        let relayed = ServerMessage::relay(ClientMessage::NewSale(NewSalePayload {
            sale_id: 12,
            folio: Some("VTA-ABC-1234".to_string()),
            total_cents: 20_880,
            client_name: None,
            timestamp: Some("2024-05-01T10:00:00+00:00".to_string()),
        }))
        .unwrap();

        match relayed {
            ServerMessage::SaleProcessed { client_name, message, timestamp, .. } => {
                assert_eq!(client_name, "N/A");
                assert_eq!(message, "New sale processed: $208.80");
                assert_eq!(timestamp, "2024-05-01T10:00:00+00:00");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_relay_system_message_keeps_level() {
        let relayed = ServerMessage::relay(ClientMessage::SystemMessage(SystemMessagePayload {
            message: "Cierre de caja en 10 minutos".to_string(),
            level: "warning".to_string(),
        }))
        .unwrap();

        let value = serde_json::to_value(&relayed).unwrap();
        assert_eq!(value["type"], "system_notification");
        assert_eq!(value["payload"]["type"], "warning");
    }

    #[test]
    fn test_ping_is_not_relayed() {
        assert!(ServerMessage::relay(ClientMessage::Ping(PingPayload::default())).is_none());
    }

    #[test]
    fn test_low_stock_warning_from_level() {
        let level = StockLevel {
            product_id: 4,
            product_name: "Luz trasera LED".to_string(),
            current_stock: 2,
            stock_min: 5,
        };

        match ServerMessage::low_stock_warning(&level) {
            ServerMessage::LowStockWarning { message, min_stock, .. } => {
                assert_eq!(message, "Low stock: Luz trasera LED (2 units)");
                assert_eq!(min_stock, 5);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
