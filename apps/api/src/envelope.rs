//! # Response Envelope
//!
//! Every JSON response, success or failure, has the same shape:
//!
//! ```text
//! { "success": true,  "data": {...}, "message": "..." }
//! { "success": false, "error": "...", "message": "..." }
//! ```
//!
//! `data`, `error` and `message` are omitted when absent.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Envelope<()> {
    /// Success with a message and no payload (soft deletes).
    pub fn done(message: impl Into<String>) -> Self {
        Envelope {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_omits_error() {
        let body = serde_json::to_value(Envelope::ok(json!({"id": 1})).with_message("Creado")).unwrap();

        assert_eq!(body, json!({"success": true, "data": {"id": 1}, "message": "Creado"}));
    }

    #[test]
    fn test_failure_omits_data() {
        let body = serde_json::to_value(Envelope::failure("Stock insuficiente")).unwrap();

        assert_eq!(body, json!({"success": false, "error": "Stock insuficiente"}));
    }
}
