//! Response Envelope
//!
//! Every Billow endpoint answers with the same JSON envelope:
//! `{"success": bool, "message": string, "data": <optional payload>}`.
//! Consumers branch on `success` and extract typed payloads from `data`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::task::TaskError;

/// The response contract shared by every Billow endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the operation succeeded server-side
    pub success: bool,
    /// Human-readable outcome, shown to the user as-is
    pub message: String,
    /// Optional payload; shape depends on the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Build a local failure envelope for errors that never reached the
    /// server or came back without a parseable body.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Deserialize the `data` payload into a concrete type.
    ///
    /// A missing payload deserializes from JSON null, so endpoints that
    /// return `data: []` or omit it entirely map cleanly onto `Option`
    /// and `Vec` targets.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, TaskError> {
        let value = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| TaskError::Malformed(format!("unexpected payload shape: {}", e)))
    }
}
