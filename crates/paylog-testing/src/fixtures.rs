//! Call record payload builders.

use serde_json::{json, Map, Value};

/// Builder for `/api/data` request bodies.
///
/// Starts from a complete, valid successful call and lets tests override or
/// remove individual fields.
#[derive(Debug, Clone)]
pub struct CallRecordBuilder {
    fields: Map<String, Value>,
}

impl CallRecordBuilder {
    /// Creates a valid `Success` payload for the given transaction hash.
    pub fn new(tx_hash: impl Into<String>) -> Self {
        let fields = json!({
            "tx_hash": tx_hash.into(),
            "provider": "weather-api",
            "provider_node": "node-provider-1",
            "source_node": "node-source-1",
            "arg_count": 2,
            "price_usdc": "0.250000",
            "transferred_usdc": "0.250000",
            "status": "Success",
            "started_at": "2024-05-01T12:00:00Z",
            "completed_at": "2024-05-01T12:00:01.500Z",
            "total_duration_ms": 1500,
            "successful_attempt": 1,
            "total_attempts": 1,
            "response_size_bytes": 512,
            "payment_validated": true
        })
        .as_object()
        .cloned()
        .unwrap_or_default();

        Self { fields }
    }

    /// Switches the payload to a failed call with the given error category.
    #[must_use]
    pub fn failed(self, error_type: &str, error_message: &str) -> Self {
        self.field("status", "Failed")
            .field("error_type", error_type)
            .field("error_message", error_message)
            .field("successful_attempt", 0)
            .field("total_attempts", 3)
            .without("completed_at")
            .without("response_size_bytes")
    }

    /// Sets a field to an arbitrary JSON value.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Removes a field.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    /// Builds the JSON payload.
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Shorthand for a valid successful call record payload.
pub fn call_record_payload(tx_hash: &str) -> Value {
    CallRecordBuilder::new(tx_hash).build()
}
