//! Gateway Payloads
//!
//! JSON bodies accepted and returned by the HTTP gateway.

use serde::{Deserialize, Serialize};

/// Route for single-key reads, writes and deletes.
pub const ENDPOINT_KV: &str = "/kv/:key";
/// Route for the coordinator's INFO report.
pub const ENDPOINT_INFO: &str = "/info";

/// Body of a `PUT /kv/:key` request.
///
/// A JSON string is stored as-is; any other JSON value is stored as its
/// serialized text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutBody {
    pub value: serde_json::Value,
}

impl PutBody {
    pub fn into_stored(self) -> String {
        match self.value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

/// Body of a successful `GET /kv/:key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueBody {
    pub key: String,
    pub value: String,
}

/// Outcome text for writes, errors and INFO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}
