//! JSON-RPC 2.0 envelope model for the MCPL wire protocol.
//!
//! Classification of inbound lines is structural, not typed:
//!
//! | Shape                                   | Classified as                 |
//! |-----------------------------------------|-------------------------------|
//! | `id` + `method`                         | [`Inbound::PeerRequest`]      |
//! | `id` + (`result` \| `error`), no `method` | [`Inbound::Response`]       |
//! | `method`, no `id`                       | [`Inbound::Notification`]     |
//! | anything else                           | [`ClientError::Parse`]        |
//!
//! Peer-chosen request ids live in a namespace of their own: they are echoed
//! back verbatim in the auto-reply and are never matched against the
//! client's pending table, even when their numeric values collide with
//! client-issued ids.

use serde_json::{json, Map, Value};

use crate::{ClientError, Result};

/// JSON-RPC version stamped on every outbound envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision negotiated during the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCPL experimental-capability revision declared by this client.
pub const MCPL_VERSION: &str = "0.4";

/// One classified inbound message unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A response to a client-issued request. `outcome` is `Ok(result)` or
    /// `Err(error payload)`.
    Response {
        /// The id echoed from the originating request.
        id: Value,
        /// `result` on success, the `error` payload otherwise.
        outcome: std::result::Result<Value, Value>,
    },
    /// A request initiated by the peer. Requires a reply on the same id.
    PeerRequest {
        /// Peer-chosen id, echoed back verbatim in the reply.
        id: Value,
        /// Method name used to dispatch the auto-reply handler.
        method: String,
        /// Method payload; `{}` when absent.
        params: Value,
    },
    /// A one-way notification. No reply is sent.
    Notification {
        /// Method name of the notification.
        method: String,
        /// Notification payload; `{}` when absent.
        params: Value,
    },
}

/// Classify one inbound line into an [`Inbound`] message.
///
/// # Errors
///
/// - [`ClientError::Parse`]`("malformed json: …")` — not valid JSON.
/// - [`ClientError::Parse`]`("envelope is not a JSON object")`.
/// - [`ClientError::Parse`]`("unclassifiable envelope")` — a JSON object that
///   fits none of the three envelope shapes.
pub fn classify(line: &str) -> Result<Inbound> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| ClientError::Parse(format!("malformed json: {e}")))?;

    let Some(obj) = value.as_object() else {
        return Err(ClientError::Parse("envelope is not a JSON object".into()));
    };

    let has_id = obj.contains_key("id");
    let has_method = obj.contains_key("method");
    let has_result = obj.contains_key("result");
    let has_error = obj.contains_key("error");

    if has_id && has_method {
        let method = obj
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Parse("`method` is not a string".into()))?
            .to_owned();
        return Ok(Inbound::PeerRequest {
            id: obj.get("id").cloned().unwrap_or(Value::Null),
            method,
            params: obj.get("params").cloned().unwrap_or_else(|| json!({})),
        });
    }

    if has_id && (has_result || has_error) {
        let outcome = match obj.get("error") {
            Some(err) => Err(err.clone()),
            None => Ok(obj.get("result").cloned().unwrap_or_else(|| json!({}))),
        };
        return Ok(Inbound::Response {
            id: obj.get("id").cloned().unwrap_or(Value::Null),
            outcome,
        });
    }

    if has_method {
        let method = obj
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Parse("`method` is not a string".into()))?
            .to_owned();
        return Ok(Inbound::Notification {
            method,
            params: obj.get("params").cloned().unwrap_or_else(|| json!({})),
        });
    }

    Err(ClientError::Parse("unclassifiable envelope".into()))
}

/// Build an outbound request envelope. The `params` key is omitted entirely
/// when `params` is `None`.
#[must_use]
pub fn request(id: u64, method: &str, params: Option<Value>) -> Value {
    let mut obj = Map::new();
    obj.insert("jsonrpc".into(), json!(JSONRPC_VERSION));
    obj.insert("id".into(), json!(id));
    obj.insert("method".into(), json!(method));
    if let Some(p) = params {
        obj.insert("params".into(), p);
    }
    Value::Object(obj)
}

/// Build an outbound response envelope for a peer-initiated request.
/// The peer's id is echoed back without reinterpretation.
#[must_use]
pub fn response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

/// Build an outbound one-way notification envelope. The `params` key is
/// omitted entirely when `params` is `None`.
#[must_use]
pub fn notification(method: &str, params: Option<Value>) -> Value {
    let mut obj = Map::new();
    obj.insert("jsonrpc".into(), json!(JSONRPC_VERSION));
    obj.insert("method".into(), json!(method));
    if let Some(p) = params {
        obj.insert("params".into(), p);
    }
    Value::Object(obj)
}
