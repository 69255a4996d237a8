//! Unit tests for structural envelope classification and outbound builders.

use serde_json::json;

use mcpl_client::rpc::{classify, notification, request, response, Inbound, JSONRPC_VERSION};
use mcpl_client::ClientError;

// ── Classification ───────────────────────────────────────────────────────────

/// `id` + `result` without `method` classifies as a successful response.
#[test]
fn response_with_result_classifies() {
    let inbound = classify(r#"{"jsonrpc":"2.0","id":4,"result":{"ok":true}}"#).expect("classify");

    match inbound {
        Inbound::Response { id, outcome } => {
            assert_eq!(id, json!(4));
            assert_eq!(outcome, Ok(json!({"ok": true})));
        }
        other => panic!("expected Response, got: {other:?}"),
    }
}

/// `id` + `error` without `method` classifies as a failed response carrying
/// the error payload verbatim.
#[test]
fn response_with_error_classifies() {
    let inbound = classify(r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32601,"message":"nope"}}"#)
        .expect("classify");

    match inbound {
        Inbound::Response { outcome, .. } => {
            assert_eq!(outcome, Err(json!({"code": -32601, "message": "nope"})));
        }
        other => panic!("expected Response, got: {other:?}"),
    }
}

/// `id` + `method` classifies as a peer-initiated request requiring a reply.
#[test]
fn peer_request_classifies() {
    let inbound =
        classify(r#"{"jsonrpc":"2.0","id":7,"method":"push/event","params":{"x":1}}"#)
            .expect("classify");

    match inbound {
        Inbound::PeerRequest { id, method, params } => {
            assert_eq!(id, json!(7));
            assert_eq!(method, "push/event");
            assert_eq!(params, json!({"x": 1}));
        }
        other => panic!("expected PeerRequest, got: {other:?}"),
    }
}

/// Classification is structural: `method` wins even when a `result` field is
/// also present, so the envelope is treated as a peer request.
#[test]
fn method_takes_precedence_over_result() {
    let inbound = classify(r#"{"jsonrpc":"2.0","id":7,"method":"push/event","result":{}}"#)
        .expect("classify");

    assert!(
        matches!(inbound, Inbound::PeerRequest { .. }),
        "id + method must classify as a peer request, got: {inbound:?}"
    );
}

/// Peer-chosen ids are preserved verbatim, including non-numeric ones.
#[test]
fn peer_request_string_id_is_preserved() {
    let inbound = classify(r#"{"jsonrpc":"2.0","id":"req-abc","method":"custom/op"}"#)
        .expect("classify");

    match inbound {
        Inbound::PeerRequest { id, params, .. } => {
            assert_eq!(id, json!("req-abc"));
            assert_eq!(params, json!({}), "absent params must default to an empty object");
        }
        other => panic!("expected PeerRequest, got: {other:?}"),
    }
}

/// `method` without `id` classifies as a one-way notification.
#[test]
fn notification_classifies() {
    let inbound = classify(r#"{"jsonrpc":"2.0","method":"notifications/progress","params":{"p":1}}"#)
        .expect("classify");

    match inbound {
        Inbound::Notification { method, params } => {
            assert_eq!(method, "notifications/progress");
            assert_eq!(params, json!({"p": 1}));
        }
        other => panic!("expected Notification, got: {other:?}"),
    }
}

/// Invalid JSON returns a parse error.
#[test]
fn malformed_json_is_a_parse_error() {
    let result = classify("not-valid-json{{{");

    match result {
        Err(ClientError::Parse(msg)) => assert!(
            msg.contains("malformed json"),
            "error must mention 'malformed json', got: {msg}"
        ),
        other => panic!("expected Err(ClientError::Parse), got: {other:?}"),
    }
}

/// A JSON value that is not an object cannot be an envelope.
#[test]
fn non_object_is_a_parse_error() {
    assert!(matches!(classify("[1,2,3]"), Err(ClientError::Parse(_))));
    assert!(matches!(classify("42"), Err(ClientError::Parse(_))));
}

/// An object fitting none of the three envelope shapes is rejected.
#[test]
fn unclassifiable_envelope_is_a_parse_error() {
    let result = classify(r#"{"jsonrpc":"2.0","id":5}"#);

    match result {
        Err(ClientError::Parse(msg)) => assert!(
            msg.contains("unclassifiable"),
            "error must mention 'unclassifiable', got: {msg}"
        ),
        other => panic!("expected Err(ClientError::Parse), got: {other:?}"),
    }
}

// ── Outbound builders ────────────────────────────────────────────────────────

/// Requests carry the JSON-RPC version, the id, and the method.
#[test]
fn request_builder_shape() {
    let msg = request(3, "tools/call", Some(json!({"name": "lobby_status"})));

    assert_eq!(msg["jsonrpc"], JSONRPC_VERSION);
    assert_eq!(msg["id"], 3);
    assert_eq!(msg["method"], "tools/call");
    assert_eq!(msg["params"]["name"], "lobby_status");
}

/// The `params` key is omitted entirely when no params are given.
#[test]
fn request_builder_omits_absent_params() {
    let msg = request(1, "tools/list", None);

    assert!(
        msg.get("params").is_none(),
        "params must be omitted, not null: {msg}"
    );
}

/// Replies echo the peer's id without reinterpretation.
#[test]
fn response_builder_echoes_peer_id() {
    let msg = response(&json!("req-abc"), json!({"accepted": true}));

    assert_eq!(msg["id"], "req-abc");
    assert_eq!(msg["result"]["accepted"], true);
    assert!(msg.get("method").is_none());
}

/// Notifications carry no id.
#[test]
fn notification_builder_has_no_id() {
    let msg = notification("notifications/initialized", None);

    assert_eq!(msg["method"], "notifications/initialized");
    assert!(msg.get("id").is_none());
    assert!(msg.get("params").is_none());
}

/// One serialized envelope never spans multiple lines.
#[test]
fn envelopes_serialize_to_a_single_line() {
    let msg = request(9, "channels/publish", Some(json!({"channelId": "game:a"})));
    assert!(!msg.to_string().contains('\n'));
}
