//! Unit tests for error display formatting.

use serde_json::json;

use mcpl_client::ClientError;

#[test]
fn display_includes_variant_context() {
    assert_eq!(
        ClientError::Launch("no such file".into()).to_string(),
        "launch: no such file"
    );
    assert_eq!(
        ClientError::Parse("malformed json".into()).to_string(),
        "parse: malformed json"
    );
    assert_eq!(
        ClientError::Timeout("no response to tools/list".into()).to_string(),
        "timeout: no response to tools/list"
    );
    assert_eq!(
        ClientError::TransportClosed("stream ended".into()).to_string(),
        "transport closed: stream ended"
    );
    assert_eq!(ClientError::Io("pipe broke".into()).to_string(), "io: pipe broke");
}

#[test]
fn rpc_display_carries_the_error_payload() {
    let err = ClientError::Rpc(json!({"code": -32601, "message": "method not found"}));
    let text = err.to_string();

    assert!(text.starts_with("rpc error:"), "got: {text}");
    assert!(text.contains("-32601"), "payload must be visible: {text}");
}

#[test]
fn errors_are_std_errors() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&ClientError::Launch("x".into()));
}
