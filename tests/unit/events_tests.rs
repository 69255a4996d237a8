//! Unit tests for the event buffers and passive query helpers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use mcpl_client::session::events::{match_incoming, wait_for_match, EventBuffers};

// ── Snapshot slicing ─────────────────────────────────────────────────────────

/// Events appended before the snapshot are excluded from the post-snapshot
/// slice; events appended after are included.
#[test]
fn snapshot_excludes_preexisting_events() {
    let buffers = EventBuffers::new();
    buffers.push_event(json!({"seq": 1}));
    buffers.push_event(json!({"seq": 2}));
    buffers.push_incoming(json!({"seq": 10}));

    let snap = buffers.snapshot();

    buffers.push_event(json!({"seq": 3}));
    buffers.push_incoming(json!({"seq": 11}));

    assert_eq!(buffers.push_events_from(snap.push_events), vec![json!({"seq": 3})]);
    assert_eq!(buffers.incoming_from(snap.incoming), vec![json!({"seq": 11})]);
}

/// A snapshot index at or past the buffer end yields an empty slice.
#[test]
fn slice_past_end_is_empty() {
    let buffers = EventBuffers::new();
    buffers.push_event(json!({"seq": 1}));

    assert!(buffers.push_events_from(1).is_empty());
    assert!(buffers.push_events_from(5).is_empty());
}

// ── Polling waits ────────────────────────────────────────────────────────────

/// Entries already buffered before the wait begins are found on the first
/// scan, even with a zero deadline.
#[tokio::test]
async fn wait_finds_preexisting_entry() {
    let buffers = EventBuffers::new();
    buffers.push_incoming(json!({"tag": "early"}));

    let found = wait_for_match(&buffers, Duration::ZERO, |entries| {
        entries.iter().find(|e| e["tag"] == "early").cloned()
    })
    .await;

    assert_eq!(found, Some(json!({"tag": "early"})));
}

/// The wait gives up once the deadline elapses without a match.
#[tokio::test]
async fn wait_times_out_without_match() {
    let buffers = EventBuffers::new();

    let found = wait_for_match(&buffers, Duration::from_millis(50), |entries| {
        entries.first().cloned()
    })
    .await;

    assert_eq!(found, None);
}

/// An entry appended while the wait is polling is picked up by a later scan.
#[tokio::test]
async fn wait_picks_up_entry_appended_during_wait() {
    let buffers = Arc::new(EventBuffers::new());

    let appender = {
        let buffers = Arc::clone(&buffers);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            buffers.push_incoming(json!({"tag": "late"}));
        })
    };

    let found = wait_for_match(&buffers, Duration::from_secs(3), |entries| {
        entries.iter().find(|e| e["tag"] == "late").cloned()
    })
    .await;

    assert_eq!(found, Some(json!({"tag": "late"})));
    appender.await.expect("appender task");
}

// ── Incoming-event matching ──────────────────────────────────────────────────

/// A text content block whose payload parses as JSON with the requested
/// `type` is returned parsed.
#[test]
fn match_incoming_parses_typed_payload() {
    let entry = json!({
        "channelId": "game:a",
        "messages": [
            {"content": [{"type": "text", "text": "{\"type\":\"init\",\"frame\":0}"}]}
        ]
    });

    let matched = match_incoming(&entry, "init");
    assert_eq!(matched, Some(json!({"type": "init", "frame": 0})));
}

/// Payloads of a different type do not match.
#[test]
fn match_incoming_ignores_other_types() {
    let entry = json!({
        "messages": [
            {"content": [{"type": "text", "text": "{\"type\":\"update\"}"}]}
        ]
    });

    assert_eq!(match_incoming(&entry, "init"), None);
}

/// Unparseable text falls back to substring matching and wraps the raw text.
#[test]
fn match_incoming_falls_back_to_raw_text() {
    let entry = json!({
        "messages": [
            {"content": [{"type": "text", "text": "log prefix \"type\":\"init\" trailing junk"}]}
        ]
    });

    let matched = match_incoming(&entry, "init");
    assert_eq!(
        matched,
        Some(json!({"_raw": "log prefix \"type\":\"init\" trailing junk"}))
    );
}

/// Entries without the expected message structure are skipped silently.
#[test]
fn match_incoming_tolerates_missing_structure() {
    assert_eq!(match_incoming(&json!({}), "init"), None);
    assert_eq!(match_incoming(&json!({"messages": []}), "init"), None);
    assert_eq!(
        match_incoming(&json!({"messages": [{"content": [{"type": "image"}]}]}), "init"),
        None
    );
}
