//! Tests for output module

use super::*;
use crate::state::State;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// Message Serialization Tests
// ============================================================================

#[test]
fn test_schema_message_json() {
    let message = Message::schema(
        "accounts",
        json!({"type": "object"}),
        &["id"],
        &["updated_at"],
    );

    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({
            "type": "SCHEMA",
            "stream": "accounts",
            "schema": {"type": "object"},
            "key_properties": ["id"],
            "bookmark_properties": ["updated_at"]
        })
    );
}

#[test]
fn test_record_message_json() {
    let message = Message::Record {
        stream: "plans".to_string(),
        record: json!({"id": "p1", "custom": {"nested": true}}),
        time_extracted: Some(Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap()),
    };

    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["type"], "RECORD");
    assert_eq!(value["stream"], "plans");
    assert_eq!(value["record"], json!({"id": "p1", "custom": {"nested": true}}));
    assert_eq!(value["time_extracted"], "2019-06-01T00:00:00Z");
}

#[test]
fn test_state_message_wraps_full_state() {
    let mut state = State::new();
    state.set_bookmark("accounts", "updated_at", "2019-06-01T00:00:00Z");

    let message = Message::state(&state);
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({
            "type": "STATE",
            "value": {
                "bookmarks": {"accounts": {"updated_at": "2019-06-01T00:00:00Z"}},
                "currently_syncing": null
            }
        })
    );
}

#[test]
fn test_message_round_trip_from_line() {
    let line = r#"{"type":"RECORD","stream":"coupons","record":{"id":"c1"}}"#;
    let message: Message = serde_json::from_str(line).unwrap();

    assert!(message.is_record());
    assert_eq!(message.stream(), Some("coupons"));
}

// ============================================================================
// Sink Tests
// ============================================================================

#[test]
fn test_json_lines_sink_writes_one_line_per_message() {
    let mut sink = JsonLinesSink::new(Vec::new());
    sink.write(&Message::schema("coupons", json!({}), &["id"], &[]))
        .unwrap();
    sink.write(&Message::record("coupons", json!({"id": "c1"})))
        .unwrap();
    sink.write(&Message::state(&State::new())).unwrap();
    sink.flush().unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);

    let types: Vec<String> = lines
        .iter()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["type"].to_string())
        .collect();
    assert_eq!(types, vec!["\"SCHEMA\"", "\"RECORD\"", "\"STATE\""]);
}

#[test]
fn test_memory_sink_accessors() {
    let mut sink = MemorySink::new();
    sink.write(&Message::schema("plans", json!({}), &["id"], &[]))
        .unwrap();
    sink.write(&Message::record("plans", json!({"id": "p1"})))
        .unwrap();
    sink.write(&Message::record("other", json!({"id": "x"})))
        .unwrap();
    sink.write(&Message::state(&State::new())).unwrap();

    assert_eq!(sink.messages().len(), 4);
    assert_eq!(sink.schema_streams(), vec!["plans"]);
    assert_eq!(sink.records("plans"), vec![&json!({"id": "p1"})]);
    assert_eq!(sink.states().len(), 1);
    assert_eq!(
        sink.last_state(),
        Some(&json!({"bookmarks": {}, "currently_syncing": null}))
    );
}
