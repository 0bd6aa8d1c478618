#![allow(dead_code)]

use devlog_core::api::LogRecord;
use serde_json::{json, Value};

pub fn record(line: Value) -> LogRecord {
    LogRecord::from_value(line).expect("test records are JSON objects")
}

pub fn text_delta(ts: i64, text: &str) -> LogRecord {
    record(json!({"type": "interactionUpdate", "subtype": "textDelta", "ts": ts, "data": {"text": text}}))
}

pub fn delta(ts: i64, subtype: &str) -> LogRecord {
    record(json!({"type": "interactionUpdate", "subtype": subtype, "ts": ts}))
}

pub fn jsonl(records: &[Value]) -> String {
    records
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
