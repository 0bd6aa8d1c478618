//! One-line rendering of a [`LogRecord`]: `[HH:MM:SS.mmm] kind[:subkind][ detail]`.

use chrono::{Local, TimeZone};
use serde_json::{Map, Value};

use crate::record::LogRecord;
use crate::util::{head_chars, truncate_with_ellipsis};

const FALLBACK_DETAIL_MAX: usize = 120;
const VERBOSE_DETAIL_MAX: usize = 300;
const MCP_ARGS_MAX: usize = 200;
const SHELL_CMD_MAX: usize = 50;
const PATH_MAX: usize = 60;
const GREP_FIELD_MAX: usize = 30;

/// Payload keys that never help a human reader.
const INTERNAL_KEYS: &[&str] = &["detail", "$typeName"];

pub fn format_record(record: &LogRecord, verbose: bool) -> String {
    let kind = record.kind.as_deref().unwrap_or("?");
    let kind = match record.subkind.as_deref().filter(|s| !s.is_empty()) {
        Some(sub) => format!("{kind}:{sub}"),
        None => kind.to_string(),
    };

    let detail = if verbose {
        match record.payload.as_ref().filter(|p| is_truthy(p)) {
            Some(p) => format!(" {}", head_chars(&compact_json(p), VERBOSE_DETAIL_MAX)),
            None => String::new(),
        }
    } else {
        format_detail(record)
    };

    format!("[{}] {kind}{detail}", format_clock(record.timestamp))
}

/// Local wall-clock time with millisecond precision, `??:??:??` when unknown.
pub fn format_clock(ts_ms: i64) -> String {
    if ts_ms == 0 {
        return "??:??:??".to_string();
    }
    match Local.timestamp_millis_opt(ts_ms).single() {
        Some(dt) => dt.format("%H:%M:%S%.3f").to_string(),
        None => "??:??:??".to_string(),
    }
}

/// Short human-readable summary of a record's payload, with a leading space.
///
/// Empty when the payload is missing, not an object, or has nothing to show.
pub fn format_detail(record: &LogRecord) -> String {
    let Some(data) = record.payload_object().filter(|d| !d.is_empty()) else {
        return String::new();
    };

    match (record.kind(), record.subkind()) {
        ("serverMessage", "execServerMessage") => exec_server_detail(data),
        ("info", "interactionUpdate") => format!(" {}", field_display(data, "updateCase", "")),
        ("info", "builtRunRequest") => format!(" tools={}", field_display(data, "tools", "0")),
        ("info", "execClientMessage") => format!(" {}", field_display(data, "messageCase", "")),
        _ => fallback_detail(data),
    }
}

fn exec_server_detail(data: &Map<String, Value>) -> String {
    let empty = Map::new();
    let msg = data
        .get("message")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let case = str_field(msg, "case").unwrap_or("");
    let value = msg.get("value").and_then(Value::as_object).unwrap_or(&empty);

    match case {
        "mcpArgs" => {
            let name = str_field(value, "name")
                .filter(|s| !s.is_empty())
                .or_else(|| str_field(value, "toolName").filter(|s| !s.is_empty()))
                .unwrap_or("?");
            let args = match value.get("args").filter(|a| is_truthy(a)) {
                Some(a) => truncate_with_ellipsis(&compact_json(a), MCP_ARGS_MAX),
                None => String::new(),
            };
            format!(" mcp:{name} {args}")
        }
        "grepArgs" => {
            let pattern = str_field(value, "pattern").unwrap_or("");
            let path = head_chars(str_field(value, "path").unwrap_or("."), GREP_FIELD_MAX);
            if pattern.is_empty() {
                format!(" grep@{path}")
            } else {
                format!(" grep:{}@{path}", head_chars(pattern, GREP_FIELD_MAX))
            }
        }
        "shellArgs" => {
            let cmd = str_field(value, "command").unwrap_or("");
            format!(" shell:{}", head_chars(cmd, SHELL_CMD_MAX))
        }
        "readArgs" | "writeArgs" | "lsArgs" | "deleteArgs" => {
            match str_field(value, "path").filter(|p| !p.is_empty()) {
                Some(path) => format!(
                    " {}:{}",
                    case.replace("Args", ""),
                    head_chars(path, PATH_MAX)
                ),
                None => format!(" {case}"),
            }
        }
        other => format!(" {other}"),
    }
}

fn fallback_detail(data: &Map<String, Value>) -> String {
    let filtered: Map<String, Value> = data
        .iter()
        .filter(|(k, v)| !v.is_null() && !INTERNAL_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if filtered.is_empty() {
        return String::new();
    }
    let s = compact_json(&Value::Object(filtered));
    format!(" {}", truncate_with_ellipsis(&s, FALLBACK_DETAIL_MAX))
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// Strings render bare, everything else as compact JSON.
fn field_display(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    match obj.get(key) {
        None => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => compact_json(v),
    }
}

fn compact_json(v: &Value) -> String {
    serde_json::to_string(v).unwrap_or_default()
}

/// Empty containers, empty strings, zero, `false` and `null` carry nothing worth showing.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exec(case: &str, value: Value) -> LogRecord {
        LogRecord::new("serverMessage", Some("execServerMessage"))
            .with_payload(json!({"message": {"case": case, "value": value}}))
    }

    #[test]
    fn unknown_timestamp_renders_placeholder() {
        let line = format_record(&LogRecord::new("info", Some("ready")), false);
        assert_eq!(line, "[??:??:??] info:ready");
    }

    #[test]
    fn clock_has_millisecond_precision() {
        let clock = format_clock(1_700_000_000_123);
        assert_eq!(clock.len(), "HH:MM:SS.mmm".len());
        assert!(clock.ends_with(".123"), "{clock}");
    }

    #[test]
    fn missing_kind_renders_question_mark_and_empty_subkind_is_hidden() {
        let mut rec = LogRecord::default();
        rec.subkind = Some(String::new());
        assert_eq!(format_record(&rec, false), "[??:??:??] ?");
    }

    #[test]
    fn shell_args_detail() {
        assert_eq!(format_detail(&exec("shellArgs", json!({"command": "echo hi"}))), " shell:echo hi");
        let long = "x".repeat(80);
        assert_eq!(
            format_detail(&exec("shellArgs", json!({ "command": long }))),
            format!(" shell:{}", "x".repeat(50))
        );
    }

    #[test]
    fn mcp_args_detail() {
        assert_eq!(
            format_detail(&exec("mcpArgs", json!({"toolName": "search", "args": {"q": "rust"}}))),
            r#" mcp:search {"q":"rust"}"#
        );
        assert_eq!(format_detail(&exec("mcpArgs", json!({}))), " mcp:? ");

        let big = "y".repeat(300);
        let detail = format_detail(&exec("mcpArgs", json!({"name": "w", "args": {"v": big}})));
        assert!(detail.ends_with("..."));
        assert_eq!(detail.chars().count(), " mcp:w ".len() + 200 + 3);
    }

    #[test]
    fn grep_args_detail() {
        assert_eq!(
            format_detail(&exec("grepArgs", json!({"pattern": "fn main", "path": "src"}))),
            " grep:fn main@src"
        );
        assert_eq!(format_detail(&exec("grepArgs", json!({"pattern": ""}))), " grep@.");
    }

    #[test]
    fn path_args_detail() {
        assert_eq!(format_detail(&exec("readArgs", json!({"path": "/a/b.rs"}))), " read:/a/b.rs");
        assert_eq!(format_detail(&exec("deleteArgs", json!({}))), " deleteArgs");
        assert_eq!(format_detail(&exec("fetchArgs", json!({}))), " fetchArgs");
    }

    #[test]
    fn info_details() {
        let rec = LogRecord::new("info", Some("builtRunRequest")).with_payload(json!({"tools": 3}));
        assert_eq!(format_detail(&rec), " tools=3");
        let rec = LogRecord::new("info", Some("builtRunRequest")).with_payload(json!({"model": "m"}));
        assert_eq!(format_detail(&rec), " tools=0");
        let rec = LogRecord::new("info", Some("execClientMessage"))
            .with_payload(json!({"messageCase": "shellResult"}));
        assert_eq!(format_detail(&rec), " shellResult");
        let rec = LogRecord::new("info", Some("interactionUpdate"))
            .with_payload(json!({"updateCase": "toolCallStarted"}));
        assert_eq!(format_detail(&rec), " toolCallStarted");
    }

    #[test]
    fn fallback_strips_nulls_and_internal_keys() {
        let rec = LogRecord::new("session", Some("started")).with_payload(
            json!({"id": "abc", "detail": "x", "$typeName": "T", "gone": null, "n": 1}),
        );
        assert_eq!(format_detail(&rec), r#" {"id":"abc","n":1}"#);

        let rec = LogRecord::new("session", None).with_payload(json!({"detail": "x"}));
        assert_eq!(format_detail(&rec), "");
    }

    #[test]
    fn fallback_is_capped() {
        let rec = LogRecord::new("session", None).with_payload(json!({"blob": "z".repeat(400)}));
        let detail = format_detail(&rec);
        assert_eq!(detail.chars().count(), 1 + 120 + 3);
        assert!(detail.ends_with("..."));
    }

    #[test]
    fn non_object_payload_has_no_detail() {
        let rec = LogRecord::new("session", None).with_payload(json!([1, 2]));
        assert_eq!(format_detail(&rec), "");
    }

    #[test]
    fn verbose_shows_raw_payload_capped() {
        let rec = exec("shellArgs", json!({"command": "ls"}));
        assert_eq!(
            format_record(&rec, true),
            r#"[??:??:??] serverMessage:execServerMessage {"message":{"case":"shellArgs","value":{"command":"ls"}}}"#
        );

        let rec = LogRecord::new("session", None).with_payload(json!({"blob": "z".repeat(400)}));
        let line = format_record(&rec, true);
        assert_eq!(line.chars().count(), "[??:??:??] session ".len() + 300);

        let rec = LogRecord::new("session", None).with_payload(json!({}));
        assert_eq!(format_record(&rec, true), "[??:??:??] session");
    }
}
