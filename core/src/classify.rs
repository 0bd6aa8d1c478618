use serde_json::Value;

use crate::record::LogRecord;

/// Streaming deltas that are dropped outright.
pub const SKIP_DELTAS: &[&str] = &["tokenDelta", "partialToolCall", "heartbeat", "thinkingDelta"];

/// Streaming deltas merged into a single line.
pub const COALESCE_DELTAS: &[&str] = &["textDelta"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Redundant or high-volume traffic; hidden unless verbose.
    Noise,
    /// A chunk of running assistant text.
    TextDeltaFragment { timestamp: i64, text: String },
    /// A delta type that never renders on its own.
    SkippedDelta,
    /// Rendered as one line.
    Signal,
}

/// Classifies one record.
///
/// Text deltas are recognised before the verbose check, so verbose output
/// still merges consecutive fragments into one line.
pub fn classify(record: &LogRecord, verbose: bool) -> Classification {
    if record.is("interactionUpdate", "textDelta") {
        return Classification::TextDeltaFragment {
            timestamp: record.timestamp,
            text: extract_text_delta(record).unwrap_or_default().to_string(),
        };
    }

    if verbose {
        return Classification::Signal;
    }

    if is_structural_noise(record) {
        return Classification::Noise;
    }

    if delta_type(record).is_some_and(|d| SKIP_DELTAS.contains(&d)) {
        return Classification::SkippedDelta;
    }

    Classification::Signal
}

/// True when the record should be dropped without flushing pending text.
pub fn is_noise(record: &LogRecord, verbose: bool) -> bool {
    matches!(
        classify(record, verbose),
        Classification::Noise | Classification::SkippedDelta
    )
}

/// Delta type of a streaming update, direct or wrapped in `info:interactionUpdate`.
pub fn delta_type(record: &LogRecord) -> Option<&str> {
    match record.kind() {
        "interactionUpdate" => {
            let sub = record.subkind();
            (SKIP_DELTAS.contains(&sub) || COALESCE_DELTAS.contains(&sub)).then_some(sub)
        }
        "info" if record.subkind() == "interactionUpdate" => record
            .payload_object()?
            .get("updateCase")
            .and_then(Value::as_str),
        _ => None,
    }
}

/// Text carried by a `textDelta`, either at `data.text` or `data.message.value.text`.
pub fn extract_text_delta(record: &LogRecord) -> Option<&str> {
    let data = record.payload_object()?;
    if let Some(text) = data.get("text") {
        return text.as_str();
    }
    data.get("message")
        .and_then(|m| m.get("value"))
        .and_then(|v| v.get("text"))
        .and_then(Value::as_str)
}

fn is_structural_noise(record: &LogRecord) -> bool {
    match (record.kind(), record.subkind()) {
        // The inner update is logged separately.
        ("serverMessage", "interactionUpdate") => true,
        ("kvClient", _) | ("serverMessage", "kvServerMessage") => true,
        ("serverMessage", "conversationCheckpointUpdate") => true,
        // Same content as info:execClientMessage.
        ("execClient", "requestContextResult") => true,
        _ => false,
    }
}
