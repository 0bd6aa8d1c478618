//! Status events: one `{op, ...fields}` object per helper call, delivered to a sink.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};

/// Display-bundle key the notebook front end renders status events under.
pub const STATUS_MIME: &str = "application/x-omp-status";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub op: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StatusEvent {
    /// `fields` is expected to be a JSON object; anything else is dropped.
    pub fn new(op: &str, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            op: op.to_string(),
            fields,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_error(&self) -> bool {
        self.fields.contains_key("error")
    }
}

pub trait StatusSink: Send + Sync {
    fn emit(&self, event: &StatusEvent);
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<StatusEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<StatusEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn ops(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.op).collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl StatusSink for MemorySink {
    fn emit(&self, event: &StatusEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Writes each event as one display-bundle JSON line: `{"<STATUS_MIME>": {...}}`.
pub struct DisplaySink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> DisplaySink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> StatusSink for DisplaySink<W> {
    fn emit(&self, event: &StatusEvent) {
        let mut bundle = Map::new();
        bundle.insert(
            STATUS_MIME.to_string(),
            serde_json::to_value(event).unwrap_or(Value::Null),
        );
        let Ok(line) = serde_json::to_string(&Value::Object(bundle)) else {
            return;
        };
        let mut w = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(w, "{line}").and_then(|_| w.flush()) {
            tracing::warn!(op = %event.op, error = %e, "status event dropped");
        }
    }
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn emit(&self, event: &StatusEvent) {
        let fields = serde_json::to_string(&event.fields).unwrap_or_default();
        tracing::debug!(target: "devlog.status", op = %event.op, %fields);
    }
}
