use serde_json::{Map, Value};

/// One parsed JSON object from the debug event stream.
///
/// Every field is optional on the wire; accessors default missing fields so
/// classification never fails on a sparse record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    /// Epoch milliseconds (`ts`). `0` means unknown.
    pub timestamp: i64,
    /// `type`, kept as `None` when absent or not a string.
    pub kind: Option<String>,
    /// `subtype`
    pub subkind: Option<String>,
    /// `data`
    pub payload: Option<Value>,
}

impl LogRecord {
    pub fn new(kind: &str, subkind: Option<&str>) -> Self {
        Self {
            timestamp: 0,
            kind: Some(kind.to_string()),
            subkind: subkind.map(str::to_string),
            payload: None,
        }
    }

    pub fn with_timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds a record from an already-decoded JSON value.
    ///
    /// Returns `None` when the value is not an object.
    pub fn from_value(v: Value) -> Option<Self> {
        let Value::Object(mut obj) = v else {
            return None;
        };

        let timestamp = match obj.get("ts") {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            _ => 0,
        };
        let kind = take_string(&mut obj, "type");
        let subkind = take_string(&mut obj, "subtype");
        let payload = obj.remove("data").filter(|d| !d.is_null());

        Some(Self {
            timestamp,
            kind,
            subkind,
            payload,
        })
    }

    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        let v: Value = serde_json::from_str(line)?;
        match Self::from_value(v) {
            Some(rec) => Ok(rec),
            None => Err(serde::de::Error::custom("record is not a JSON object")),
        }
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }

    pub fn subkind(&self) -> &str {
        self.subkind.as_deref().unwrap_or("")
    }

    /// Payload as a JSON object, if it is one.
    pub fn payload_object(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref().and_then(Value::as_object)
    }

    pub fn is(&self, kind: &str, subkind: &str) -> bool {
        self.kind() == kind && self.subkind() == subkind
    }
}

fn take_string(obj: &mut Map<String, Value>, key: &str) -> Option<String> {
    match obj.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
