use crate::classify::{classify, Classification};
use crate::format::{format_clock, format_record};
use crate::record::LogRecord;
use crate::util::{escape_newlines, truncate_with_ellipsis};

const TEXT_LINE_MAX: usize = 300;

/// Running text for consecutive `textDelta` fragments.
#[derive(Debug, Default)]
struct TextAccumulator {
    buffer: String,
    timestamp: i64,
}

impl TextAccumulator {
    fn push(&mut self, timestamp: i64, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.buffer.is_empty() {
            self.timestamp = timestamp;
        }
        self.buffer.push_str(text);
    }

    fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let text = truncate_with_ellipsis(&escape_newlines(&self.buffer), TEXT_LINE_MAX);
        let line = format!("[{}] text: {text}", format_clock(self.timestamp));
        self.buffer.clear();
        self.timestamp = 0;
        Some(line)
    }
}

/// Single-pass reducer from records to display lines.
///
/// Noise never flushes pending text, so a heartbeat arriving mid-message
/// does not split the assistant text across lines.
#[derive(Debug, Default)]
pub struct Coalescer {
    verbose: bool,
    text: TextAccumulator,
}

impl Coalescer {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            text: TextAccumulator::default(),
        }
    }

    /// Feeds one record, returning the lines it completes (zero, one or two).
    pub fn push(&mut self, record: &LogRecord) -> Vec<String> {
        match classify(record, self.verbose) {
            Classification::TextDeltaFragment { timestamp, text } => {
                self.text.push(timestamp, &text);
                return Vec::new();
            }
            Classification::Noise | Classification::SkippedDelta => return Vec::new(),
            Classification::Signal => {}
        }

        let mut out = Vec::with_capacity(2);
        out.extend(self.text.flush());
        out.push(format_record(record, self.verbose));
        out
    }

    /// Flushes any pending text at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        self.text.flush()
    }
}

pub fn coalesce<'a, I>(records: I, verbose: bool) -> Vec<String>
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mut coalescer = Coalescer::new(verbose);
    let mut out = Vec::new();
    for record in records {
        out.extend(coalescer.push(record));
    }
    out.extend(coalescer.finish());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(ts: i64, t: &str) -> LogRecord {
        LogRecord::new("interactionUpdate", Some("textDelta"))
            .with_timestamp(ts)
            .with_payload(json!({ "text": t }))
    }

    #[test]
    fn flush_on_empty_buffer_is_noop() {
        let mut c = Coalescer::new(false);
        assert_eq!(c.finish(), None);
        assert_eq!(c.push(&text(1, "")), Vec::<String>::new());
        assert_eq!(c.finish(), None);
    }

    #[test]
    fn timestamp_is_from_first_fragment() {
        let out = coalesce(&[text(1_000, "a"), text(9_000, "b")], false);
        assert_eq!(out, vec![format!("[{}] text: ab", format_clock(1_000))]);
    }

    #[test]
    fn empty_fragment_does_not_claim_timestamp() {
        let out = coalesce(&[text(1_000, ""), text(2_000, "x")], false);
        assert_eq!(out, vec![format!("[{}] text: x", format_clock(2_000))]);
    }

    #[test]
    fn newlines_are_escaped_and_text_capped() {
        let out = coalesce(&[text(0, "one\ntwo")], false);
        assert_eq!(out, vec!["[??:??:??] text: one\\ntwo".to_string()]);

        let long = "w".repeat(350);
        let out = coalesce(&[text(0, &long)], false);
        assert_eq!(out[0], format!("[??:??:??] text: {}...", "w".repeat(300)));
    }

    #[test]
    fn signal_flushes_before_itself() {
        let mut c = Coalescer::new(false);
        assert!(c.push(&text(0, "hi")).is_empty());
        let lines = c.push(&LogRecord::new("info", Some("done")));
        assert_eq!(
            lines,
            vec![
                "[??:??:??] text: hi".to_string(),
                "[??:??:??] info:done".to_string()
            ]
        );
        assert_eq!(c.finish(), None);
    }
}
