use std::path::Path;

use thiserror::Error;

use crate::error::ViewerError;
use crate::record::LogRecord;
use crate::util::head_chars;

const PREVIEW_MAX: usize = 100;

/// A line that could not be decoded into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[PARSE ERROR] {preview}")]
pub struct ParseError {
    /// 1-based line number within the file.
    pub line_no: usize,
    /// First 100 characters of the raw line.
    pub preview: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub records: Vec<LogRecord>,
    pub errors: Vec<ParseError>,
}

/// Reads a JSONL file to EOF.
///
/// `last > 0` keeps only the final `last` raw lines before parsing.
pub fn read_batch(path: &Path, last: usize) -> Result<ParsedBatch, ViewerError> {
    let bytes = std::fs::read(path).map_err(|e| ViewerError::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    let batch = parse_lines(&text, last);
    tracing::debug!(
        path = %path.display(),
        records = batch.records.len(),
        errors = batch.errors.len(),
        "batch parsed"
    );
    Ok(batch)
}

pub fn parse_lines(text: &str, last: usize) -> ParsedBatch {
    let body = text.trim();
    if body.is_empty() {
        return ParsedBatch::default();
    }
    let lines: Vec<&str> = body.split('\n').collect();
    let skip = if last > 0 {
        lines.len().saturating_sub(last)
    } else {
        0
    };

    let mut batch = ParsedBatch::default();
    for (idx, line) in lines.iter().enumerate().skip(skip) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match LogRecord::parse_line(line) {
            Ok(rec) => batch.records.push(rec),
            Err(e) => {
                let err = ParseError {
                    line_no: idx + 1,
                    preview: head_chars(line, PREVIEW_MAX).to_string(),
                    message: e.to_string(),
                };
                tracing::debug!(line_no = err.line_no, error = %err.message, "skipping malformed record");
                batch.errors.push(err);
            }
        }
    }
    batch
}
