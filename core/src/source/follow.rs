use std::future::Future;
use std::io::SeekFrom;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::Instant;

use crate::coalesce::coalesce;
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::record::LogRecord;

#[derive(Debug, Clone)]
pub struct FollowOptions {
    pub verbose: bool,
    /// Sleep between polls when no new data arrived.
    pub poll_interval: Duration,
    /// Maximum age of buffered records before they are printed.
    pub flush_interval: Duration,
    /// Buffered record count that forces an early flush.
    pub batch_threshold: usize,
}

impl FollowOptions {
    pub fn from_config(cfg: &ViewerConfig, verbose: bool) -> Self {
        Self {
            verbose,
            poll_interval: Duration::from_millis(cfg.poll_interval_ms),
            flush_interval: Duration::from_millis(cfg.flush_interval_ms),
            batch_threshold: cfg.batch_threshold,
        }
    }
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default(), false)
    }
}

/// Buffers appended bytes into records and decides when a batch is due.
#[derive(Debug)]
pub struct FollowBuffer {
    opts: FollowOptions,
    partial: Vec<u8>,
    records: Vec<LogRecord>,
    last_emit: Instant,
}

impl FollowBuffer {
    pub fn new(opts: FollowOptions, now: Instant) -> Self {
        Self {
            opts,
            partial: Vec::new(),
            records: Vec::new(),
            last_emit: now,
        }
    }

    /// Appends raw bytes; only newline-terminated lines are parsed.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.partial.extend_from_slice(bytes);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match LogRecord::parse_line(line) {
                Ok(rec) => self.records.push(rec),
                Err(e) => tracing::debug!(error = %e, "follow: dropping malformed line"),
            }
        }
    }

    pub fn buffered(&self) -> usize {
        self.records.len()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        !self.records.is_empty()
            && (now.duration_since(self.last_emit) > self.opts.flush_interval
                || self.records.len() > self.opts.batch_threshold)
    }

    /// Coalesces and clears the buffered records.
    pub fn take_lines(&mut self, now: Instant) -> Vec<String> {
        let lines = coalesce(&self.records, self.opts.verbose);
        tracing::debug!(records = self.records.len(), lines = lines.len(), "follow: batch flushed");
        self.records.clear();
        self.last_emit = now;
        lines
    }
}

/// Tails `path` from its current end, calling `emit` for every rendered line
/// until `shutdown` resolves. Records still buffered at shutdown are flushed.
pub async fn follow_file<F, S>(
    path: &Path,
    opts: FollowOptions,
    mut emit: F,
    shutdown: S,
) -> Result<(), ViewerError>
where
    F: FnMut(&str),
    S: Future<Output = ()>,
{
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ViewerError::io(path, e))?;
    file.seek(SeekFrom::End(0))
        .await
        .map_err(|e| ViewerError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let poll_interval = opts.poll_interval;
    let mut buffer = FollowBuffer::new(opts, Instant::now());
    let mut chunk = Vec::with_capacity(8 * 1024);
    tokio::pin!(shutdown);

    tracing::debug!(path = %path.display(), "follow: started");

    loop {
        chunk.clear();
        let n = tokio::select! {
            _ = &mut shutdown => break,
            r = reader.read_until(b'\n', &mut chunk) => r.map_err(|e| ViewerError::io(path, e))?,
        };
        if n > 0 {
            buffer.push_bytes(&chunk);
        }

        let now = Instant::now();
        if buffer.is_due(now) {
            for line in buffer.take_lines(now) {
                emit(&line);
            }
        } else if n == 0 {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    if buffer.buffered() > 0 {
        for line in buffer.take_lines(Instant::now()) {
            emit(&line);
        }
    }
    tracing::debug!(path = %path.display(), "follow: stopped");
    Ok(())
}
