//! Incremental decoder for the subscription body.
//!
//! The service pushes Server-Sent Events: each frame is a run of
//! `field: value` lines terminated by a blank line. Frames named `snapshot`
//! (or unnamed) carry a JSON array of todos in their `data` field. Lines
//! starting with `:` are keep-alive comments.

use crate::error::ApiError;
use crate::types::Snapshot;

const SNAPSHOT_EVENT: &str = "snapshot";

/// Longest line kept while waiting for its terminator.
const DEFAULT_MAX_LINE: usize = 8 * 1024 * 1024;

/// Turns arbitrary byte chunks from the subscription body into snapshots.
#[derive(Debug)]
pub struct SnapshotDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no line terminator.
    scanned: usize,
    max_line: usize,
    /// Set after an overlong line was dropped, until its terminator arrives.
    skipping: bool,
    event: Option<String>,
    data: Vec<String>,
}

impl Default for SnapshotDecoder {
    fn default() -> Self {
        Self::with_max_line(DEFAULT_MAX_LINE)
    }
}

impl SnapshotDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line,
            skipping: false,
            event: None,
            data: Vec::new(),
        }
    }

    /// Feed one chunk and return every snapshot frame it completed.
    ///
    /// A frame whose payload is not valid JSON yields a
    /// `DeserializationError` in its slot; later frames still decode. A line
    /// longer than the limit is dropped along with the frame it belongs to.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<Snapshot, ApiError>> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;

        while let Some(offset) = self.buffer[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            let mut line = &self.buffer[start..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            let line = String::from_utf8_lossy(line).into_owned();
            start = end + 1;
            from = start;

            if std::mem::take(&mut self.skipping) {
                continue;
            }
            if let Some(frame) = self.feed_line(&line) {
                out.push(frame);
            }
        }
        self.buffer.drain(..start);

        if self.buffer.len() > self.max_line {
            self.buffer.clear();
            if !self.skipping {
                tracing::warn!(max = self.max_line, "dropping overlong subscription line");
                self.skipping = true;
                self.event = None;
                self.data.clear();
                out.push(Err(ApiError::DeserializationError(format!(
                    "line exceeds {} bytes",
                    self.max_line
                ))));
            }
        }
        self.scanned = self.buffer.len();
        out
    }

    fn feed_line(&mut self, line: &str) -> Option<Result<Snapshot, ApiError>> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Result<Snapshot, ApiError>> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        if data.is_empty() {
            return None;
        }
        match event.as_deref() {
            None | Some(SNAPSHOT_EVENT) => {}
            Some(other) => {
                tracing::trace!(event = other, "ignoring non-snapshot event");
                return None;
            }
        }
        let payload = data.join("\n");
        Some(serde_json::from_str(&payload).map_err(|e| ApiError::DeserializationError(e.to_string())))
    }
}
