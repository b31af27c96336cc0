//! Change event emitted when new content is detected.

use chrono::{DateTime, Utc};

/// A batch of newly appended content read from the watched file.
///
/// Immutable once constructed; consumed exactly once by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Raw text of the new byte range, lossy-decoded as UTF-8.
    pub raw_text: String,
    /// Non-empty trimmed lines of `raw_text`, in original order.
    pub lines: Vec<String>,
    /// Byte offset where the new region starts (inclusive).
    pub range_start: u64,
    /// Byte offset where the new region ends (exclusive).
    pub range_end: u64,
    /// When the change was observed.
    pub observed_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Build an event from a raw byte-range read.
    #[must_use]
    pub fn new(raw_text: String, range_start: u64, range_end: u64) -> Self {
        let lines = super::reader::non_empty_lines(&raw_text);
        Self {
            raw_text,
            lines,
            range_start,
            range_end,
            observed_at: Utc::now(),
        }
    }

    /// Number of bytes in the observed range.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        self.range_end - self.range_start
    }

    /// Whether the range contained only whitespace or empty lines.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.lines.is_empty()
    }
}
