//! Byte-offset tracking for a growing (and possibly rotated) file.
//!
//! The tracker owns the `[last_offset, last_size]` pair for one watched file
//! and classifies each poll as growth, rotation, or no change. The offset is
//! never advanced speculatively: growth returns a [`ChangeEvent`] and the
//! caller commits the offset only after the content was handed off.

use std::path::{Path, PathBuf};

use super::error::WatcherError;
use super::event::ChangeEvent;
use super::reader;

/// Outcome of a single poll of the watched file.
#[derive(Debug)]
pub enum FilePoll {
    /// File size is unchanged since the last poll.
    Unchanged,
    /// File grew; the new byte range was read into the event.
    Grew(ChangeEvent),
    /// File shrank (rotation or truncation). Offsets were reset to zero and
    /// nothing was read this cycle; capture resumes from byte 0 next cycle.
    Rotated,
}

/// Tracks the read position in a single append-only log file.
#[derive(Debug)]
pub struct OffsetTracker {
    /// Path to the watched file.
    path: PathBuf,
    /// Byte offset of consumed content. Only advances via [`Self::commit`].
    last_offset: u64,
    /// File size observed at the last poll. Always `>= last_offset`.
    last_size: u64,
}

impl OffsetTracker {
    /// Create a tracker starting at offset 0 (beginning of file).
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_offset: 0,
            last_size: 0,
        }
    }

    /// Get the path being tracked.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the last committed (consumed) content.
    #[must_use]
    pub fn last_offset(&self) -> u64 {
        self.last_offset
    }

    /// File size observed at the last poll.
    #[must_use]
    pub fn last_size(&self) -> u64 {
        self.last_size
    }

    /// Initialize both offsets to the file's current size.
    ///
    /// Only future appends are observed; pre-existing content is never
    /// replayed.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::FileMissing`] if the file does not exist.
    pub async fn start_at_end(&mut self) -> Result<(), WatcherError> {
        let size = self.file_size().await?;
        self.last_offset = size;
        self.last_size = size;
        Ok(())
    }

    /// Poll the file once and classify what happened since the last poll.
    ///
    /// On growth this reads the new byte range `[last_offset, size)` and
    /// advances `last_size`, but leaves `last_offset` untouched until the
    /// caller calls [`Self::commit`]. A failed hand-off therefore re-reads a
    /// superset range on the next growth.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::FileMissing`] if the file vanished (transient)
    /// or [`WatcherError::Io`] for other stat/read failures.
    pub async fn poll(&mut self) -> Result<FilePoll, WatcherError> {
        let size = self.file_size().await?;

        // Shrink means rotation or truncation. The rotated tail cannot be
        // recovered; reading now would risk a half-written file, so skip this
        // cycle and resume from byte 0 on the next one.
        if size < self.last_size {
            tracing::warn!(
                path = %self.path.display(),
                old_size = self.last_size,
                new_size = size,
                "File rotated or truncated, resetting offsets"
            );
            self.last_offset = 0;
            self.last_size = 0;
            return Ok(FilePoll::Rotated);
        }

        if size == self.last_size {
            return Ok(FilePoll::Unchanged);
        }

        let start = self.last_offset;
        let text = reader::read_range(&self.path, start, size).await?;
        self.last_size = size;
        Ok(FilePoll::Grew(ChangeEvent::new(text, start, size)))
    }

    /// Mark content up to `range_end` as consumed.
    ///
    /// Called only after the pipeline successfully handed the content off.
    pub fn commit(&mut self, range_end: u64) {
        self.last_offset = range_end.min(self.last_size);
    }

    /// Reset both offsets to the beginning of the file.
    pub fn reset(&mut self) {
        self.last_offset = 0;
        self.last_size = 0;
    }

    async fn file_size(&self) -> Result<u64, WatcherError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(WatcherError::FileMissing(self.path.clone()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(WatcherError::PermissionDenied(self.path.clone()))
            }
            Err(e) => Err(WatcherError::Io(e)),
        }
    }
}
