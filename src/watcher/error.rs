//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur during file watching.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Watched file does not exist (yet, or anymore).
    ///
    /// Transient: the loop re-enters the awaiting state and retries.
    #[error("Watched file missing: {0}")]
    FileMissing(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error.
    #[error("Channel closed")]
    ChannelClosed,
}

impl WatcherError {
    /// Whether the error is a transient condition that the watch loop can
    /// recover from by waiting for the file to reappear.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::FileMissing(_))
    }
}
