//! Incremental change detection for append-only log files.
//!
//! Tracks a byte offset into a growing file and classifies each check as
//! growth, rotation, or no change.

mod error;
mod event;
mod offset;
mod reader;

pub use error::WatcherError;
pub use event::ChangeEvent;
pub use offset::{FilePoll, OffsetTracker};
pub use reader::{non_empty_lines, read_range};
