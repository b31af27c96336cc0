//! Tracing layer that copies application error events into the capture file.

use std::fmt;
use std::path::PathBuf;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::append_line;

/// Origin tag for explicit application error-logging calls.
const LOG_TAG: &str = "LOG";

/// A `tracing` layer appending every ERROR-level event to the capture file.
///
/// Register it alongside the normal fmt layer; it only observes events and
/// never affects the rest of the subscriber stack.
#[derive(Debug)]
pub struct CaptureLayer {
    path: PathBuf,
}

impl CaptureLayer {
    /// Create a layer appending to the given capture file.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if !visitor.message.is_empty() {
            append_line(&self.path, LOG_TAG, &visitor.message);
        }
    }
}

/// Extracts the `message` field of an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}
