//! Error capture for the process's own error channels.
//!
//! The interceptor redirects three origins into a single capture file, one
//! timestamped line per event:
//!
//! - `STDERR`: writes through the [`CaptureWriter`] handle,
//! - `LOG`: ERROR-level `tracing` events via the [`CaptureLayer`],
//! - `PANIC`: uncaught panics on any thread via the panic hook.
//!
//! Install and uninstall are idempotent and symmetric: the previous panic
//! hook is saved on install and restored exactly on uninstall.

mod layer;
mod writer;

use std::io::Write;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

pub use layer::CaptureLayer;
pub use writer::CaptureWriter;

/// Origin tag for uncaught panics.
const PANIC_TAG: &str = "PANIC";

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Append one `[ISO-timestamp] [ORIGIN-TAG] message` line to the capture file.
///
/// Failures are swallowed: losing a capture line beats recursing through the
/// error path that produced it. Uses an `O_APPEND` open so writes from
/// different origins interleave safely with the pipeline's truncation.
pub(crate) fn append_line(path: &Path, tag: &str, message: &str) {
    let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let message = message.replace(['\n', '\r'], " ");
    let line = format!("[{ts}] [{tag}] {}\n", message.trim_end());

    let _ = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .and_then(|mut f| f.write_all(line.as_bytes()));
}

/// Captures the process's own error output into a file the pipeline watches.
pub struct ErrorInterceptor {
    path: PathBuf,
    installed: bool,
    prev_hook: Option<PanicHook>,
}

impl ErrorInterceptor {
    /// Create an interceptor for the given capture file.
    ///
    /// Nothing is redirected until [`Self::install`] is called.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            installed: false,
            prev_hook: None,
        }
    }

    /// Path of the capture file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the interceptor is currently installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Install the panic hook and create the capture file if absent.
    ///
    /// Idempotent: a second install is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture file cannot be created.
    pub fn install(&mut self) -> std::io::Result<()> {
        if self.installed {
            return Ok(());
        }

        std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        self.prev_hook = Some(std::panic::take_hook());
        let path = self.path.clone();
        std::panic::set_hook(Box::new(move |info| {
            append_line(&path, PANIC_TAG, &panic_message(info));
        }));

        self.installed = true;
        tracing::debug!(path = %self.path.display(), "Error interceptor installed");
        Ok(())
    }

    /// Restore the previous panic hook.
    ///
    /// Idempotent and symmetric with [`Self::install`]: the exact hook that
    /// was active before install is put back, with no residual wrapping.
    pub fn uninstall(&mut self) {
        if !self.installed {
            return;
        }

        // Drop our hook, then restore the saved one.
        let _ = std::panic::take_hook();
        if let Some(prev) = self.prev_hook.take() {
            std::panic::set_hook(prev);
        }

        self.installed = false;
        tracing::debug!(path = %self.path.display(), "Error interceptor removed");
    }

    /// Writer handle for redirecting error-stream output.
    #[must_use]
    pub fn stderr_writer(&self) -> CaptureWriter {
        CaptureWriter::new(self.path.clone())
    }

    /// Tracing layer capturing ERROR-level events.
    #[must_use]
    pub fn layer(&self) -> CaptureLayer {
        CaptureLayer::new(self.path.clone())
    }
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_string());

    match info.location() {
        Some(location) => format!("{message} at {location}"),
        None => message,
    }
}
