//! Line-buffered writer that redirects error-stream output into the capture
//! file.

use std::io::Write;
use std::path::PathBuf;

use super::append_line;

/// Origin tag for error-stream writes.
const STDERR_TAG: &str = "STDERR";

/// A [`Write`] implementation that appends each complete line to the capture
/// file, timestamped and tagged with its origin.
///
/// Wire this wherever stderr-bound output is produced; it buffers partial
/// writes until a newline arrives.
#[derive(Debug)]
pub struct CaptureWriter {
    path: PathBuf,
    buf: Vec<u8>,
}

impl CaptureWriter {
    /// Create a writer appending to the given capture file.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            buf: Vec::new(),
        }
    }

    fn drain_complete_lines(&mut self) {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            let trimmed = text.trim_end();
            if !trimmed.trim().is_empty() {
                append_line(&self.path, STDERR_TAG, trimmed);
            }
        }
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        self.drain_complete_lines();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buf.is_empty() {
            let text = String::from_utf8_lossy(&self.buf).into_owned();
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                append_line(&self.path, STDERR_TAG, trimmed);
            }
            self.buf.clear();
        }
        Ok(())
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
