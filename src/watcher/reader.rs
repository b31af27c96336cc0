//! Byte-range reader for the watched file.
//!
//! Reads an exact span of a growing log file as text.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::error::WatcherError;

/// Read the byte span `[start, end)` from the file as text.
///
/// Invalid UTF-8 sequences are replaced, never a hard failure.
///
/// # Errors
///
/// Returns [`WatcherError::FileMissing`] if the file disappeared between the
/// size check and the read (transient, not fatal to the loop), and
/// [`WatcherError::Io`] for other read failures.
pub async fn read_range(path: &Path, start: u64, end: u64) -> Result<String, WatcherError> {
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WatcherError::FileMissing(path.to_path_buf()));
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(WatcherError::PermissionDenied(path.to_path_buf()));
        }
        Err(e) => return Err(WatcherError::Io(e)),
    };

    file.seek(std::io::SeekFrom::Start(start)).await?;

    let len = usize::try_from(end.saturating_sub(start)).unwrap_or(usize::MAX);
    let mut buf = vec![0u8; len];
    let mut read = 0;
    while read < len {
        let n = file.read(&mut buf[read..]).await?;
        if n == 0 {
            // File shrank under us; keep what we have.
            buf.truncate(read);
            break;
        }
        read += n;
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Split text on line boundaries, trim each line, and drop the empties.
///
/// Original order is preserved.
#[must_use]
pub fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_read_full_range() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "ERROR: X\nERROR: Y\n").unwrap();
        file.flush().unwrap();

        let text = read_range(file.path(), 0, 18).await.unwrap();
        assert_eq!(text, "ERROR: X\nERROR: Y\n");
    }

    #[tokio::test]
    async fn test_read_partial_range() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "old content\nnew content\n").unwrap();
        file.flush().unwrap();

        let text = read_range(file.path(), 12, 24).await.unwrap();
        assert_eq!(text, "new content\n");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let path = std::path::PathBuf::from("/tmp/nonexistent-logsage-98765.log");
        let result = read_range(&path, 0, 10).await;
        assert!(matches!(result, Err(WatcherError::FileMissing(_))));
    }

    #[tokio::test]
    async fn test_read_invalid_utf8_is_replaced() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"ok \xff\xfe bad\n").unwrap();
        file.flush().unwrap();

        let text = read_range(file.path(), 0, 10).await.unwrap();
        assert!(text.starts_with("ok "));
        assert!(text.contains('\u{fffd}'));
    }

    #[tokio::test]
    async fn test_read_range_beyond_eof_is_clamped() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "short\n").unwrap();
        file.flush().unwrap();

        let text = read_range(file.path(), 0, 100).await.unwrap();
        assert_eq!(text, "short\n");
    }

    #[test]
    fn test_non_empty_lines_filters_and_trims() {
        let lines = non_empty_lines("  a  \n\n\t\nb\nc \n");
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_non_empty_lines_empty_input() {
        assert!(non_empty_lines("").is_empty());
        assert!(non_empty_lines("\n\n  \n").is_empty());
    }
}
