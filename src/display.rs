//! Colored CLI display utilities for watcher output.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::ai::SummaryResult;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum length, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let mut end = max_len - 3;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Print the waiting-for-file notice.
pub fn print_awaiting(path: &std::path::Path) {
    println!(
        "{} {} waiting for {}",
        timestamp().dimmed(),
        "[WATCH]".blue().bold(),
        path.display()
    );
    let _ = io::stdout().flush();
}

/// Print a new-content notice.
pub fn print_new_content(lines: usize, bytes: u64) {
    println!(
        "{} {} {lines} new line(s), {bytes} byte(s)",
        timestamp().dimmed(),
        "[CHANGE]".cyan().bold()
    );
    let _ = io::stdout().flush();
}

/// Print a produced summary with its fix suggestion.
pub fn print_summary(summary: &SummaryResult) {
    println!(
        "{} {} {} ({} -> {} bytes)",
        timestamp().dimmed(),
        "[SUMMARY]".magenta().bold(),
        summary.model_identifier.cyan(),
        summary.original_length,
        summary.summary_length
    );
    println!("{}", summary.summary_text);
    let _ = io::stdout().flush();
}

/// Print a rotation notice.
pub fn print_rotation(path: &std::path::Path) {
    println!(
        "{} {} {} rotated, resuming from start",
        timestamp().dimmed(),
        "[ROTATE]".yellow().bold(),
        path.display()
    );
    let _ = io::stdout().flush();
}

/// Print a failed-cycle notice.
pub fn print_cycle_failed(reason: &str) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[RETRY]".yellow().bold(),
        truncate(reason, DEFAULT_MAX_LEN * 2).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stdout().flush();
}

/// Print the stop notice.
pub fn print_stopped() {
    println!(
        "{} {} watcher stopped",
        timestamp().dimmed(),
        "[WATCH]".blue().bold()
    );
    let _ = io::stdout().flush();
}
