//! System prompts for the log summarizer.

/// Maximum bytes of raw log text included in one request.
const MAX_EXCERPT_BYTES: usize = 16 * 1024;

/// System prompt for the AI summarizer.
pub const SUMMARIZER_SYSTEM_PROMPT: &str = r"You are a log analysis assistant.

You receive a fresh excerpt from an application's error log. Your job is to:
1. Summarize what went wrong in one or two sentences.
2. Identify the most likely root cause.
3. Suggest a concrete fix the developer can try.

Be concise. Do not repeat the raw log lines back. If the excerpt contains
several unrelated errors, address the most severe one first.
";

/// Format a raw log excerpt as the user message for the summarizer.
///
/// Long excerpts keep their tail: the newest lines are the most relevant.
#[must_use]
pub fn format_log_excerpt(raw: &str) -> String {
    let excerpt = if raw.len() > MAX_EXCERPT_BYTES {
        let mut start = raw.len() - MAX_EXCERPT_BYTES;
        while !raw.is_char_boundary(start) {
            start += 1;
        }
        &raw[start..]
    } else {
        raw
    };

    format!("New log output:\n\n{excerpt}")
}
