//! AI client module for log summarization.

mod client;
mod prompts;

pub use client::*;
pub use prompts::{format_log_excerpt, SUMMARIZER_SYSTEM_PROMPT};
