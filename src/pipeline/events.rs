//! Typed notifications emitted by the pipeline.

use std::path::PathBuf;

use crate::ai::SummaryResult;

/// Events emitted by the watch pipeline.
///
/// Carried over a bounded channel so ordering matches the single-flight check
/// discipline.
#[derive(Debug)]
pub enum PipelineEvent {
    /// The watched file does not exist yet; waiting for it to appear.
    AwaitingFile(PathBuf),
    /// New content was detected in the watched file.
    NewContent {
        lines: usize,
        range_start: u64,
        range_end: u64,
    },
    /// A summary was produced and delivered.
    SummaryReady(Box<SummaryResult>),
    /// The file was rotated or truncated; offsets were reset.
    Rotated(PathBuf),
    /// A check cycle failed; its content remains unconsumed.
    CycleFailed(String),
    /// The pipeline stopped. Always the final event.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_event_variants() {
        let awaiting = PipelineEvent::AwaitingFile(PathBuf::from("/tmp/app.log"));
        assert!(matches!(awaiting, PipelineEvent::AwaitingFile(_)));

        let content = PipelineEvent::NewContent {
            lines: 2,
            range_start: 0,
            range_end: 18,
        };
        assert!(matches!(content, PipelineEvent::NewContent { lines: 2, .. }));

        let summary = PipelineEvent::SummaryReady(Box::new(SummaryResult {
            summary_text: "s".to_string(),
            original_length: 10,
            summary_length: 1,
            model_identifier: "m".to_string(),
            produced_at: Utc::now(),
        }));
        assert!(matches!(summary, PipelineEvent::SummaryReady(_)));

        let rotated = PipelineEvent::Rotated(PathBuf::from("/tmp/app.log"));
        assert!(matches!(rotated, PipelineEvent::Rotated(_)));

        assert!(matches!(PipelineEvent::Stopped, PipelineEvent::Stopped));
    }
}
