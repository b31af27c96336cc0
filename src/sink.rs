//! Fix-suggestion sink.
//!
//! The sink receives each produced summary together with the raw log excerpt.
//! Delivery is best-effort: a sink failure is logged at the boundary and
//! never blocks the pipeline or offset advancement.

use async_trait::async_trait;
use thiserror::Error;

use crate::ai::SummaryResult;

/// Errors from sink delivery. Caught and logged, never propagated upward.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Consumer of produced summaries.
#[async_trait]
pub trait SuggestionSink: Send + Sync {
    /// Deliver a summary and the raw text it was produced from.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the pipeline logs the error and continues.
    async fn deliver(&self, summary: &SummaryResult, raw_text: &str) -> Result<(), SinkError>;
}

/// Sink that prints summaries to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Create a new console sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SuggestionSink for ConsoleSink {
    async fn deliver(&self, summary: &SummaryResult, _raw_text: &str) -> Result<(), SinkError> {
        crate::display::print_summary(summary);
        Ok(())
    }
}
