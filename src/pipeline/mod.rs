//! Change-detection loop and delivery pipeline.

mod events;
mod runner;

pub use events::PipelineEvent;
pub use runner::{PipelineHandle, WatchMode, WatchPipeline};
