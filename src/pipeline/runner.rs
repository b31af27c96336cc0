//! Watch loop and delivery pipeline.
//!
//! One tokio task drives the `AwaitingFile -> Watching <-> Checking` state
//! machine. Checks run inline in that task, so at most one check cycle is
//! ever in flight per watched file; a manual trigger arriving mid-check lands
//! in a one-slot channel and coalesces instead of running concurrently.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::ai::{Summarize, SummarizeError};
use crate::sink::SuggestionSink;
use crate::watcher::{ChangeEvent, FilePoll, OffsetTracker, WatcherError};

use super::events::PipelineEvent;

/// Capacity of the outward notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Ownership of the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// The log file belongs to the user; this tool never writes to it.
    Watch,
    /// The file is scratch space owned by this pipeline (error capture).
    /// It is truncated after each successful delivery.
    Capture,
}

/// Orchestrates change detection, summarization, and sink delivery for one
/// watched file.
pub struct WatchPipeline {
    tracker: OffsetTracker,
    summarizer: Box<dyn Summarize>,
    sink: Box<dyn SuggestionSink>,
    mode: WatchMode,
    interval: Duration,
    file_wait: Duration,
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    trigger_tx: mpsc::Sender<()>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PipelineHandle {
    /// Request an immediate check.
    ///
    /// Identical to a scheduled tick. If a check is already in flight the
    /// trigger is queued in a one-slot buffer; further triggers coalesce.
    pub fn trigger_now(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// Stop the pipeline.
    ///
    /// Cancels the timer; an in-flight cycle completes or fails naturally.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }

    /// Token that cancels the pipeline when triggered externally.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl WatchPipeline {
    /// Create a pipeline for the given file.
    #[must_use]
    pub fn new(
        path: PathBuf,
        summarizer: Box<dyn Summarize>,
        sink: Box<dyn SuggestionSink>,
        mode: WatchMode,
        interval: Duration,
        file_wait: Duration,
    ) -> Self {
        Self {
            tracker: OffsetTracker::new(path),
            summarizer,
            sink,
            mode,
            interval,
            file_wait,
        }
    }

    /// Spawn the pipeline task.
    ///
    /// Returns a handle for triggering and stopping it plus the receiver for
    /// outward notifications.
    #[must_use]
    pub fn spawn(self) -> (PipelineHandle, mpsc::Receiver<PipelineEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        // One slot: triggers arriving during a check coalesce (single-flight).
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let join = tokio::spawn(self.run(cancel.clone(), trigger_rx, event_tx));

        (
            PipelineHandle {
                trigger_tx,
                cancel,
                join,
            },
            event_rx,
        )
    }

    async fn run(
        mut self,
        cancel: CancellationToken,
        mut trigger_rx: mpsc::Receiver<()>,
        events: mpsc::Sender<PipelineEvent>,
    ) {
        'awaiting: loop {
            if !self.await_file(&cancel, &events).await {
                break;
            }

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately;
            // consume it so the first real check happens one interval in.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break 'awaiting,
                    _ = ticker.tick() => {}
                    Some(()) = trigger_rx.recv() => {}
                }

                match self.check_cycle(&events).await {
                    Ok(()) => {}
                    Err(e) if e.is_transient() => {
                        tracing::info!(
                            path = %self.tracker.path().display(),
                            "Watched file vanished, waiting for it to reappear"
                        );
                        continue 'awaiting;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Check cycle failed");
                        let _ = events.send(PipelineEvent::CycleFailed(e.to_string())).await;
                    }
                }
            }
        }

        let _ = events.send(PipelineEvent::Stopped).await;
    }

    /// Wait for the watched file to exist.
    ///
    /// Initializes the tracker to the file's current size, so pre-existing
    /// content is never replayed. Returns `false` if cancelled while waiting.
    async fn await_file(
        &mut self,
        cancel: &CancellationToken,
        events: &mpsc::Sender<PipelineEvent>,
    ) -> bool {
        if self.mode == WatchMode::Capture {
            if let Err(e) = ensure_file_exists(self.tracker.path()).await {
                tracing::error!(error = %e, "Cannot create capture file");
            }
        }

        loop {
            match self.tracker.start_at_end().await {
                Ok(()) => {
                    tracing::info!(
                        path = %self.tracker.path().display(),
                        offset = self.tracker.last_offset(),
                        "Watching file"
                    );
                    return true;
                }
                Err(WatcherError::FileMissing(path)) => {
                    tracing::info!(path = %path.display(), "File not found, waiting");
                    let _ = events.send(PipelineEvent::AwaitingFile(path)).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cannot stat watched file, retrying");
                }
            }

            tokio::select! {
                () = cancel.cancelled() => return false,
                () = tokio::time::sleep(self.file_wait) => {}
            }
        }
    }

    /// Run one check: poll the tracker and process whatever it reports.
    async fn check_cycle(
        &mut self,
        events: &mpsc::Sender<PipelineEvent>,
    ) -> Result<(), WatcherError> {
        match self.tracker.poll().await? {
            FilePoll::Unchanged => Ok(()),
            FilePoll::Rotated => {
                let _ = events
                    .send(PipelineEvent::Rotated(self.tracker.path().to_path_buf()))
                    .await;
                Ok(())
            }
            FilePoll::Grew(change) => {
                self.process_change(change, events).await;
                Ok(())
            }
        }
    }

    /// Deliver one change event: summarize, hand to the sink, then commit.
    ///
    /// The offset is committed only after summarization succeeded; a failed
    /// cycle leaves the content unconsumed so the next growth re-reads the
    /// superset range. Sink failures are logged and never block advancement.
    async fn process_change(&mut self, change: ChangeEvent, events: &mpsc::Sender<PipelineEvent>) {
        let _ = events
            .send(PipelineEvent::NewContent {
                lines: change.lines.len(),
                range_start: change.range_start,
                range_end: change.range_end,
            })
            .await;

        if change.is_blank() {
            // Whitespace-only appends carry nothing to summarize.
            self.tracker.commit(change.range_end);
            return;
        }

        match self.summarizer.summarize(&change.raw_text).await {
            Ok(summary) => {
                if let Err(e) = self.sink.deliver(&summary, &change.raw_text).await {
                    tracing::warn!(error = %e, "Sink delivery failed, continuing");
                }
                self.tracker.commit(change.range_end);
                if self.mode == WatchMode::Capture {
                    self.clear_capture().await;
                }
                let _ = events
                    .send(PipelineEvent::SummaryReady(Box::new(summary)))
                    .await;
            }
            Err(SummarizeError::EmptyInput) => {
                // Guard fired before any network call; no-op for this cycle.
                self.tracker.commit(change.range_end);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    range_start = change.range_start,
                    range_end = change.range_end,
                    "Summarization failed, content remains unconsumed"
                );
                let _ = events.send(PipelineEvent::CycleFailed(e.to_string())).await;
            }
        }
    }

    /// Truncate the capture file and reset offset tracking.
    ///
    /// Runs inside the single check cycle, so it is serialized relative to
    /// reads. Interceptor appends use `O_APPEND` and land at the new start.
    async fn clear_capture(&mut self) {
        if let Err(e) = tokio::fs::File::create(self.tracker.path()).await {
            tracing::warn!(error = %e, "Failed to clear capture file");
            return;
        }
        self.tracker.reset();
    }
}

/// Create the file if it does not exist, without touching existing content.
async fn ensure_file_exists(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await?;
    Ok(())
}
