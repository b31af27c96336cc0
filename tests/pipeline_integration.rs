//! End-to-end tests for the watch pipeline.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use logsage::ai::{ProviderError, SummarizeError, SummaryResult, Summarize};
use logsage::pipeline::{PipelineEvent, PipelineHandle, WatchMode, WatchPipeline};
use logsage::sink::{SinkError, SuggestionSink};

/// Summarizer double: fails the first `fail_first` calls, then succeeds.
struct ScriptedSummarizer {
    fail_first: AtomicU32,
}

impl ScriptedSummarizer {
    fn new(fail_first: u32) -> Arc<Self> {
        Arc::new(Self {
            fail_first: AtomicU32::new(fail_first),
        })
    }
}

/// Newtype so test doubles behind an `Arc` can implement the crate's traits
/// without violating the orphan rule.
struct Shared<T>(Arc<T>);

#[async_trait]
impl<T: Summarize> Summarize for Shared<T> {
    async fn summarize(&self, text: &str) -> Result<SummaryResult, SummarizeError> {
        self.0.summarize(text).await
    }
}

#[async_trait]
impl<T: SuggestionSink> SuggestionSink for Shared<T> {
    async fn deliver(&self, summary: &SummaryResult, raw_text: &str) -> Result<(), SinkError> {
        self.0.deliver(summary, raw_text).await
    }
}

#[async_trait]
impl Summarize for ScriptedSummarizer {
    async fn summarize(&self, text: &str) -> Result<SummaryResult, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        if self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SummarizeError::RetriesExhausted {
                attempts: 3,
                source: ProviderError::RequestFailed("scripted outage".to_string()),
            });
        }
        Ok(SummaryResult {
            summary_text: "scripted summary".to_string(),
            original_length: text.len(),
            summary_length: 16,
            model_identifier: "scripted-model".to_string(),
            produced_at: Utc::now(),
        })
    }
}

/// Sink double recording every delivered raw excerpt.
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<String>>,
}

#[async_trait]
impl SuggestionSink for RecordingSink {
    async fn deliver(&self, _summary: &SummaryResult, raw_text: &str) -> Result<(), SinkError> {
        self.delivered.lock().unwrap().push(raw_text.to_string());
        Ok(())
    }
}

/// Sink double that always fails, to verify best-effort delivery.
struct FailingSink;

#[async_trait]
impl SuggestionSink for FailingSink {
    async fn deliver(&self, _summary: &SummaryResult, _raw_text: &str) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("no editor".to_string()))
    }
}

/// Long interval so tests drive checks via manual trigger only.
const NEVER: Duration = Duration::from_secs(600);

fn spawn(
    path: PathBuf,
    summarizer: Arc<ScriptedSummarizer>,
    sink: Arc<RecordingSink>,
    mode: WatchMode,
) -> (PipelineHandle, mpsc::Receiver<PipelineEvent>) {
    WatchPipeline::new(
        path,
        Box::new(Shared(summarizer)),
        Box::new(Shared(sink)),
        mode,
        NEVER,
        Duration::from_millis(10),
    )
    .spawn()
}

async fn wait_for<F>(rx: &mut mpsc::Receiver<PipelineEvent>, mut pred: F) -> PipelineEvent
where
    F: FnMut(&PipelineEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for pipeline event")
            .expect("pipeline event channel closed");
        if pred(&event) {
            return event;
        }
    }
}

fn append(path: &Path, text: &str) {
    let mut f = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .unwrap();
    write!(f, "{text}").unwrap();
}

#[tokio::test]
async fn test_worked_example_scenario() {
    // File starts empty, watcher initializes at offset 0.
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "").unwrap();

    let summarizer = ScriptedSummarizer::new(0);
    let sink = Arc::new(RecordingSink::default());
    let (handle, mut rx) = spawn(path.clone(), summarizer, sink.clone(), WatchMode::Watch);

    // Give the task a moment to initialize, then append.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Append "ERROR: X\n" (9 bytes): one event with that exact range.
    append(&path, "ERROR: X\n");
    handle.trigger_now();
    let event = wait_for(&mut rx, |e| matches!(e, PipelineEvent::NewContent { .. })).await;
    let PipelineEvent::NewContent {
        lines,
        range_start,
        range_end,
    } = event
    else {
        unreachable!()
    };
    assert_eq!((lines, range_start, range_end), (1, 0, 9));
    wait_for(&mut rx, |e| matches!(e, PipelineEvent::SummaryReady(_))).await;

    // Append then truncate before the next check: rotation, no event.
    append(&path, "ERROR: Y\n");
    std::fs::write(&path, "").unwrap();
    handle.trigger_now();
    wait_for(&mut rx, |e| matches!(e, PipelineEvent::Rotated(_))).await;

    handle.stop().await;
    assert_eq!(sink.delivered.lock().unwrap().as_slice(), ["ERROR: X\n"]);
}

#[tokio::test]
async fn test_no_bytes_lost_across_failed_cycles() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "").unwrap();

    // Two failing cycles, then success.
    let summarizer = ScriptedSummarizer::new(2);
    let sink = Arc::new(RecordingSink::default());
    let (handle, mut rx) = spawn(path.clone(), summarizer, sink.clone(), WatchMode::Watch);

    // Give the task a moment to initialize, then append.
    tokio::time::sleep(Duration::from_millis(50)).await;
    append(&path, "alpha\n");
    handle.trigger_now();
    wait_for(&mut rx, |e| matches!(e, PipelineEvent::CycleFailed(_))).await;

    append(&path, "beta\n");
    handle.trigger_now();
    wait_for(&mut rx, |e| matches!(e, PipelineEvent::CycleFailed(_))).await;

    append(&path, "gamma\n");
    handle.trigger_now();
    wait_for(&mut rx, |e| matches!(e, PipelineEvent::SummaryReady(_))).await;
    handle.stop().await;

    // The successful delivery covers every byte appended in the window.
    assert_eq!(
        sink.delivered.lock().unwrap().as_slice(),
        ["alpha\nbeta\ngamma\n"]
    );
}

#[tokio::test]
async fn test_sink_failure_does_not_block_offset_advancement() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "").unwrap();

    let summarizer = ScriptedSummarizer::new(0);
    let (handle, mut rx) = WatchPipeline::new(
        path.clone(),
        Box::new(Shared(summarizer)),
        Box::new(FailingSink),
        WatchMode::Watch,
        NEVER,
        Duration::from_millis(10),
    )
    .spawn();

    // Give the task a moment to initialize, then append.
    tokio::time::sleep(Duration::from_millis(50)).await;
    append(&path, "first\n");
    handle.trigger_now();
    let first = wait_for(&mut rx, |e| matches!(e, PipelineEvent::SummaryReady(_))).await;
    assert!(matches!(first, PipelineEvent::SummaryReady(_)));

    // Offset advanced despite the sink error: the next event only carries
    // the new bytes.
    append(&path, "second\n");
    handle.trigger_now();
    let event = wait_for(&mut rx, |e| matches!(e, PipelineEvent::NewContent { .. })).await;
    let PipelineEvent::NewContent { range_start, .. } = event else {
        unreachable!()
    };
    assert_eq!(range_start, 6);
    handle.stop().await;
}

#[tokio::test]
async fn test_capture_cycle_with_interceptor_appends() {
    use logsage::capture::ErrorInterceptor;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("capture.log");

    let summarizer = ScriptedSummarizer::new(0);
    let sink = Arc::new(RecordingSink::default());
    let (handle, mut rx) = spawn(path.clone(), summarizer, sink.clone(), WatchMode::Capture);

    // Let the pipeline create and start watching its capture file.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Interceptor origins append into the watched capture file.
    let interceptor = ErrorInterceptor::new(path.clone());
    let mut writer = interceptor.stderr_writer();
    writer.write_all(b"connection reset by peer\n").unwrap();

    handle.trigger_now();
    wait_for(&mut rx, |e| matches!(e, PipelineEvent::SummaryReady(_))).await;
    handle.stop().await;

    // Delivered content carries the tagged capture line, and the scratch
    // file was cleared after delivery.
    let delivered = sink.delivered.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].contains("[STDERR] connection reset by peer"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}
