//! Streaming source capability.
//!
//! A streaming source is an independent producer (capture device, file
//! replay, test harness) that pushes samples into a [`FrameWindower`] once
//! told to start feeding. The source is the single writer to the windower's
//! buffer; the job's poll loop is the single reader.

use crate::error::Result;
use crate::windower::FrameWindower;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Trait for sample producers feeding a streaming job.
#[async_trait]
pub trait StreamingSource: Send + Sync {
    /// Begins pushing samples into the windower.
    async fn start_feeding(&self, windower: Arc<FrameWindower>) -> Result<()>;

    /// Temporarily suspends sample production.
    async fn pause_feeding(&self) -> Result<()>;

    /// Resumes sample production after a pause.
    async fn resume_feeding(&self) -> Result<()>;

    /// Stops sample production and releases the windower.
    async fn stop_feeding(&self) -> Result<()>;
}

/// Configuration for [`ChunkedSource`].
#[derive(Debug, Clone)]
pub struct ChunkedSourceConfig {
    /// Samples delivered per append.
    pub chunk_size: usize,
    /// Delay between appends.
    pub interval: Duration,
}

impl Default for ChunkedSourceConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::defaults::SAMPLE_RATE,
            interval: Duration::from_millis(200),
        }
    }
}

/// Source that replays a fixed sample array in timed chunks.
///
/// Stands in for a capture device in tests and offline replays: it appends
/// one chunk per interval until exhausted, honoring pause and stop.
pub struct ChunkedSource {
    chunks: Vec<Vec<f32>>,
    interval: Duration,
    paused: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ChunkedSource {
    /// Creates a source replaying `samples` with the default chunking.
    pub fn new(samples: Vec<f32>) -> Self {
        Self::with_config(samples, ChunkedSourceConfig::default())
    }

    /// Creates a source with custom chunk size and interval.
    pub fn with_config(samples: Vec<f32>, config: ChunkedSourceConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        let chunks = samples
            .chunks(chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        Self {
            chunks,
            interval: config.interval,
            paused: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            task: std::sync::Mutex::new(None),
        }
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

#[async_trait]
impl StreamingSource for ChunkedSource {
    async fn start_feeding(&self, windower: Arc<FrameWindower>) -> Result<()> {
        // A previous feeding run is superseded.
        if let Some(task) = self.take_task() {
            task.abort();
        }
        self.stopped.store(false, Ordering::SeqCst);

        let chunks = self.chunks.clone();
        let interval = self.interval;
        let paused = Arc::clone(&self.paused);
        let stopped = Arc::clone(&self.stopped);

        let handle = tokio::spawn(async move {
            let mut next = 0;
            while next < chunks.len() {
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                if paused.load(Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
                windower.append(&chunks[next]);
                next += 1;
                tokio::time::sleep(interval).await;
            }
        });

        *self.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }

    async fn pause_feeding(&self) -> Result<()> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume_feeding(&self) -> Result<()> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_feeding(&self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self.take_task() {
            let _ = task.await;
        }
        Ok(())
    }
}
