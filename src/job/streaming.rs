//! Streaming transcription job.
//!
//! Runs the poll→transcribe→merge loop indefinitely against a frame
//! windower fed by an external streaming source. Each emitted window is
//! decoded into a fresh local transcript and folded into the job's main
//! transcript at the high-water mark, advancing the mark only when the
//! window closed a finalized frame. Re-decodes of the open frame replace
//! the tentative tail in place, so an observer sees text settle instead of
//! flicker.

use crate::defaults;
use crate::error::{Result, StreamscribeError};
use crate::job::{JobContext, JobCore, JobState, WorkHandle};
use crate::model::{ModelProvider, TranscribeOptions};
use crate::source::StreamingSource;
use crate::transcript::{Segment, SharedTranscript};
use crate::windower::{FrameWindower, WindowerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for a streaming job.
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Windowing sizes for the frame windower.
    pub windower: WindowerConfig,
    /// Backoff between polls when no window is ready.
    pub poll_interval: Duration,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            windower: WindowerConfig::default(),
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
        }
    }
}

/// Job that transcribes a live sample stream incrementally.
pub struct StreamingJob {
    core: JobCore,
    windower: Arc<FrameWindower>,
    source: Arc<dyn StreamingSource>,
    poll_interval: Duration,
}

impl StreamingJob {
    /// Creates a streaming job over the given source.
    ///
    /// Fails with `InvalidConfig` if the windowing sizes are inconsistent.
    pub fn new(
        source: Arc<dyn StreamingSource>,
        provider: Arc<dyn ModelProvider>,
        config: StreamingConfig,
    ) -> Result<Self> {
        let windower = Arc::new(FrameWindower::new(config.windower)?);
        Ok(Self {
            core: JobCore::new(provider),
            windower,
            source,
            poll_interval: config.poll_interval,
        })
    }

    /// Starts streaming transcription.
    ///
    /// If the job is already running, the current run is stopped and fully
    /// joined first; the transcript, token, and windower cursor are reset
    /// before fresh work launches. Model load and source failures surface
    /// through the returned handle.
    pub async fn start(&mut self, model_id: &str, options: TranscribeOptions) -> WorkHandle {
        self.core.prepare_start().await;
        self.windower.reset_cursor();

        let ctx = self.core.ctx().clone();
        let windower = Arc::clone(&self.windower);
        let source = Arc::clone(&self.source);
        let model_id = model_id.to_string();
        let poll_interval = self.poll_interval;

        self.core.launch(async move {
            run_stream(ctx, windower, source, model_id, options, poll_interval).await
        })
    }

    /// Restarts the job, reusing the loaded model if `model_id` is unchanged.
    ///
    /// Equivalent to `stop()` followed by `start()`: fails with
    /// `JobNotStarted` if no work was ever started.
    pub async fn restart(
        &mut self,
        model_id: &str,
        options: TranscribeOptions,
    ) -> Result<WorkHandle> {
        if !self.core.started() {
            return Err(StreamscribeError::JobNotStarted);
        }
        debug!(model_id, "restarting streaming job");
        Ok(self.start(model_id, options).await)
    }

    /// Stops the source, then the transcription loop, waiting for the work
    /// unit to fully unwind before reporting.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.core.started() {
            return Err(StreamscribeError::JobNotStarted);
        }
        self.source.stop_feeding().await?;
        self.core.stop().await
    }

    /// Resets the windower's buffer and cursor and empties the transcript.
    /// Lifecycle state is unchanged; a running loop simply starts over from
    /// whatever the source feeds next.
    pub fn clear(&self) {
        self.windower.clear();
        self.core.transcript().reset();
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> JobState {
        self.core.state()
    }

    /// Returns the failure message of the last run, if it errored.
    pub fn last_error(&self) -> Option<String> {
        self.core.last_error()
    }

    /// Returns the job's transcript for observation.
    pub fn transcript(&self) -> &SharedTranscript {
        self.core.transcript()
    }

    /// Returns a point-in-time copy of the transcript segments.
    pub fn segments(&self) -> Vec<Segment> {
        self.core.transcript().snapshot()
    }

    /// Returns the full transcript text.
    pub fn text(&self) -> String {
        self.core.transcript().text()
    }

    /// Returns the windower, e.g. for feeding from a test harness.
    pub fn windower(&self) -> &Arc<FrameWindower> {
        &self.windower
    }
}

/// The streaming work loop.
///
/// Cancellation is cooperative: the token is checked at the top of each
/// iteration (covering a signal that lands during the backoff sleep within
/// one poll interval) and passed into the model call, which aborts early
/// during a deliberate stop. That abort propagates as `Cancelled` and is
/// swallowed by the job core while winding down.
async fn run_stream(
    ctx: JobContext,
    windower: Arc<FrameWindower>,
    source: Arc<dyn StreamingSource>,
    model_id: String,
    options: TranscribeOptions,
    poll_interval: Duration,
) -> Result<()> {
    let model = ctx.provider.create_or_reuse(&model_id).await?;
    source.start_feeding(Arc::clone(&windower)).await?;

    ctx.set_state(JobState::Transcribing);
    loop {
        if ctx.cancel.is_signalled() && ctx.is_winding_down() {
            break;
        }

        match windower.next_window() {
            Some(window) => {
                // Decode into a local transcript: re-decodes of the same
                // open frame supersede each other and must not accumulate.
                let local = SharedTranscript::new();
                model
                    .transcribe(&window.samples, &local, &ctx.cancel, &options)
                    .await?;

                let segments = local.snapshot();
                if !segments.is_empty() {
                    debug!(
                        count = segments.len(),
                        is_final_frame = window.is_final_frame,
                        "merging window result"
                    );
                    ctx.transcript
                        .merge_at_high_water_mark(segments, window.is_final_frame);
                }
                // Let the feeding side and observers run.
                tokio::task::yield_now().await;
            }
            None => {
                tokio::time::sleep(poll_interval).await;
            }
        }
    }

    Ok(())
}
