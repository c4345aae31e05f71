//! One-shot transcription job over a fixed sample array.

use crate::error::{Result, StreamscribeError};
use crate::job::{JobCore, JobState, WorkHandle};
use crate::model::{ModelProvider, TranscribeOptions};
use crate::transcript::{Segment, SharedTranscript};
use std::sync::Arc;

/// Job that runs the model once over already-available samples.
pub struct OneShotJob {
    core: JobCore,
    samples: Arc<Vec<f32>>,
}

impl OneShotJob {
    /// Creates a job over the given samples.
    pub fn new(samples: Vec<f32>, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            core: JobCore::new(provider),
            samples: Arc::new(samples),
        }
    }

    /// Starts a transcription.
    ///
    /// If the job is already busy transcribing, the current run is stopped
    /// and fully joined first, and the transcript and token are reset, so the
    /// new run starts clean. Model load failures surface later, through the
    /// returned handle.
    pub async fn start(&mut self, model_id: &str, options: TranscribeOptions) -> WorkHandle {
        self.core.prepare_start().await;

        let ctx = self.core.ctx().clone();
        let samples = Arc::clone(&self.samples);
        let model_id = model_id.to_string();

        self.core.launch(async move {
            let model = ctx.provider.create_or_reuse(&model_id).await?;
            ctx.set_state(JobState::Transcribing);
            model
                .transcribe(&samples, &ctx.transcript, &ctx.cancel, &options)
                .await
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
        Ok(self.start(model_id, options).await)
    }

    /// Stops the running transcription and waits for it to unwind.
    pub async fn stop(&mut self) -> Result<()> {
        self.core.stop().await
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamscribeError;
    use crate::model::{CachingModelProvider, MockLoader, MockModel, ModelLoader, SpeechModel};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn provider(text: &str) -> Arc<dyn ModelProvider> {
        Arc::new(CachingModelProvider::new(MockLoader::new(text)))
    }

    #[tokio::test]
    async fn test_one_shot_transcribes_to_done() {
        let mut job = OneShotJob::new(vec![0.0; 16_000], provider("hello world"));

        let handle = job.start("base.en", TranscribeOptions::default()).await;
        handle.join().await.unwrap();

        assert_eq!(job.state(), JobState::Done);
        assert_eq!(job.text(), "hello world");
        assert_eq!(job.segments().len(), 1);
    }

    #[tokio::test]
    async fn test_one_shot_model_load_failure_surfaces() {
        let provider = Arc::new(CachingModelProvider::new(
            MockLoader::new("text").with_failure(),
        ));
        let mut job = OneShotJob::new(vec![0.0; 100], provider);

        let handle = job.start("broken", TranscribeOptions::default()).await;
        let outcome = handle.join().await;

        assert!(matches!(outcome, Err(StreamscribeError::ModelLoad { .. })));
        assert_eq!(job.state(), JobState::Error);
        assert!(job.last_error().is_some());
    }

    #[tokio::test]
    async fn test_one_shot_transcription_failure_surfaces() {
        struct FailingLoader;

        #[async_trait]
        impl ModelLoader for FailingLoader {
            async fn load(&self, _model_id: &str) -> crate::error::Result<Arc<dyn SpeechModel>> {
                Ok(Arc::new(MockModel::new("text").with_failure()))
            }
        }

        let provider = Arc::new(CachingModelProvider::new(FailingLoader));
        let mut job = OneShotJob::new(vec![0.0; 100], provider);

        let handle = job.start("base.en", TranscribeOptions::default()).await;
        let outcome = handle.join().await;

        assert!(matches!(
            outcome,
            Err(StreamscribeError::Transcription { .. })
        ));
        assert_eq!(job.state(), JobState::Error);
    }

    #[tokio::test]
    async fn test_one_shot_stop_during_inference() {
        struct SlowLoader;

        #[async_trait]
        impl ModelLoader for SlowLoader {
            async fn load(&self, _model_id: &str) -> crate::error::Result<Arc<dyn SpeechModel>> {
                Ok(Arc::new(
                    MockModel::new("text").with_latency(Duration::from_secs(30)),
                ))
            }
        }

        let mut job = OneShotJob::new(
            vec![0.0; 100],
            Arc::new(CachingModelProvider::new(SlowLoader)),
        );

        let _handle = job.start("base.en", TranscribeOptions::default()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(job.state(), JobState::Transcribing);

        // The cancellation unwind is swallowed, never surfaced as a failure.
        job.stop().await.unwrap();
        assert_eq!(job.state(), JobState::Done);
    }

    #[tokio::test]
    async fn test_one_shot_restart_supersedes_running_work() {
        struct CountingLoader {
            loads: AtomicUsize,
        }

        #[async_trait]
        impl ModelLoader for CountingLoader {
            async fn load(&self, _model_id: &str) -> crate::error::Result<Arc<dyn SpeechModel>> {
                self.loads.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(
                    MockModel::new("text").with_latency(Duration::from_secs(30)),
                ))
            }
        }

        let provider = Arc::new(CachingModelProvider::new(CountingLoader {
            loads: AtomicUsize::new(0),
        }));
        let mut job = OneShotJob::new(vec![0.0; 100], Arc::clone(&provider) as _);

        let _first = job.start("base.en", TranscribeOptions::default()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Restart joins the old unit, resets, and reuses the cached model.
        let _second = job
            .restart("base.en", TranscribeOptions::default())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(job.state(), JobState::Transcribing);
        assert_eq!(provider.loader().loads.load(Ordering::SeqCst), 1);

        job.stop().await.unwrap();
        assert_eq!(job.state(), JobState::Done);
    }

    #[tokio::test]
    async fn test_one_shot_stop_before_start_fails() {
        let mut job = OneShotJob::new(vec![0.0; 100], provider("text"));
        assert_eq!(job.stop().await, Err(StreamscribeError::JobNotStarted));
        assert_eq!(job.state(), JobState::Idle);
        assert!(job.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_one_shot_restart_before_start_fails() {
        let mut job = OneShotJob::new(vec![0.0; 100], provider("text"));
        let result = job.restart("base.en", TranscribeOptions::default()).await;
        assert!(matches!(result, Err(StreamscribeError::JobNotStarted)));
        assert_eq!(job.state(), JobState::Idle);
    }
}
