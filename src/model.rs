//! Speech model capabilities.
//!
//! The recognition model itself is an external collaborator: given a sample
//! window it produces timed text segments, observing a [`CancelToken`] as a
//! cooperative abort point during long inference. Jobs obtain a model through
//! a [`ModelProvider`], which may cache loaded weights so a restart with an
//! unchanged identifier reuses the existing handle.

use crate::cancel::CancelToken;
use crate::error::{Result, StreamscribeError};
use crate::transcript::{Segment, SharedTranscript};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Options passed through to the model for a single transcription run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeOptions {
    /// Language hint ("auto" lets the model detect).
    pub language: String,
    /// Translate to English instead of transcribing.
    pub translate: bool,
    /// Number of inference threads (0 = model default).
    pub threads: usize,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            translate: false,
            threads: 0,
        }
    }
}

/// Trait for speech-to-text models.
///
/// This trait allows swapping implementations (real inference vs mock).
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Decodes a sample window, appending segments to `transcript`.
    ///
    /// Implementations must poll `cancel` during long computation and return
    /// [`StreamscribeError::Cancelled`] when it is signalled.
    async fn transcribe(
        &self,
        samples: &[f32],
        transcript: &SharedTranscript,
        cancel: &CancelToken,
        options: &TranscribeOptions,
    ) -> Result<()>;
}

/// Create-or-reuse capability for model resources, keyed by identifier.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns a model for `model_id`, reusing a previously loaded resource
    /// when the identifier is unchanged.
    async fn create_or_reuse(&self, model_id: &str) -> Result<Arc<dyn SpeechModel>>;
}

/// Loads a model from scratch. Wrapped by [`CachingModelProvider`].
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn SpeechModel>>;
}

/// [`ModelProvider`] that caches the most recently loaded model.
///
/// A restart with the same identifier reuses the loaded weights; a different
/// identifier drops the old handle and loads fresh.
pub struct CachingModelProvider<L: ModelLoader> {
    loader: L,
    cached: tokio::sync::Mutex<Option<(String, Arc<dyn SpeechModel>)>>,
}

impl<L: ModelLoader> CachingModelProvider<L> {
    /// Creates a provider around the given loader.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cached: tokio::sync::Mutex::new(None),
        }
    }

    /// Returns the wrapped loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }
}

#[async_trait]
impl<L: ModelLoader> ModelProvider for CachingModelProvider<L> {
    async fn create_or_reuse(&self, model_id: &str) -> Result<Arc<dyn SpeechModel>> {
        let mut cached = self.cached.lock().await;
        if let Some((id, model)) = cached.as_ref() {
            if id == model_id {
                debug!(model_id, "reusing loaded model");
                return Ok(Arc::clone(model));
            }
        }

        debug!(model_id, "loading model");
        let model = self.loader.load(model_id).await?;
        *cached = Some((model_id.to_string(), Arc::clone(&model)));
        Ok(model)
    }
}

/// Mock model for testing.
///
/// Produces one segment per invocation: the next scripted response if any
/// remain, otherwise the fallback text. An optional artificial latency is
/// slept in small increments so a signalled token aborts the call the way a
/// real model would.
pub struct MockModel {
    responses: std::sync::Mutex<VecDeque<Vec<Segment>>>,
    fallback: String,
    latency: Duration,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockModel {
    /// Creates a mock that transcribes every window as `fallback` text.
    pub fn new(fallback: &str) -> Self {
        Self {
            responses: std::sync::Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            latency: Duration::ZERO,
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queues scripted segments for the next invocations, in order.
    pub fn with_scripted(self, responses: Vec<Vec<Segment>>) -> Self {
        {
            let mut queue = self.responses.lock().unwrap_or_else(|e| e.into_inner());
            queue.extend(responses);
        }
        self
    }

    /// Configures an artificial per-call inference latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Configures the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Returns how many times `transcribe` has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechModel for MockModel {
    async fn transcribe(
        &self,
        samples: &[f32],
        transcript: &SharedTranscript,
        cancel: &CancelToken,
        _options: &TranscribeOptions,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.should_fail {
            return Err(StreamscribeError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }

        // Sleep in 10ms slices, honoring the token between slices.
        let mut remaining = self.latency;
        let slice = Duration::from_millis(10);
        while remaining > Duration::ZERO {
            if cancel.is_signalled() {
                return Err(StreamscribeError::Cancelled);
            }
            let step = remaining.min(slice);
            tokio::time::sleep(step).await;
            remaining -= step;
        }
        if cancel.is_signalled() {
            return Err(StreamscribeError::Cancelled);
        }

        let scripted = {
            let mut queue = self.responses.lock().unwrap_or_else(|e| e.into_inner());
            queue.pop_front()
        };
        match scripted {
            Some(segments) => {
                for segment in segments {
                    transcript.push(segment);
                }
            }
            None => {
                let duration_ms = (samples.len() as u64 * 1000) / 16_000;
                transcript.push(Segment::new(0, duration_ms, self.fallback.clone()));
            }
        }
        Ok(())
    }
}

/// Mock loader for testing provider caching.
pub struct MockLoader {
    text: String,
    loads: AtomicUsize,
    fail: bool,
}

impl MockLoader {
    /// Creates a loader whose models transcribe every window as `text`.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            loads: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Configures the loader to fail.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Returns how many times a model has been loaded from scratch.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for MockLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn SpeechModel>> {
        if self.fail {
            return Err(StreamscribeError::ModelLoad {
                model: model_id.to_string(),
                message: "mock load failure".to_string(),
            });
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockModel::new(&self.text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_fallback_segment() {
        let model = MockModel::new("hello world");
        let transcript = SharedTranscript::new();

        model
            .transcribe(
                &vec![0.0; 16_000],
                &transcript,
                &CancelToken::new(),
                &TranscribeOptions::default(),
            )
            .await
            .unwrap();

        let segments = transcript.snapshot();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hello world");
        assert_eq!(segments[0].end_ms, 1000);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_model_scripted_responses() {
        let model = MockModel::new("fallback").with_scripted(vec![
            vec![Segment::new(0, 100, "first")],
            vec![Segment::new(0, 200, "second")],
        ]);
        let transcript = SharedTranscript::new();
        let token = CancelToken::new();
        let options = TranscribeOptions::default();

        model
            .transcribe(&[0.0], &transcript, &token, &options)
            .await
            .unwrap();
        model
            .transcribe(&[0.0], &transcript, &token, &options)
            .await
            .unwrap();
        model
            .transcribe(&[0.0], &transcript, &token, &options)
            .await
            .unwrap();

        let texts: Vec<_> = transcript.snapshot().into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["first", "second", "fallback"]);
    }

    #[tokio::test]
    async fn test_mock_model_failure() {
        let model = MockModel::new("text").with_failure();
        let transcript = SharedTranscript::new();

        let result = model
            .transcribe(
                &[0.0],
                &transcript,
                &CancelToken::new(),
                &TranscribeOptions::default(),
            )
            .await;

        assert!(matches!(
            result,
            Err(StreamscribeError::Transcription { .. })
        ));
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn test_mock_model_observes_cancellation() {
        let model = MockModel::new("text").with_latency(Duration::from_secs(5));
        let transcript = SharedTranscript::new();
        let token = CancelToken::new();
        token.signal();

        let start = std::time::Instant::now();
        let result = model
            .transcribe(&[0.0], &transcript, &token, &TranscribeOptions::default())
            .await;

        assert_eq!(result, Err(StreamscribeError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn test_caching_provider_reuses_same_id() {
        let provider = CachingModelProvider::new(MockLoader::new("text"));

        let _first = provider.create_or_reuse("base.en").await.unwrap();
        let _second = provider.create_or_reuse("base.en").await.unwrap();

        assert_eq!(provider.loader.load_count(), 1);
    }

    #[tokio::test]
    async fn test_caching_provider_reloads_on_new_id() {
        let provider = CachingModelProvider::new(MockLoader::new("text"));

        let _first = provider.create_or_reuse("base.en").await.unwrap();
        let _second = provider.create_or_reuse("small").await.unwrap();
        let _third = provider.create_or_reuse("small").await.unwrap();

        assert_eq!(provider.loader.load_count(), 2);
    }

    #[tokio::test]
    async fn test_caching_provider_propagates_load_failure() {
        let provider = CachingModelProvider::new(MockLoader::new("text").with_failure());

        let result = provider.create_or_reuse("broken").await;
        assert!(matches!(
            result,
            Err(StreamscribeError::ModelLoad { model, .. }) if model == "broken"
        ));
    }

    #[test]
    fn test_options_default() {
        let options = TranscribeOptions::default();
        assert_eq!(options.language, "auto");
        assert!(!options.translate);
        assert_eq!(options.threads, 0);
    }
}
