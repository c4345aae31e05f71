//! Job lifecycle state machine.
//!
//! A job owns a cancellation token, a transcript, a lifecycle state, and the
//! handle to its asynchronous work unit. The two job flavors share this core
//! by composition: [`OneShotJob`](one_shot::OneShotJob) runs the model once
//! over a fixed sample array, [`StreamingJob`](streaming::StreamingJob) runs
//! the poll→transcribe→merge loop against a frame windower.
//!
//! A job never runs two concurrent work units: starting over an active run
//! first signals cancellation, fully joins the old unit, and resets the
//! transcript and token before launching fresh work.

pub mod one_shot;
pub mod streaming;

use crate::cancel::CancelToken;
use crate::error::{Result, StreamscribeError};
use crate::model::ModelProvider;
use crate::transcript::SharedTranscript;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifecycle state of a job.
///
/// `Done` and `Error` are terminal for a run; the job may be reused by a
/// fresh `start`/`restart`, which re-initializes the token and transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// No work has been started yet.
    Idle,
    /// The work unit is running.
    Transcribing,
    /// A new start is superseding the current run.
    Restarting,
    /// A stop is in progress; the work unit is unwinding.
    Stopping,
    /// The run completed or was stopped.
    Done,
    /// The run failed.
    Error,
}

#[derive(Debug)]
struct Lifecycle {
    state: JobState,
    last_error: Option<String>,
}

/// State shared between a job and its spawned work unit.
#[derive(Clone)]
pub(crate) struct JobContext {
    lifecycle: Arc<Mutex<Lifecycle>>,
    pub(crate) transcript: SharedTranscript,
    pub(crate) cancel: CancelToken,
    pub(crate) provider: Arc<dyn ModelProvider>,
}

impl JobContext {
    fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                state: JobState::Idle,
                last_error: None,
            })),
            transcript: SharedTranscript::new(),
            cancel: CancelToken::new(),
            provider,
        }
    }

    fn lock_lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn state(&self) -> JobState {
        self.lock_lifecycle().state
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        self.lock_lifecycle().last_error.clone()
    }

    pub(crate) fn set_state(&self, state: JobState) {
        debug!(?state, "job state transition");
        self.lock_lifecycle().state = state;
    }

    fn set_error(&self, error: &StreamscribeError) {
        warn!(%error, "job failed");
        let mut lifecycle = self.lock_lifecycle();
        lifecycle.state = JobState::Error;
        lifecycle.last_error = Some(error.to_string());
    }

    /// True while a deliberate stop or restart is unwinding the work unit.
    /// Cancellation observed in these states is expected, not a failure.
    pub(crate) fn is_winding_down(&self) -> bool {
        matches!(self.state(), JobState::Stopping | JobState::Restarting)
    }
}

/// Handle to an asynchronous unit of work, returned by `start`/`restart`.
///
/// Awaiting the handle observes the run's outcome directly: `Ok` on
/// completion or deliberate stop, the failure otherwise.
pub struct WorkHandle {
    rx: oneshot::Receiver<Result<()>>,
}

impl WorkHandle {
    /// Waits for the work unit to terminate and returns its outcome.
    pub async fn join(self) -> Result<()> {
        self.rx
            .await
            .unwrap_or_else(|_| Err(StreamscribeError::Transcription {
                message: "work unit terminated without reporting an outcome".to_string(),
            }))
    }
}

/// Shared lifecycle core, composed into both job flavors.
pub(crate) struct JobCore {
    ctx: JobContext,
    task: Option<JoinHandle<Result<()>>>,
    started: bool,
}

impl JobCore {
    pub(crate) fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            ctx: JobContext::new(provider),
            task: None,
            started: false,
        }
    }

    pub(crate) fn ctx(&self) -> &JobContext {
        &self.ctx
    }

    pub(crate) fn state(&self) -> JobState {
        self.ctx.state()
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        self.ctx.last_error()
    }

    pub(crate) fn transcript(&self) -> &SharedTranscript {
        &self.ctx.transcript
    }

    pub(crate) fn started(&self) -> bool {
        self.started
    }

    /// Supersedes any prior run: signals cancellation, fully joins the old
    /// work unit, then resets the transcript and token for a new epoch.
    /// The prior run's outcome is discarded; a fresh start must not fail
    /// because an old run did.
    pub(crate) async fn prepare_start(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                self.ctx.set_state(JobState::Restarting);
                self.ctx.cancel.signal();
            }
            let _ = task.await;
        }
        self.ctx.transcript.reset();
        self.ctx.cancel.reset();
        self.ctx.lock_lifecycle().last_error = None;
    }

    /// Spawns the work unit and returns a handle to its outcome.
    ///
    /// The wrapper drives the terminal state: `Done` on success or on
    /// expected cancellation during stop/restart, `Error` (with the failure
    /// re-surfaced through the handle) otherwise.
    pub(crate) fn launch<F>(&mut self, work: F) -> WorkHandle
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let ctx = self.ctx.clone();
        let (tx, rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let outcome = match work.await {
                Ok(()) => {
                    ctx.set_state(JobState::Done);
                    Ok(())
                }
                Err(StreamscribeError::Cancelled) if ctx.is_winding_down() => {
                    ctx.set_state(JobState::Done);
                    Ok(())
                }
                Err(error) => {
                    ctx.set_error(&error);
                    Err(error)
                }
            };
            let _ = tx.send(outcome.clone());
            outcome
        });

        self.task = Some(handle);
        self.started = true;
        WorkHandle { rx }
    }

    /// Generic stop sequence: signal cancellation, join the work unit, then
    /// report `Done`. Fails with `JobNotStarted` before any start. A failure
    /// the run had already hit is re-surfaced instead of `Done`, and the job
    /// lands back in `Error` rather than lingering in `Stopping`.
    pub(crate) async fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Err(StreamscribeError::JobNotStarted);
        }
        self.ctx.set_state(JobState::Stopping);
        self.ctx.cancel.signal();

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    self.ctx.set_state(JobState::Error);
                    return Err(error);
                }
                Err(join_error) => {
                    let error = StreamscribeError::Transcription {
                        message: format!("work unit panicked: {join_error}"),
                    };
                    self.ctx.set_error(&error);
                    return Err(error);
                }
            }
        }

        self.ctx.set_state(JobState::Done);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CachingModelProvider, MockLoader};
    use std::time::Duration;

    fn provider() -> Arc<dyn ModelProvider> {
        Arc::new(CachingModelProvider::new(MockLoader::new("text")))
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let core = JobCore::new(provider());
        assert_eq!(core.state(), JobState::Idle);
        assert!(!core.started());
        assert!(core.last_error().is_none());
    }

    #[tokio::test]
    async fn test_stop_before_start_fails() {
        let mut core = JobCore::new(provider());
        assert_eq!(core.stop().await, Err(StreamscribeError::JobNotStarted));
        // No state mutated by the failed stop.
        assert_eq!(core.state(), JobState::Idle);
    }

    #[tokio::test]
    async fn test_successful_work_reaches_done() {
        let mut core = JobCore::new(provider());
        let ctx = core.ctx().clone();

        let handle = core.launch(async move {
            ctx.set_state(JobState::Transcribing);
            Ok(())
        });

        handle.join().await.unwrap();
        assert_eq!(core.state(), JobState::Done);
    }

    #[tokio::test]
    async fn test_failed_work_reaches_error_and_surfaces() {
        let mut core = JobCore::new(provider());

        let handle = core.launch(async {
            Err(StreamscribeError::Transcription {
                message: "boom".to_string(),
            })
        });

        let outcome = handle.join().await;
        assert!(matches!(
            outcome,
            Err(StreamscribeError::Transcription { .. })
        ));
        assert_eq!(core.state(), JobState::Error);
        assert_eq!(
            core.last_error(),
            Some("Transcription failed: boom".to_string())
        );
    }

    #[tokio::test]
    async fn test_stop_joins_work_and_reports_done() {
        let mut core = JobCore::new(provider());
        let ctx = core.ctx().clone();

        let _handle = core.launch(async move {
            ctx.set_state(JobState::Transcribing);
            loop {
                if ctx.cancel.is_signalled() {
                    return Err(StreamscribeError::Cancelled);
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        core.stop().await.unwrap();
        assert_eq!(core.state(), JobState::Done);
    }

    #[tokio::test]
    async fn test_unexpected_cancellation_is_an_error() {
        let mut core = JobCore::new(provider());

        // The model aborting on its own (no stop/restart in progress) is a
        // failure, not an expected unwind.
        let handle = core.launch(async { Err(StreamscribeError::Cancelled) });

        assert_eq!(handle.join().await, Err(StreamscribeError::Cancelled));
        assert_eq!(core.state(), JobState::Error);
    }

    #[tokio::test]
    async fn test_prepare_start_joins_and_resets() {
        let mut core = JobCore::new(provider());
        let ctx = core.ctx().clone();
        let transcript = core.transcript().clone();
        transcript.push(crate::transcript::Segment::new(0, 100, "stale"));

        let _handle = core.launch(async move {
            ctx.set_state(JobState::Transcribing);
            loop {
                if ctx.cancel.is_signalled() {
                    return Err(StreamscribeError::Cancelled);
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        core.prepare_start().await;

        assert!(core.transcript().is_empty());
        assert!(!core.ctx().cancel.is_signalled());
        assert!(core.task.is_none());
    }

    #[tokio::test]
    async fn test_stop_after_completed_run_is_done() {
        let mut core = JobCore::new(provider());
        let handle = core.launch(async { Ok(()) });
        handle.join().await.unwrap();

        core.stop().await.unwrap();
        assert_eq!(core.state(), JobState::Done);
    }

    #[tokio::test]
    async fn test_stop_after_failed_run_lands_in_error() {
        let mut core = JobCore::new(provider());
        let handle = core.launch(async {
            Err(StreamscribeError::Transcription {
                message: "boom".to_string(),
            })
        });
        let _ = handle.join().await;
        assert_eq!(core.state(), JobState::Error);

        // Stopping re-surfaces the stored failure and must not leave the job
        // in the transient `Stopping` state.
        let outcome = core.stop().await;
        assert!(matches!(
            outcome,
            Err(StreamscribeError::Transcription { .. })
        ));
        assert_eq!(core.state(), JobState::Error);
        assert_eq!(
            core.last_error(),
            Some("Transcription failed: boom".to_string())
        );
    }
}
