//! streamscribe - incremental real-time speech transcription
//!
//! Orchestrates a batch-oriented speech model over an unbounded live audio
//! stream: a frame windower re-segments the growing sample buffer into
//! overlapping model-sized windows, a streaming job drives the
//! poll→transcribe→merge loop with cooperative cancellation, and a
//! high-water-mark transcript settles text as each frame finalizes.
//!
//! The model itself, audio capture, and weight management are external
//! capabilities supplied by the embedding application (see [`SpeechModel`],
//! [`StreamingSource`], and [`ModelProvider`]).

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod cancel;
pub mod catalog;
pub mod defaults;
pub mod error;
pub mod job;
pub mod model;
pub mod source;
pub mod transcript;
pub mod windower;

// Capability traits (model, provider, source)
pub use model::{
    CachingModelProvider, MockLoader, MockModel, ModelLoader, ModelProvider, SpeechModel,
    TranscribeOptions,
};
pub use source::{ChunkedSource, ChunkedSourceConfig, StreamingSource};

// Jobs
pub use job::one_shot::OneShotJob;
pub use job::streaming::{StreamingConfig, StreamingJob};
pub use job::{JobState, WorkHandle};

// Windowing and transcript
pub use cancel::CancelToken;
pub use transcript::{Segment, SharedTranscript, Transcript};
pub use windower::{FrameWindower, Window, WindowerConfig};

// Error handling
pub use error::{Result, StreamscribeError};
