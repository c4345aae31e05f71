//! Error types for streamscribe.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamscribeError {
    // Lifecycle errors
    #[error("Job has not been started")]
    JobNotStarted,

    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    // Model errors
    #[error("Failed to load model {model}: {message}")]
    ModelLoad { model: String, message: String },

    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    // Cooperative cancellation. Raised by the model capability when it
    // observes a signalled token; swallowed by the job during stop/restart.
    #[error("Transcription was cancelled")]
    Cancelled,

    // Streaming source errors
    #[error("Streaming source failed: {message}")]
    Source { message: String },
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, StreamscribeError>;
