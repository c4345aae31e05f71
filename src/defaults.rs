//! Default windowing constants for streamscribe.
//!
//! These values are tuned for Whisper-family models, which decode a bounded
//! context of up to 30 seconds of 16kHz mono audio per invocation.

/// Audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition models and the rate all
/// windowing constants below are derived from.
pub const SAMPLE_RATE: usize = 16_000;

/// Minimum number of samples before a window is worth decoding (100ms).
///
/// Below this the model produces nothing useful and the poll loop should
/// keep waiting for more audio instead.
pub const MIN_SAMPLES: usize = SAMPLE_RATE / 10;

/// Number of samples in a finalized frame (29 seconds).
///
/// One second short of the model's 30-second context so that the overlap
/// prepended from the previous frame still fits within the context limit.
pub const FRAME_SIZE: usize = 29 * SAMPLE_RATE;

/// Number of samples re-included from the previous frame (50ms).
///
/// Alleviates words clipped at a frame boundary. Determined empirically.
pub const OVERLAP_SIZE: usize = 800;

/// Poll backoff interval in milliseconds when no window is ready.
pub const POLL_INTERVAL_MS: u64 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_samples_smaller_than_frame() {
        assert!(MIN_SAMPLES < FRAME_SIZE);
    }

    #[test]
    fn overlap_smaller_than_frame() {
        assert!(OVERLAP_SIZE < FRAME_SIZE);
    }

    #[test]
    fn frame_plus_overlap_fits_model_context() {
        assert!(FRAME_SIZE + OVERLAP_SIZE <= 30 * SAMPLE_RATE);
    }
}
