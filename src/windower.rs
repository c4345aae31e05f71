//! Sliding-window frame selection over a growing sample buffer.
//!
//! The windower receives streaming samples from the source (e.g. a
//! microphone) and decides what slice of audio to hand to the model next.
//! The model operates efficiently on a bounded window, so the open frame is
//! re-decoded on every poll as new samples trickle in (low-latency partial
//! results) and the cursor only commits forward once a full frame's worth of
//! data has been seen. A small overlap from the previous frame is re-included
//! for context so words clipped at a frame boundary are not lost.
//!
//! Exactly two actors touch the buffer concurrently: the source (writer, via
//! `append`) and the job's poll loop (reader, via `next_window`). Access is
//! serialized through an internal mutex.

use crate::defaults;
use crate::error::{Result, StreamscribeError};
use std::sync::Mutex;
use tracing::trace;

/// Windowing sizes, in samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowerConfig {
    /// Minimum data required before emitting any window (default: 100ms).
    pub min_samples: usize,
    /// Length of a finalized frame (default: 29s).
    pub frame_size: usize,
    /// Trailing context re-included from the previous frame (default: 50ms).
    pub overlap_size: usize,
}

impl Default for WindowerConfig {
    fn default() -> Self {
        Self {
            min_samples: defaults::MIN_SAMPLES,
            frame_size: defaults::FRAME_SIZE,
            overlap_size: defaults::OVERLAP_SIZE,
        }
    }
}

impl WindowerConfig {
    /// Validates the size relationships.
    ///
    /// `min_samples` must be smaller than `frame_size`, and `overlap_size`
    /// must be smaller than `frame_size` or the cursor can never advance.
    pub fn validate(&self) -> Result<()> {
        if self.min_samples >= self.frame_size {
            return Err(StreamscribeError::InvalidConfig {
                key: "min_samples".to_string(),
                message: format!(
                    "must be smaller than frame_size ({} >= {})",
                    self.min_samples, self.frame_size
                ),
            });
        }
        if self.overlap_size >= self.frame_size {
            return Err(StreamscribeError::InvalidConfig {
                key: "overlap_size".to_string(),
                message: format!(
                    "must be smaller than frame_size ({} >= {})",
                    self.overlap_size, self.frame_size
                ),
            });
        }
        Ok(())
    }
}

/// A slice of audio selected for the next model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// The selected samples, including any overlap from the previous frame.
    pub samples: Vec<f32>,
    /// True when the window closed a full frame and the cursor committed
    /// forward. Gates high-water-mark advancement during merging.
    pub is_final_frame: bool,
}

/// Buffer and cursor state, guarded together so append and window
/// computation cannot interleave.
#[derive(Debug, Default)]
struct WindowerState {
    buffer: Vec<f32>,
    /// Start of the currently open, not-yet-finalized frame.
    frame_from: usize,
    /// End index of the most recently emitted window.
    last_returned_to: Option<usize>,
}

/// Stateful frame selector over an append-only sample buffer.
#[derive(Debug)]
pub struct FrameWindower {
    config: WindowerConfig,
    state: Mutex<WindowerState>,
}

impl FrameWindower {
    /// Creates a windower with the given sizes.
    ///
    /// Fails with `InvalidConfig` if the size relationships do not hold.
    pub fn new(config: WindowerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(WindowerState::default()),
        })
    }

    /// Creates a windower with the default Whisper-tuned sizes.
    pub fn with_defaults() -> Self {
        Self {
            config: WindowerConfig::default(),
            state: Mutex::new(WindowerState::default()),
        }
    }

    /// Returns the configured sizes.
    pub fn config(&self) -> &WindowerConfig {
        &self.config
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, WindowerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Extends the sample buffer.
    pub fn append(&self, samples: &[f32]) {
        let mut state = self.lock_state();
        state.buffer.extend_from_slice(samples);
    }

    /// Returns the number of buffered samples.
    pub fn len(&self) -> usize {
        self.lock_state().buffer.len()
    }

    /// Returns true if no samples have been buffered.
    pub fn is_empty(&self) -> bool {
        self.lock_state().buffer.is_empty()
    }

    /// Selects the next window to decode, if any.
    ///
    /// Returns `None` when there is nothing new to decode: the buffer is
    /// empty, no samples arrived since the cursor reached the buffer's end,
    /// fewer than `min_samples` are available, or the exact same window was
    /// already handed out. Never returns the identical window twice in a row.
    ///
    /// When the available data covers a full frame the window is marked
    /// final and the cursor commits forward; future windows start past that
    /// point, reaching back only `overlap_size` samples for context.
    pub fn next_window(&self) -> Option<Window> {
        let mut state = self.lock_state();

        if state.buffer.is_empty() {
            return None;
        }
        // No samples added after the processing checkpoint yet.
        if state.frame_from == state.buffer.len() {
            return None;
        }

        // Range limited to at most frame_size samples.
        let to = (state.frame_from + self.config.frame_size).min(state.buffer.len());
        let is_final_frame = to - state.frame_from == self.config.frame_size;

        // Overlap is applied after the finalization test so it does not
        // distort the frame-size arithmetic. Don't go below zero.
        let from = state.frame_from.saturating_sub(self.config.overlap_size);

        if to - from < self.config.min_samples {
            return None;
        }

        // Already handed out: nothing new to decode.
        if let Some(last_to) = state.last_returned_to {
            // Cannot regress under monotonic buffer growth.
            debug_assert!(to >= last_to, "window end regressed: {} < {}", to, last_to);
            if last_to == to {
                return None;
            }
        }

        let samples = state.buffer[from..to].to_vec();
        state.last_returned_to = Some(to);
        if is_final_frame {
            state.frame_from = to;
        }

        trace!(
            from,
            to,
            is_final_frame,
            buffered = state.buffer.len(),
            "emitting window"
        );

        Some(Window {
            samples,
            is_final_frame,
        })
    }

    /// Clears the buffer and resets the cursor.
    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.buffer.clear();
        state.frame_from = 0;
        state.last_returned_to = None;
    }

    /// Resets the cursor without touching the buffer.
    pub fn reset_cursor(&self) {
        let mut state = self.lock_state();
        state.frame_from = 0;
        state.last_returned_to = None;
    }
}
