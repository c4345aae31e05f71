//! Transcript accumulation with high-water-mark merging.
//!
//! A streaming job re-decodes the same open audio frame as new samples
//! trickle in, so successive partial results overlap and partially supersede
//! each other. The transcript keeps a high-water mark below which segments
//! are settled (never rewritten); everything beyond the mark is tentative and
//! is replaced wholesale by the next, fuller re-decode. The mark advances
//! only when the window that produced a result was a finalized frame.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A timed unit of recognized text.
///
/// Produced only by the model capability; immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset within the decoded window, in milliseconds.
    pub start_ms: u64,
    /// End offset within the decoded window, in milliseconds.
    pub end_ms: u64,
    /// Recognized text.
    pub text: String,
}

impl Segment {
    /// Creates a new segment.
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }
}

/// Ordered segment sequence with a settled/tentative boundary.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    segments: Vec<Segment>,
    /// Index below which segments are settled and never rewritten.
    high_water_mark: usize,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a freshly decoded partial result into the transcript.
    ///
    /// Segments below the high-water mark are retained unchanged. The
    /// tentative tail beyond the mark is replaced by `new_segments` (a later,
    /// fuller re-decode of the same open window supersedes an earlier partial
    /// one). When `advance_mark` is true the mark moves past the merged
    /// segments, settling them permanently.
    pub fn merge_at_high_water_mark(&mut self, new_segments: Vec<Segment>, advance_mark: bool) {
        self.segments.truncate(self.high_water_mark);
        self.segments.extend(new_segments);
        if advance_mark {
            self.high_water_mark = self.segments.len();
        }
    }

    /// Appends a segment to the tentative tail.
    ///
    /// Used by the model capability while decoding a window.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Returns all segments, settled and tentative.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the index below which segments are settled.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Returns the full text by concatenating all segment text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the transcript holds no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Clears all segments and resets the high-water mark.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.high_water_mark = 0;
    }
}

/// Shared handle to a transcript, safe to hand to the model capability and
/// observe from another task concurrently.
#[derive(Debug, Clone, Default)]
pub struct SharedTranscript {
    inner: Arc<Mutex<Transcript>>,
}

impl SharedTranscript {
    /// Creates an empty shared transcript.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Transcript) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// See [`Transcript::merge_at_high_water_mark`].
    pub fn merge_at_high_water_mark(&self, new_segments: Vec<Segment>, advance_mark: bool) {
        self.with_inner(|t| t.merge_at_high_water_mark(new_segments, advance_mark));
    }

    /// Appends a segment to the tentative tail.
    pub fn push(&self, segment: Segment) {
        self.with_inner(|t| t.push(segment));
    }

    /// Returns a point-in-time copy of all segments.
    pub fn snapshot(&self) -> Vec<Segment> {
        self.with_inner(|t| t.segments().to_vec())
    }

    /// Returns the full text by concatenating all segment text.
    pub fn text(&self) -> String {
        self.with_inner(|t| t.text())
    }

    /// Returns the index below which segments are settled.
    pub fn high_water_mark(&self) -> usize {
        self.with_inner(|t| t.high_water_mark())
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.with_inner(|t| t.len())
    }

    /// Returns true if the transcript holds no segments.
    pub fn is_empty(&self) -> bool {
        self.with_inner(|t| t.is_empty())
    }

    /// Clears all segments and resets the high-water mark.
    pub fn reset(&self) {
        self.with_inner(|t| t.reset());
    }
}
