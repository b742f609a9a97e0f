//! Subtitle data model: timed text fragments and the merged timeline.

pub mod repair;
pub mod srt;

/// One timed unit of recognized or translated text.
///
/// Timestamps are chunk-local as emitted by a transcriber and global after
/// the merge. `source_chunk` records which chunk produced the fragment so
/// boundary deduplication can prefer earlier chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Start time in seconds. Never negative.
    pub start: f64,
    /// End time in seconds. Always >= start.
    pub end: f64,
    /// Recognized or translated text.
    pub text: String,
    /// Ordinal of the chunk this fragment came from.
    pub source_chunk: usize,
}

impl Fragment {
    /// Create a fragment attributed to chunk 0.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            source_chunk: 0,
        }
    }

    /// Attribute the fragment to a specific source chunk.
    pub fn with_source_chunk(mut self, chunk: usize) -> Self {
        self.source_chunk = chunk;
        self
    }

    /// Fragment duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Shift both timestamps by `offset` seconds (chunk-local to global).
    pub fn rebase(&mut self, offset: f64) {
        self.start += offset;
        self.end += offset;
    }
}

/// The canonical subtitle representation: globally time-ordered,
/// non-overlapping fragments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    /// Fragments in global time order.
    pub fragments: Vec<Fragment>,
}

impl Timeline {
    /// Wrap a fragment sequence. Ordering is the caller's responsibility;
    /// the merger is the only producer of guaranteed-ordered timelines.
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// True when the timeline holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// End time of the last fragment, or 0.0 for an empty timeline.
    pub fn duration(&self) -> f64 {
        self.fragments.last().map_or(0.0, |f| f.end)
    }

    /// Check the timeline invariant: time-ordered, non-overlapping,
    /// every fragment non-degenerate with non-negative start.
    pub fn is_consistent(&self) -> bool {
        let mut prev_end = 0.0_f64;
        for fragment in &self.fragments {
            if fragment.start < 0.0 || fragment.end < fragment.start {
                return false;
            }
            if fragment.start < prev_end {
                return false;
            }
            prev_end = fragment.end;
        }
        true
    }
}

/// Normalize text for duplicate comparison: lowercase, strip punctuation,
/// collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
