//! Timeline merging: rebase, boundary dedup, ordering repair.
//!
//! Per-chunk transcriptions arrive with chunk-local timestamps and may
//! recognize the same boundary-spanning utterance twice (once in the
//! chunk that owns it, once in the next chunk's look-back region). The
//! merge rebases everything onto the global clock, removes boundary
//! duplicates with earlier-chunk-wins as the sole tie-break, then repairs
//! residual ordering violations. Failed chunks leave recorded gaps, never
//! placeholders.

use crate::defaults::DEDUP_OVERLAP_FRACTION;
use crate::segment::Chunk;
use crate::subtitle::{Fragment, Timeline, normalize_text};

/// Tuning parameters for the merge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeParams {
    /// Fraction of the shorter fragment's duration two fragments must
    /// share to count as time-overlapping duplicates.
    pub dedup_overlap_fraction: f64,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            dedup_overlap_fraction: DEDUP_OVERLAP_FRACTION,
        }
    }
}

/// An interval left without subtitle coverage by a failed chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    /// Chunk whose transcription failed.
    pub chunk_index: usize,
    /// Start of the uncovered interval (the chunk's nominal start; its
    /// look-back region belongs to the previous chunk).
    pub start: f64,
    /// End of the uncovered interval.
    pub end: f64,
}

/// What a merge produced besides the timeline itself.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// The ordered, non-overlapping, deduplicated timeline.
    pub timeline: Timeline,
    /// Intervals with no coverage because their chunk failed.
    pub gaps: Vec<Gap>,
    /// Fragments dropped by ordering repair (degenerate after clamping).
    /// Lossy-merge warnings, not errors.
    pub dropped: Vec<Fragment>,
    /// Boundary duplicates removed.
    pub duplicates_removed: usize,
}

/// Merge per-chunk transcription results into one global timeline.
///
/// `results[i]` holds chunk `i`'s fragments with chunk-local timestamps,
/// or None when the chunk failed; a missing trailing entry counts as
/// failed. Deterministic: identical inputs and parameters always produce
/// identical output.
pub fn merge(
    chunks: &[Chunk],
    mut results: Vec<Option<Vec<Fragment>>>,
    params: &MergeParams,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    // Rebase chunk-local fragments onto the global clock, chunk by chunk.
    let mut kept_by_chunk: Vec<Vec<Fragment>> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match results.get_mut(chunk.index).and_then(Option::take) {
            Some(fragments) => {
                let rebased = fragments
                    .into_iter()
                    .map(|mut fragment| {
                        fragment.rebase(chunk.start);
                        fragment.source_chunk = chunk.index;
                        fragment
                    })
                    .collect();
                kept_by_chunk.push(rebased);
            }
            None => {
                outcome.gaps.push(Gap {
                    chunk_index: chunk.index,
                    start: chunk.nominal_start(),
                    end: chunk.end,
                });
                kept_by_chunk.push(Vec::new());
            }
        }
    }

    // Boundary dedup: fragments of chunk i+1 inside the shared look-back
    // window lose to matching fragments of chunk i.
    for i in 1..chunks.len() {
        let chunk = &chunks[i];
        if chunk.overlap <= 0.0 {
            continue;
        }
        let region = (chunk.start, chunk.nominal_start());
        let previous: Vec<Fragment> = kept_by_chunk[i - 1]
            .iter()
            .filter(|f| intersects(f, region))
            .cloned()
            .collect();
        if previous.is_empty() {
            continue;
        }
        let current = std::mem::take(&mut kept_by_chunk[i]);
        for fragment in current {
            let duplicate = intersects(&fragment, region)
                && previous
                    .iter()
                    .any(|p| is_duplicate(p, &fragment, params.dedup_overlap_fraction));
            if duplicate {
                outcome.duplicates_removed += 1;
            } else {
                kept_by_chunk[i].push(fragment);
            }
        }
    }

    // Ordering repair: sort globally (stable, so equal starts keep chunk
    // order), clamp residual overlaps, drop what clamping degenerates.
    let mut all: Vec<Fragment> = kept_by_chunk.into_iter().flatten().collect();
    all.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut prev_end = 0.0_f64;
    for fragment in all {
        let mut repaired = fragment.clone();
        if repaired.start < prev_end {
            repaired.start = prev_end;
        }
        if repaired.start >= repaired.end {
            outcome.dropped.push(fragment);
            continue;
        }
        prev_end = repaired.end;
        outcome.timeline.fragments.push(repaired);
    }

    outcome
}

/// Re-normalize an existing timeline: sort, clamp, drop degenerates.
///
/// Runs the merge with the timeline as the sole chunk at offset 0, so a
/// timeline that already satisfies the invariant comes back unchanged.
pub fn normalize(timeline: Timeline, params: &MergeParams) -> MergeOutcome {
    let chunk = Chunk {
        index: 0,
        start: 0.0,
        end: timeline.duration(),
        overlap: 0.0,
    };
    merge(&[chunk], vec![Some(timeline.fragments)], params)
}

fn intersects(fragment: &Fragment, region: (f64, f64)) -> bool {
    fragment.end.min(region.1) - fragment.start.max(region.0) > 0.0
}

fn is_duplicate(a: &Fragment, b: &Fragment, overlap_fraction: f64) -> bool {
    if normalize_text(&a.text) == normalize_text(&b.text) {
        return true;
    }
    let shared = a.end.min(b.end) - a.start.max(b.start);
    if shared <= 0.0 {
        return false;
    }
    let shorter = a.duration().min(b.duration());
    shorter > 0.0 && shared > overlap_fraction * shorter
}
