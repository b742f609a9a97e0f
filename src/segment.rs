//! Chunk boundary planning.
//!
//! Partitions a media duration into bounded chunks for independent
//! transcription. Every chunk after the first is extended backward by a
//! small look-back overlap so speech spanning a boundary lands whole in at
//! least one chunk; the merger later removes what got recognized twice.

use crate::error::{Result, SubfuseError};

/// A bounded time-slice of the source media.
///
/// `start..end` is the extracted region, look-back included. `overlap` is
/// how many seconds at the head of the region belong nominally to the
/// previous chunk (0 for the first chunk).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk {
    /// Ordinal position, 0-based.
    pub index: usize,
    /// Global start time in seconds, look-back included.
    pub start: f64,
    /// Global end time in seconds, exclusive.
    pub end: f64,
    /// Seconds of look-back at the head of this chunk.
    pub overlap: f64,
}

impl Chunk {
    /// Extracted length in seconds, look-back included.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Where this chunk's exclusive ownership of the timeline begins.
    pub fn nominal_start(&self) -> f64 {
        self.start + self.overlap
    }
}

/// Plan chunk boundaries for `total_duration` seconds of media.
///
/// Inputs at most `chunk_length` long become a single chunk. Longer inputs
/// are cut at multiples of `chunk_length` (last chunk truncated, never
/// padded), and every chunk after the first starts `overlap` seconds
/// early. An overlap of at least half the chunk length is clamped down so
/// chunk starts keep advancing.
///
/// # Errors
///
/// Returns `InvalidDuration` when `total_duration` or `chunk_length` is
/// not positive, or `overlap` is negative.
pub fn segment(total_duration: f64, chunk_length: f64, overlap: f64) -> Result<Vec<Chunk>> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(SubfuseError::InvalidDuration {
            message: format!("total duration is {total_duration}s"),
        });
    }
    if !chunk_length.is_finite() || chunk_length <= 0.0 {
        return Err(SubfuseError::InvalidDuration {
            message: format!("chunk length is {chunk_length}s"),
        });
    }
    if !overlap.is_finite() || overlap < 0.0 {
        return Err(SubfuseError::InvalidDuration {
            message: format!("overlap is {overlap}s"),
        });
    }
    let overlap = overlap.min(chunk_length / 2.0);

    if total_duration <= chunk_length {
        return Ok(vec![Chunk {
            index: 0,
            start: 0.0,
            end: total_duration,
            overlap: 0.0,
        }]);
    }

    let mut chunks = Vec::new();
    let mut nominal_start = 0.0;
    while nominal_start < total_duration {
        let index = chunks.len();
        let nominal_end = (nominal_start + chunk_length).min(total_duration);
        let overlap = if index == 0 { 0.0 } else { overlap };
        chunks.push(Chunk {
            index,
            start: nominal_start - overlap,
            end: nominal_end,
            overlap,
        });
        nominal_start = nominal_end;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_partition(chunks: &[Chunk], total: f64, chunk_length: f64, overlap: f64) {
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].overlap, 0.0);
        assert!((chunks.last().unwrap().end - total).abs() < EPSILON);
        for pair in chunks.windows(2) {
            // non-overlap regions tile the duration exactly
            assert!((pair[1].nominal_start() - pair[0].end).abs() < EPSILON);
        }
        for chunk in chunks {
            assert!(chunk.end > chunk.start);
            assert!(chunk.duration() <= chunk_length + overlap + EPSILON);
        }
    }

    #[test]
    fn test_two_hour_input_hour_chunks() {
        let chunks = segment(7200.0, 3600.0, 10.0).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 3600.0);
        assert_eq!(chunks[1].start, 3590.0);
        assert_eq!(chunks[1].end, 7200.0);
        assert_eq!(chunks[1].overlap, 10.0);
        assert_eq!(chunks[1].nominal_start(), 3600.0);
        assert_partition(&chunks, 7200.0, 3600.0, 10.0);
    }

    #[test]
    fn test_short_input_is_single_chunk() {
        let chunks = segment(120.0, 3600.0, 10.0).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 120.0);
        assert_eq!(chunks[0].overlap, 0.0);
    }

    #[test]
    fn test_exact_multiple_has_no_sliver_chunk() {
        let chunks = segment(7200.0, 2400.0, 5.0).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_partition(&chunks, 7200.0, 2400.0, 5.0);
    }

    #[test]
    fn test_last_chunk_truncated_to_remainder() {
        let chunks = segment(5000.0, 3600.0, 8.0).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].end, 5000.0);
        assert!((chunks[1].duration() - (1400.0 + 8.0)).abs() < EPSILON);
        assert_partition(&chunks, 5000.0, 3600.0, 8.0);
    }

    #[test]
    fn test_indices_are_ordinal() {
        let chunks = segment(10000.0, 1000.0, 5.0).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
        assert_partition(&chunks, 10000.0, 1000.0, 5.0);
    }

    #[test]
    fn test_oversized_overlap_is_clamped() {
        let chunks = segment(100.0, 10.0, 50.0).unwrap();
        assert_partition(&chunks, 100.0, 10.0, 5.0);
        for chunk in &chunks[1..] {
            assert_eq!(chunk.overlap, 5.0);
        }
    }

    #[test]
    fn test_zero_overlap_allowed() {
        let chunks = segment(100.0, 30.0, 0.0).unwrap();
        assert_eq!(chunks.len(), 4);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert!(matches!(
            segment(0.0, 3600.0, 5.0),
            Err(SubfuseError::InvalidDuration { .. })
        ));
        assert!(matches!(
            segment(-10.0, 3600.0, 5.0),
            Err(SubfuseError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_chunk_length() {
        assert!(matches!(
            segment(100.0, 0.0, 5.0),
            Err(SubfuseError::InvalidDuration { .. })
        ));
        assert!(matches!(
            segment(100.0, -1.0, 5.0),
            Err(SubfuseError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_overlap_and_nan() {
        assert!(matches!(
            segment(100.0, 10.0, -0.5),
            Err(SubfuseError::InvalidDuration { .. })
        ));
        assert!(matches!(
            segment(f64::NAN, 10.0, 1.0),
            Err(SubfuseError::InvalidDuration { .. })
        ));
    }
}
