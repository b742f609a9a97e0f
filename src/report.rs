//! Run outcome accounting.
//!
//! Everything recoverable that happened during a run lands here instead of
//! aborting it: coverage gaps, dropped fragments, per-attempt errors,
//! skipped subtitle blocks. The CLI renders [`RunReport::summary`] after
//! the output files are written.

use crate::error::SubfuseError;
use crate::merge::Gap;
use crate::subtitle::srt::{ParseSkip, format_timestamp};
use std::fmt::Write as _;
use std::path::PathBuf;

/// What one pipeline run produced and what went wrong on the way.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Probed media duration in seconds
    pub media_duration: f64,
    /// Number of chunks the input was cut into
    pub chunk_count: usize,
    /// Fragments in the final timeline
    pub fragment_count: usize,
    /// Language the model detected, when the run started on `auto`
    pub detected_language: Option<String>,
    /// Whether an existing subtitle file bypassed transcription
    pub used_existing_srt: bool,
    /// Intervals with no subtitle coverage (chunks that failed every attempt)
    pub gaps: Vec<Gap>,
    /// Boundary duplicates removed by the merge
    pub duplicates_removed: usize,
    /// Degenerate fragments dropped during timeline repair
    pub dropped_fragments: usize,
    /// Every failed transcription attempt
    pub transcription_errors: Vec<SubfuseError>,
    /// Every fragment whose translation failed (original text kept)
    pub translation_errors: Vec<SubfuseError>,
    /// Subtitle blocks skipped while parsing an existing file
    pub parse_skips: Vec<ParseSkip>,
    /// Primary subtitle output
    pub srt_path: Option<PathBuf>,
    /// Translated subtitle output
    pub translated_srt_path: Option<PathBuf>,
    /// Hardsubbed video output
    pub hardsub_path: Option<PathBuf>,
    /// Working directory, when kept past the run
    pub work_dir: Option<PathBuf>,
}

impl RunReport {
    /// Whether anything recoverable went wrong during the run.
    pub fn has_problems(&self) -> bool {
        !self.gaps.is_empty()
            || !self.transcription_errors.is_empty()
            || !self.translation_errors.is_empty()
            || !self.parse_skips.is_empty()
            || self.dropped_fragments > 0
    }

    /// Human-readable multi-line summary for the terminal.
    pub fn summary(&self) -> String {
        let mut out = String::new();

        if self.used_existing_srt {
            let _ = writeln!(
                out,
                "Reused existing subtitles ({} fragments)",
                self.fragment_count
            );
        } else {
            let _ = write!(
                out,
                "Transcribed {} chunk{} into {} fragment{}",
                self.chunk_count,
                plural(self.chunk_count),
                self.fragment_count,
                plural(self.fragment_count),
            );
            match &self.detected_language {
                Some(language) => {
                    let _ = writeln!(out, " (detected language: {language})");
                }
                None => out.push('\n'),
            }
        }

        if let Some(path) = &self.srt_path {
            let _ = writeln!(out, "Subtitles: {}", path.display());
        }
        if let Some(path) = &self.translated_srt_path {
            let _ = writeln!(out, "Translated subtitles: {}", path.display());
        }
        if let Some(path) = &self.hardsub_path {
            let _ = writeln!(out, "Hardsubbed video: {}", path.display());
        }

        if self.duplicates_removed > 0 {
            let _ = writeln!(
                out,
                "Removed {} boundary duplicate{}",
                self.duplicates_removed,
                plural(self.duplicates_removed)
            );
        }

        if !self.gaps.is_empty() {
            let _ = writeln!(
                out,
                "⚠ {} gap{} in coverage:",
                self.gaps.len(),
                plural(self.gaps.len())
            );
            for gap in &self.gaps {
                let _ = writeln!(
                    out,
                    "  chunk {}: {} - {}",
                    gap.chunk_index,
                    format_timestamp(gap.start),
                    format_timestamp(gap.end)
                );
            }
        }

        if self.dropped_fragments > 0 {
            let _ = writeln!(
                out,
                "⚠ Dropped {} degenerate fragment{} during repair",
                self.dropped_fragments,
                plural(self.dropped_fragments)
            );
        }

        if !self.transcription_errors.is_empty() {
            let _ = writeln!(
                out,
                "⚠ {} failed transcription attempt{}:",
                self.transcription_errors.len(),
                plural(self.transcription_errors.len())
            );
            for error in &self.transcription_errors {
                let _ = writeln!(out, "  {error}");
            }
        }

        if !self.translation_errors.is_empty() {
            let _ = writeln!(
                out,
                "⚠ {} fragment{} kept original text after failed translation:",
                self.translation_errors.len(),
                plural(self.translation_errors.len())
            );
            for error in &self.translation_errors {
                let _ = writeln!(out, "  {error}");
            }
        }

        if !self.parse_skips.is_empty() {
            let _ = writeln!(
                out,
                "⚠ Skipped {} malformed subtitle block{}:",
                self.parse_skips.len(),
                plural(self.parse_skips.len())
            );
            for skip in &self.parse_skips {
                let _ = writeln!(out, "  line {}: {}", skip.line, skip.message);
            }
        }

        if let Some(dir) = &self.work_dir {
            let _ = writeln!(out, "Kept working files in {}", dir.display());
        }

        out
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
