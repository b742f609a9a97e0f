//! subfuse - Chunked subtitle transcription for long media files
//!
//! Splits long media into overlapping chunks, transcribes them in
//! parallel, and merges the results into one subtitle timeline.

// Enforce error handling discipline in library code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod media;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod segment;
pub mod subtitle;
pub mod transcribe;
pub mod translate;

// Composition root - needs the CLI definitions
#[cfg(feature = "cli")]
pub mod app;

// Core types (media → chunks → fragments → timeline)
pub use media::{HardsubStyle, MediaHandle, StreamInfo, probe};
pub use segment::{Chunk, segment};
pub use subtitle::{Fragment, Timeline};

// Pipeline
pub use merge::{Gap, MergeOutcome, MergeParams, merge};
pub use pipeline::PipelineOptions;
pub use report::RunReport;

// Backends
pub use transcribe::{
    ChunkTranscriber, ChunkTranscription, WhisperChunkConfig, WhisperChunkTranscriber,
};
pub use translate::{TranslateOptions, Translator};

// Error handling
pub use error::{Result, SubfuseError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        // In a git repo build, GIT_HASH is set → expect "0.3.1+<hash>"
        // In CI without git, expect the plain version
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(
                hash_part.len(),
                7,
                "Git hash should be 7 chars, got: {}",
                hash_part
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
