//! Per-chunk transcription: the recognition-model boundary.
//!
//! The model is a black box behind [`ChunkTranscriber`]; chunks never
//! depend on each other's output, so implementations can be driven from a
//! worker pool. Timestamps in a [`ChunkTranscription`] are chunk-local;
//! the merge rebases them.

pub mod pool;
pub mod whisper;

pub use pool::{ChunkOutcome, PoolConfig, ProgressEvent, transcribe_chunks};
pub use whisper::{WhisperChunkConfig, WhisperChunkTranscriber};

use crate::error::{Result, SubfuseError};
use crate::segment::Chunk;
use crate::subtitle::Fragment;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// What one chunk's transcription produced.
#[derive(Debug, Clone, Default)]
pub struct ChunkTranscription {
    /// Timed text with chunk-local timestamps in `[0, chunk duration)`.
    pub fragments: Vec<Fragment>,
    /// Language the model detected, when it reports one. Used to pin the
    /// hint for later chunks when the run started with `auto`.
    pub detected_language: Option<String>,
}

/// Trait for chunk-level speech-to-text transcription.
///
/// This trait allows swapping implementations (real Whisper vs mock).
pub trait ChunkTranscriber: Send + Sync {
    /// Transcribe one extracted chunk.
    ///
    /// # Arguments
    /// * `chunk` - The chunk being transcribed (read-only; its index keys
    ///   error attribution)
    /// * `audio_path` - 16kHz mono WAV extracted for this chunk
    /// * `language_hint` - Language code, or `auto` for detection
    ///
    /// # Returns
    /// Chunk-local fragments or a per-chunk `Transcription` error
    fn transcribe_chunk(
        &self,
        chunk: &Chunk,
        audio_path: &Path,
        language_hint: &str,
    ) -> Result<ChunkTranscription>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement ChunkTranscriber for Arc<T> to allow sharing across workers.
impl<T: ChunkTranscriber + ?Sized> ChunkTranscriber for Arc<T> {
    fn transcribe_chunk(
        &self,
        chunk: &Chunk,
        audio_path: &Path,
        language_hint: &str,
    ) -> Result<ChunkTranscription> {
        (**self).transcribe_chunk(chunk, audio_path, language_hint)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock chunk transcriber for testing.
///
/// Canned fragments per chunk index, optional failure injection with a
/// countdown (fail N times, then succeed) so retry paths can be tested,
/// and a log of the language hints each call received.
#[derive(Debug, Default)]
pub struct MockChunkTranscriber {
    model_name: String,
    default_fragments: Vec<Fragment>,
    per_chunk: HashMap<usize, Vec<Fragment>>,
    failures: Mutex<HashMap<usize, u32>>,
    detected_language: Option<String>,
    hints_seen: Mutex<Vec<(usize, String)>>,
}

impl MockChunkTranscriber {
    /// Create a new mock with no canned fragments.
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            ..Self::default()
        }
    }

    /// Fragments returned for chunks without a per-chunk override.
    pub fn with_fragments(mut self, fragments: Vec<Fragment>) -> Self {
        self.default_fragments = fragments;
        self
    }

    /// Fragments returned for one specific chunk index.
    pub fn with_chunk_fragments(mut self, chunk_index: usize, fragments: Vec<Fragment>) -> Self {
        self.per_chunk.insert(chunk_index, fragments);
        self
    }

    /// Make `chunk_index` fail its next `times` transcription attempts.
    pub fn with_chunk_failures(self, chunk_index: usize, times: u32) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(chunk_index, times);
        }
        self
    }

    /// Language the mock reports as detected.
    pub fn with_detected_language(mut self, language: &str) -> Self {
        self.detected_language = Some(language.to_string());
        self
    }

    /// Language hints received so far, as `(chunk_index, hint)` pairs in
    /// call order.
    pub fn hints_seen(&self) -> Vec<(usize, String)> {
        self.hints_seen.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl ChunkTranscriber for MockChunkTranscriber {
    fn transcribe_chunk(
        &self,
        chunk: &Chunk,
        _audio_path: &Path,
        language_hint: &str,
    ) -> Result<ChunkTranscription> {
        if let Ok(mut hints) = self.hints_seen.lock() {
            hints.push((chunk.index, language_hint.to_string()));
        }

        let should_fail = self
            .failures
            .lock()
            .ok()
            .map(|mut failures| match failures.get_mut(&chunk.index) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            })
            .unwrap_or(false);
        if should_fail {
            return Err(SubfuseError::Transcription {
                chunk_index: chunk.index,
                message: "mock transcription failure".to_string(),
            });
        }

        let fragments = self
            .per_chunk
            .get(&chunk.index)
            .unwrap_or(&self.default_fragments)
            .clone();
        Ok(ChunkTranscription {
            fragments,
            detected_language: self.detected_language.clone(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}
