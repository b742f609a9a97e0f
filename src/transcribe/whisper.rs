//! Whisper-based chunk transcription.
//!
//! Wraps whisper-rs behind the [`ChunkTranscriber`] trait. One context is
//! loaded per process and shared across workers behind a `Mutex`; each
//! chunk runs on its own state, so segment timestamps are chunk-local.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature to be enabled and cmake to be
//! installed. To build with Whisper support:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::defaults;
use crate::error::{Result, SubfuseError};
use crate::segment::Chunk;
use crate::transcribe::{ChunkTranscriber, ChunkTranscription};
use std::path::{Path, PathBuf};

#[cfg(feature = "whisper")]
use crate::subtitle::Fragment;
#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for the Whisper chunk transcriber.
#[derive(Debug, Clone)]
pub struct WhisperChunkConfig {
    /// Model size name (e.g., "base", "small", "base.en")
    pub model: String,
    /// Explicit model file path; overrides `model`/`models_dir` resolution
    pub model_path: Option<PathBuf>,
    /// Directory holding `ggml-{model}.bin` files
    pub models_dir: Option<PathBuf>,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
}

impl Default for WhisperChunkConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            model_path: None,
            models_dir: None,
            threads: None,
        }
    }
}

impl WhisperChunkConfig {
    /// Resolve the model file on disk.
    ///
    /// An explicit `model_path` wins; otherwise the model size name is
    /// expanded to `ggml-{model}.bin` under `models_dir` (or a local
    /// `models/` directory when no dir is configured).
    pub fn resolved_model_path(&self) -> PathBuf {
        if let Some(path) = &self.model_path {
            return path.clone();
        }
        let dir = self
            .models_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("models"));
        dir.join(format!("ggml-{}.bin", self.model))
    }
}

/// Whisper-based chunk transcriber implementation.
///
/// The WhisperContext is wrapped in a Mutex to ensure thread safety, so
/// concurrent workers serialize on inference while their audio extraction
/// still overlaps.
///
/// # Feature Gate
///
/// This type is only available when the `whisper` feature is enabled.
#[cfg(feature = "whisper")]
pub struct WhisperChunkTranscriber {
    context: Mutex<WhisperContext>,
    config: WhisperChunkConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperChunkTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperChunkTranscriber")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper-based chunk transcriber placeholder (without whisper feature).
///
/// This is a stub implementation that returns errors when used.
/// Enable the `whisper` feature to use real transcription.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperChunkTranscriber {
    config: WhisperChunkConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl WhisperChunkTranscriber {
    /// Create a new Whisper chunk transcriber.
    ///
    /// # Arguments
    /// * `config` - Configuration for the transcriber
    ///
    /// # Returns
    /// A new WhisperChunkTranscriber instance or an error if the model file doesn't exist
    ///
    /// # Errors
    /// Returns `SubfuseError::TranscriptionModelNotFound` if the model file doesn't exist
    /// Returns `SubfuseError::TranscriptionBackend` if model loading fails
    pub fn new(config: WhisperChunkConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        let model_path = config.resolved_model_path();
        if !model_path.exists() {
            return Err(SubfuseError::TranscriptionModelNotFound {
                path: model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_from_path(&model_path);

        let mut context_params = WhisperContextParameters::default();
        // Enable flash attention: uses fused attention kernels that avoid the standalone
        // softmax CUDA kernel, which crashes on Blackwell GPUs (sm_120) with ggml <= 1.7.6
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| SubfuseError::TranscriptionBackend {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| SubfuseError::TranscriptionBackend {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperChunkConfig {
        &self.config
    }

    fn read_chunk_audio(path: &Path) -> Result<Vec<f32>> {
        read_chunk_audio(path)
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperChunkTranscriber {
    /// Create a new Whisper chunk transcriber (stub implementation).
    ///
    /// Transcription returns an error indicating that the whisper feature is
    /// not enabled; model resolution still behaves like the real backend.
    pub fn new(config: WhisperChunkConfig) -> Result<Self> {
        let model_path = config.resolved_model_path();
        if !model_path.exists() {
            return Err(SubfuseError::TranscriptionModelNotFound {
                path: model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_from_path(&model_path);

        Ok(Self { config, model_name })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperChunkConfig {
        &self.config
    }

    /// Decode a chunk WAV to 16kHz mono f32 samples.
    ///
    /// This function is available even without the whisper feature for testing.
    pub fn read_chunk_audio(path: &Path) -> Result<Vec<f32>> {
        read_chunk_audio(path)
    }
}

/// Extract the model name from the file path (stem of `ggml-base.bin` is `ggml-base`).
fn model_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Read a chunk WAV and decode to f32 samples normalized to [-1.0, 1.0].
///
/// Extraction emits 16kHz mono PCM, but the decoder tolerates stereo and
/// other sample rates (downmix by averaging, linear resample) so the
/// backend also accepts caller-provided WAVs.
fn read_chunk_audio(path: &Path) -> Result<Vec<f32>> {
    let mut wav_reader = hound::WavReader::open(path).map_err(|e| SubfuseError::Media {
        message: format!("Failed to parse WAV file {}: {}", path.display(), e),
    })?;

    let spec = wav_reader.spec();
    let source_rate = spec.sample_rate;
    let source_channels = spec.channels;

    let raw_samples: Vec<i16> = wav_reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SubfuseError::Media {
            message: format!("Failed to read WAV samples from {}: {}", path.display(), e),
        })?;

    // Convert to mono if stereo
    let mono_samples = if source_channels == 2 {
        raw_samples
            .chunks_exact(2)
            .map(|pair| {
                let left = pair[0] as i32;
                let right = pair[1] as i32;
                ((left + right) / 2) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    // Resample to 16kHz if needed
    let samples = if source_rate != defaults::SAMPLE_RATE {
        resample(&mono_samples, source_rate, defaults::SAMPLE_RATE)
    } else {
        mono_samples
    };

    // Whisper expects f32 normalized to [-1.0, 1.0]; input is 16-bit PCM
    Ok(samples
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect())
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(feature = "whisper")]
impl ChunkTranscriber for WhisperChunkTranscriber {
    fn transcribe_chunk(
        &self,
        chunk: &Chunk,
        audio_path: &Path,
        language_hint: &str,
    ) -> Result<ChunkTranscription> {
        let audio = Self::read_chunk_audio(audio_path)?;

        // Lock the context for thread-safe access
        let context = self
            .context
            .lock()
            .map_err(|e| SubfuseError::TranscriptionBackend {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        // Create a new state for this chunk
        let mut state = context
            .create_state()
            .map_err(|e| SubfuseError::Transcription {
                chunk_index: chunk.index,
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        // Configure transcription parameters
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // Set language
        if language_hint == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(language_hint));
        }

        // Set number of threads if specified
        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        // Run inference
        state
            .full(params, &audio)
            .map_err(|e| SubfuseError::Transcription {
                chunk_index: chunk.index,
                message: format!("Whisper inference failed: {}", e),
            })?;

        // Extract detected language
        let lang_id = state.full_lang_id_from_state();
        let detected_language = whisper_rs::get_lang_str(lang_id)
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty());

        // Segment timestamps are in centiseconds (10ms units), chunk-local
        let mut fragments = Vec::new();
        for segment in state.as_iter() {
            let text = segment.to_string();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let start = segment.start_timestamp() as f64 / 100.0;
            let end = segment.end_timestamp() as f64 / 100.0;
            if end <= start {
                continue;
            }
            fragments.push(Fragment::new(start, end, text));
        }

        Ok(ChunkTranscription {
            fragments,
            detected_language,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl ChunkTranscriber for WhisperChunkTranscriber {
    fn transcribe_chunk(
        &self,
        _chunk: &Chunk,
        _audio_path: &Path,
        _language_hint: &str,
    ) -> Result<ChunkTranscription> {
        Err(SubfuseError::TranscriptionBackend {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}
