//! Default configuration constants for subfuse.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default chunk length in seconds.
///
/// One hour per chunk keeps recognition-model degradation on very long
/// inputs in check while still amortizing model startup cost. Inputs
/// shorter than this are transcribed as a single chunk.
pub const CHUNK_LENGTH_SECONDS: f64 = 3600.0;

/// Default look-back overlap in seconds.
///
/// Each chunk after the first starts this many seconds before its nominal
/// boundary so utterances spanning a boundary are fully captured in at
/// least one chunk. A tuning constant, not a derived value; anything in
/// the 5-10s range works for hour-scale chunks.
pub const OVERLAP_SECONDS: f64 = 8.0;

/// Fraction of the shorter fragment's duration that two fragments must
/// share before they count as time-overlapping duplicates during merge.
pub const DEDUP_OVERLAP_FRACTION: f64 = 0.5;

/// Default Whisper model name.
///
/// "base" (multilingual) supports auto-detection of any language.
/// Use "base.en" explicitly for English-only optimized transcription.
pub const DEFAULT_MODEL: &str = "base";

/// Default language code for transcription.
///
/// "auto" lets the model detect the spoken language on the first chunk;
/// the detected code is then forced on every later chunk of the same run.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Suffix for English-only model variants.
pub const ENGLISH_ONLY_SUFFIX: &str = ".en";

/// Audio sample rate in Hz for extracted chunk audio.
///
/// 16kHz mono is what Whisper-family models expect; extraction always
/// resamples to this rate.
pub const SAMPLE_RATE: u32 = 16000;

/// Default number of concurrent chunk transcriptions.
///
/// Recognition models are memory-heavy; more than 1-2 workers rarely pays
/// off and can exhaust accelerator memory. Extraction runs inside the
/// worker so it needs no separate cap.
pub const TRANSCRIBE_WORKERS: usize = 1;

/// Total transcription attempts per chunk (first try plus retries).
///
/// After the last failed attempt the chunk's interval becomes a recorded
/// gap instead of aborting the run.
pub const MAX_TRANSCRIPTION_ATTEMPTS: u32 = 2;

/// Delay between translation requests in milliseconds.
///
/// Public translation endpoints rate-limit aggressively; 100ms between
/// dispatches stays under typical limits without stalling long timelines.
pub const TRANSLATE_DELAY_MS: u64 = 100;

/// Maximum in-flight translation requests.
pub const TRANSLATE_CONCURRENCY: usize = 4;

/// Default translation service endpoint (a local LibreTranslate instance).
pub const TRANSLATE_BASE_URL: &str = "http://localhost:5000";

/// Default hardsub font size.
pub const HARDSUB_FONT_SIZE: u32 = 24;

/// Default hardsub font family.
pub const HARDSUB_FONT_NAME: &str = "NanumGothic";

/// Default hardsub text color name.
pub const HARDSUB_FONT_COLOR: &str = "white";

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}
