//! Error types for subfuse.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubfuseError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Fatal input errors, rejected before any work starts
    #[error("Invalid duration: {message}")]
    InvalidDuration { message: String },

    // Media collaborator errors (ffprobe/ffmpeg)
    #[error("Media probe failed for {path}: {message}")]
    MediaProbe { path: String, message: String },

    #[error("Media operation failed: {message}")]
    Media { message: String },

    // Per-chunk transcription errors: recoverable, retried then gapped
    #[error("Transcription failed for chunk {chunk_index}: {message}")]
    Transcription { chunk_index: usize, message: String },

    #[error("Transcription model not found at {path}")]
    TranscriptionModelNotFound { path: String },

    // Backend-level transcription errors, not tied to any one chunk
    #[error("Transcription backend error: {message}")]
    TranscriptionBackend { message: String },

    // Per-block subtitle parse errors: recoverable, block skipped
    #[error("Malformed subtitle block at line {line}: {message}")]
    MalformedSubtitle { line: usize, message: String },

    // Per-fragment translation errors: recoverable, original text kept
    #[error("Translation failed for fragment {fragment_index}: {message}")]
    Translation {
        fragment_index: usize,
        message: String,
    },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SubfuseError>;
