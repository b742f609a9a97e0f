//! Layered run configuration.
//!
//! Values resolve in order: built-in defaults, then the TOML config file,
//! then `SUBFUSE_*` environment overrides, then CLI flags. Every section
//! and field is optional in the file; missing pieces fall back to
//! [`crate::defaults`].

use crate::defaults;
use crate::error::{Result, SubfuseError};
use crate::media::HardsubStyle;
use crate::merge::MergeParams;
use crate::transcribe::{PoolConfig, WhisperChunkConfig};
use crate::translate::TranslateOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub transcribe: TranscribeConfig,
    pub merge: MergeConfig,
    pub translate: TranslateConfig,
    pub hardsub: HardsubConfig,
    pub output: OutputConfig,
}

/// Chunking and transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscribeConfig {
    pub model: String,
    pub model_path: Option<PathBuf>,
    pub models_dir: Option<PathBuf>,
    pub language: String,
    pub chunk_length_seconds: f64,
    pub overlap_seconds: f64,
    pub workers: usize,
    pub max_attempts: u32,
    pub threads: Option<usize>,
}

/// Timeline merge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    pub dedup_overlap_fraction: f64,
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslateConfig {
    pub target_language: Option<String>,
    pub base_url: String,
    pub api_key: Option<String>,
    pub concurrency: usize,
    pub request_delay_ms: u64,
}

/// Hardsub styling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HardsubConfig {
    pub font_size: u32,
    pub font_name: String,
    pub font_color: String,
}

/// Output and artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub keep_temp_files: bool,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            model_path: None,
            models_dir: None,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            chunk_length_seconds: defaults::CHUNK_LENGTH_SECONDS,
            overlap_seconds: defaults::OVERLAP_SECONDS,
            workers: defaults::TRANSCRIBE_WORKERS,
            max_attempts: defaults::MAX_TRANSCRIPTION_ATTEMPTS,
            threads: None,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            dedup_overlap_fraction: defaults::DEDUP_OVERLAP_FRACTION,
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            target_language: None,
            base_url: defaults::TRANSLATE_BASE_URL.to_string(),
            api_key: None,
            concurrency: defaults::TRANSLATE_CONCURRENCY,
            request_delay_ms: defaults::TRANSLATE_DELAY_MS,
        }
    }
}

impl Default for HardsubConfig {
    fn default() -> Self {
        Self {
            font_size: defaults::HARDSUB_FONT_SIZE,
            font_name: defaults::HARDSUB_FONT_NAME.to_string(),
            font_color: defaults::HARDSUB_FONT_COLOR.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    ///
    /// # Errors
    /// Returns `ConfigFileNotFound` when the file is missing and `Config`
    /// when it contains invalid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SubfuseError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SubfuseError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only falls back to defaults when the file is missing.
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(SubfuseError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SUBFUSE_MODEL → transcribe.model
    /// - SUBFUSE_LANGUAGE → transcribe.language
    /// - SUBFUSE_MODELS_DIR → transcribe.models_dir
    /// - SUBFUSE_TARGET_LANGUAGE → translate.target_language
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("SUBFUSE_MODEL")
            && !model.is_empty()
        {
            self.transcribe.model = model;
        }

        if let Ok(language) = std::env::var("SUBFUSE_LANGUAGE")
            && !language.is_empty()
        {
            self.transcribe.language = language;
        }

        if let Ok(models_dir) = std::env::var("SUBFUSE_MODELS_DIR")
            && !models_dir.is_empty()
        {
            self.transcribe.models_dir = Some(PathBuf::from(models_dir));
        }

        if let Ok(target) = std::env::var("SUBFUSE_TARGET_LANGUAGE")
            && !target.is_empty()
        {
            self.translate.target_language = Some(target);
        }

        self
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    /// Returns `ConfigInvalidValue` naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let t = &self.transcribe;
        if !t.chunk_length_seconds.is_finite() || t.chunk_length_seconds <= 0.0 {
            return Err(SubfuseError::ConfigInvalidValue {
                key: "transcribe.chunk_length_seconds".to_string(),
                message: "must be a positive number of seconds".to_string(),
            });
        }
        if !t.overlap_seconds.is_finite() || t.overlap_seconds < 0.0 {
            return Err(SubfuseError::ConfigInvalidValue {
                key: "transcribe.overlap_seconds".to_string(),
                message: "must be zero or a positive number of seconds".to_string(),
            });
        }
        if t.workers == 0 {
            return Err(SubfuseError::ConfigInvalidValue {
                key: "transcribe.workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if t.max_attempts == 0 {
            return Err(SubfuseError::ConfigInvalidValue {
                key: "transcribe.max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let fraction = self.merge.dedup_overlap_fraction;
        if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
            return Err(SubfuseError::ConfigInvalidValue {
                key: "merge.dedup_overlap_fraction".to_string(),
                message: "must be within (0, 1]".to_string(),
            });
        }

        if self.translate.concurrency == 0 {
            return Err(SubfuseError::ConfigInvalidValue {
                key: "translate.concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Pool settings derived from this configuration.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.transcribe.workers,
            max_attempts: self.transcribe.max_attempts,
            language: self.transcribe.language.clone(),
            keep_audio: self.output.keep_temp_files,
            partial_dir: None,
        }
    }

    /// Whisper backend settings derived from this configuration.
    pub fn whisper_config(&self) -> WhisperChunkConfig {
        WhisperChunkConfig {
            model: self.transcribe.model.clone(),
            model_path: self.transcribe.model_path.clone(),
            models_dir: self.transcribe.models_dir.clone(),
            threads: self.transcribe.threads,
        }
    }

    /// Merge parameters derived from this configuration.
    pub fn merge_params(&self) -> MergeParams {
        MergeParams {
            dedup_overlap_fraction: self.merge.dedup_overlap_fraction,
        }
    }

    /// Translation pass settings derived from this configuration.
    pub fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            concurrency: self.translate.concurrency,
            request_delay: Duration::from_millis(self.translate.request_delay_ms),
        }
    }

    /// Hardsub styling derived from this configuration.
    pub fn hardsub_style(&self) -> HardsubStyle {
        HardsubStyle {
            font_size: self.hardsub.font_size,
            font_name: self.hardsub.font_name.clone(),
            font_color: self.hardsub.font_color.clone(),
        }
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/subfuse/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("subfuse")
            .join("config.toml")
    }

    /// Get the default model directory
    ///
    /// Returns ~/.cache/subfuse/models on Linux
    #[cfg(feature = "cli")]
    pub fn default_models_dir() -> PathBuf {
        dirs::cache_dir()
            .expect("Could not determine cache directory")
            .join("subfuse")
            .join("models")
    }
}
