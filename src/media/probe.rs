//! Duration and stream metadata via ffprobe.

use crate::error::{Result, SubfuseError};
use crate::media::run_tool;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Immutable reference to a probed source file.
///
/// Created by [`probe`] (or directly in tests) and read-only afterwards;
/// it lives for exactly one pipeline run.
#[derive(Debug, Clone)]
pub struct MediaHandle {
    path: PathBuf,
    duration: f64,
    streams: Vec<StreamInfo>,
}

/// One stream of the probed container.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Stream kind as reported by ffprobe ("audio", "video", "subtitle").
    pub kind: String,
    /// Codec name ("h264", "aac", ...).
    pub codec: String,
}

impl MediaHandle {
    /// Build a handle from already-known metadata.
    pub fn new(path: impl Into<PathBuf>, duration: f64, streams: Vec<StreamInfo>) -> Self {
        Self {
            path: path.into(),
            duration,
            streams,
        }
    }

    /// Source file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total duration in fractional seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Probed stream descriptors.
    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    /// True when the container carries at least one audio stream.
    pub fn has_audio(&self) -> bool {
        self.streams.iter().any(|s| s.kind == "audio")
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
}

/// Probe a media file with ffprobe.
///
/// # Errors
///
/// Returns `MediaProbe` when ffprobe fails, emits unparsable JSON, or
/// reports no duration.
pub fn probe(path: &Path) -> Result<MediaHandle> {
    let stdout = run_tool(
        "ffprobe",
        Command::new("ffprobe").args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-show_entries",
            "stream=codec_type,codec_name",
            "-of",
            "json",
        ])
        .arg(path),
    )
    .map_err(|e| SubfuseError::MediaProbe {
        path: path.display().to_string(),
        message: match e {
            SubfuseError::Media { message } => message,
            other => other.to_string(),
        },
    })?;

    parse_probe_output(&stdout, path)
}

fn parse_probe_output(stdout: &[u8], path: &Path) -> Result<MediaHandle> {
    let probe_error = |message: String| SubfuseError::MediaProbe {
        path: path.display().to_string(),
        message,
    };

    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| probe_error(format!("unparsable ffprobe output: {e}")))?;

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| probe_error("no duration in probe output".to_string()))?
        .parse::<f64>()
        .map_err(|e| probe_error(format!("unparsable duration: {e}")))?;

    let streams = parsed
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            kind: s.codec_type.unwrap_or_default(),
            codec: s.codec_name.unwrap_or_default(),
        })
        .collect();

    Ok(MediaHandle::new(path, duration, streams))
}
