//! Chunk audio extraction.
//!
//! Each chunk's audio is pulled straight from the source container as
//! 16kHz mono PCM WAV, the input format Whisper-family models expect.
//! Seeking happens before the input (`-ss` ahead of `-i`), so extraction
//! cost does not grow with the chunk's offset into the file.

use crate::defaults::SAMPLE_RATE;
use crate::error::Result;
use crate::media::probe::MediaHandle;
use crate::media::run_tool;
use crate::segment::Chunk;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Path of the WAV that [`extract_chunk_audio`] writes for `chunk`.
pub fn chunk_audio_path(out_dir: &Path, chunk: &Chunk) -> PathBuf {
    out_dir.join(format!("chunk_{:03}.wav", chunk.index))
}

/// Extract one chunk's audio into `out_dir` as `chunk_NNN.wav`.
///
/// # Errors
///
/// Returns `Media` when ffmpeg is missing or exits nonzero.
pub fn extract_chunk_audio(media: &MediaHandle, chunk: &Chunk, out_dir: &Path) -> Result<PathBuf> {
    let out_path = chunk_audio_path(out_dir, chunk);
    let sample_rate = SAMPLE_RATE.to_string();

    run_tool(
        "ffmpeg",
        Command::new("ffmpeg")
            .args(["-nostdin", "-hide_banner", "-loglevel", "error"])
            .args(["-ss", &format_seconds(chunk.start)])
            .args(["-t", &format_seconds(chunk.duration())])
            .arg("-i")
            .arg(media.path())
            .args(["-vn", "-ac", "1", "-ar", &sample_rate])
            .args(["-acodec", "pcm_s16le", "-y"])
            .arg(&out_path),
    )?;

    Ok(out_path)
}

/// Seconds formatted for ffmpeg arguments, millisecond precision.
fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.3}")
}
