//! Hardsub burning: composite a subtitle file into video pixels.
//!
//! Pure collaborator contract. The caller guarantees the subtitle file is
//! final (merged, deduplicated, ordered); this module only assembles the
//! ffmpeg `subtitles=` filter invocation.

use crate::defaults::{HARDSUB_FONT_COLOR, HARDSUB_FONT_NAME, HARDSUB_FONT_SIZE};
use crate::error::Result;
use crate::media::run_tool;
use std::path::Path;
use std::process::Command;

/// Font and style parameters for burned-in subtitles.
#[derive(Debug, Clone, PartialEq)]
pub struct HardsubStyle {
    /// Point size of the subtitle font.
    pub font_size: u32,
    /// Font family name, resolved by fontconfig at render time.
    pub font_name: String,
    /// Named text color; unknown names fall back to white.
    pub font_color: String,
}

impl Default for HardsubStyle {
    fn default() -> Self {
        Self {
            font_size: HARDSUB_FONT_SIZE,
            font_name: HARDSUB_FONT_NAME.to_string(),
            font_color: HARDSUB_FONT_COLOR.to_string(),
        }
    }
}

impl HardsubStyle {
    /// Render the libass force_style parameter string.
    pub fn force_style(&self) -> String {
        format!(
            "FontSize={},PrimaryColour=&H{}&,OutlineColour=&H000000&,BorderStyle=1,Outline=2,Shadow=1,MarginV=20,FontName={}",
            self.font_size,
            color_to_ass_hex(&self.font_color),
            self.font_name
        )
    }
}

/// Map a color name to libass AABBGGRR hex (alpha 00 = opaque).
///
/// `black@0.5` is half-transparent black, kept for background boxes.
/// Unknown names map to opaque white.
pub fn color_to_ass_hex(color: &str) -> &'static str {
    match color.to_lowercase().as_str() {
        "white" => "00FFFFFF",
        "black" => "00000000",
        "red" => "000000FF",
        "green" => "0000FF00",
        "blue" => "00FF0000",
        "yellow" => "0000FFFF",
        "cyan" => "00FFFF00",
        "magenta" => "00FF00FF",
        "black@0.5" => "80000000",
        _ => "00FFFFFF",
    }
}

/// Burn `srt_path` into `video_path`, writing `output_path`.
///
/// Audio is stream-copied; only the video track is re-encoded.
///
/// # Errors
///
/// Returns `Media` when ffmpeg is missing or exits nonzero.
pub fn burn_in(
    video_path: &Path,
    srt_path: &Path,
    style: &HardsubStyle,
    output_path: &Path,
) -> Result<()> {
    let filter = format!(
        "subtitles='{}':force_style='{}'",
        escape_filter_path(srt_path),
        style.force_style()
    );

    run_tool(
        "ffmpeg",
        Command::new("ffmpeg")
            .args(["-nostdin", "-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(video_path)
            .args(["-vf", &filter])
            .args(["-c:a", "copy", "-y"])
            .arg(output_path),
    )?;
    Ok(())
}

/// Escape a path for use inside a single-quoted ffmpeg filter argument.
///
/// Quotes and colons are special in filter syntax.
fn escape_filter_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}
