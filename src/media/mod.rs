//! Media collaborators: ffprobe/ffmpeg subprocess wrappers.
//!
//! subfuse never decodes or encodes media itself. Probing, chunk audio
//! extraction and hardsub burning all shell out, and a failure surfaces
//! as a `Media`/`MediaProbe` error with the tool's stderr attached.

pub mod extract;
pub mod hardsub;
pub mod probe;

pub use extract::{chunk_audio_path, extract_chunk_audio};
pub use hardsub::{HardsubStyle, burn_in};
pub use probe::{MediaHandle, StreamInfo, probe};

use crate::error::{Result, SubfuseError};
use std::process::Command;

/// Run a subprocess and fail with its captured stderr on nonzero exit.
pub(crate) fn run_tool(tool: &str, command: &mut Command) -> Result<Vec<u8>> {
    let output = command.output().map_err(|e| SubfuseError::Media {
        message: format!("failed to run {tool}: {e}"),
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SubfuseError::Media {
            message: format!("{tool} exited with {}: {}", output.status, stderr.trim()),
        });
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_tool_missing_binary_is_media_error() {
        let err = run_tool(
            "definitely-not-installed",
            &mut Command::new("subfuse-test-no-such-binary"),
        )
        .unwrap_err();
        match err {
            SubfuseError::Media { message } => {
                assert!(message.contains("definitely-not-installed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_tool_nonzero_exit_captures_stderr() {
        // `false` exits 1 with no output; the status still lands in the message
        let err = run_tool("false", &mut Command::new("false")).unwrap_err();
        match err {
            SubfuseError::Media { message } => assert!(message.contains("exited with")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
