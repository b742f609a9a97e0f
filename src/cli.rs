//! Command-line interface for subfuse
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Chunked subtitle transcription for long media files
#[derive(Parser, Debug)]
#[command(
    name = "subfuse",
    version = crate::version_string(),
    about = "Chunked subtitle transcription for long media files"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe a media file into an SRT subtitle file
    Transcribe {
        /// Media file to transcribe
        #[arg(value_name = "VIDEO")]
        input: PathBuf,

        /// Subtitle output path (default: next to the input)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Existing subtitle file; skips transcription and feeds the later stages
        #[arg(long, value_name = "PATH")]
        srt: Option<PathBuf>,

        /// Language code for transcription (default: auto-detect). Examples: auto, en, ko
        #[arg(long, value_name = "LANG")]
        language: Option<String>,

        /// Whisper model (default: base, multilingual). Use base.en for English-only
        #[arg(long, value_name = "MODEL")]
        model: Option<String>,

        /// Chunk length (default: 1h). Examples: 30m, 1h, 5400
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
        chunk_length: Option<f64>,

        /// Look-back overlap between chunks (default: 8s). Examples: 8s, 15s
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
        overlap: Option<f64>,

        /// Translate the finished subtitles to this language
        #[arg(long, value_name = "LANG")]
        translate_to: Option<String>,

        /// Burn the subtitles into a new video afterwards
        #[arg(long)]
        hardsub: bool,

        /// Hardsub output path (default: next to the input); implies --hardsub
        #[arg(long, value_name = "PATH")]
        hardsub_output: Option<PathBuf>,

        /// Keep extracted chunk audio and partial subtitles
        #[arg(long)]
        keep_temp: bool,
    },

    /// Translate a subtitle file
    Translate {
        /// Subtitle file to translate
        #[arg(value_name = "SRT")]
        input: PathBuf,

        /// Target language code (e.g., en, ko, de)
        #[arg(long, value_name = "LANG")]
        to: String,

        /// Output path (default: the input with the language before the extension)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Burn a subtitle file into a video
    Hardsub {
        /// Video file
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Subtitle file to burn in
        #[arg(value_name = "SRT")]
        subtitles: PathBuf,

        /// Output path (default: next to the video)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Subtitle font size
        #[arg(long, value_name = "N")]
        font_size: Option<u32>,

        /// Subtitle font name
        #[arg(long, value_name = "NAME")]
        font_name: Option<String>,

        /// Subtitle color (white, yellow, cyan, black@0.5)
        #[arg(long, value_name = "COLOR")]
        font_color: Option<String>,
    },

    /// Repair single-line subtitle output into standard SRT
    Convert {
        /// File to repair
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output path (default: repairs the file in place)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Show media duration and streams
    Probe {
        /// Media file to probe
        #[arg(value_name = "VIDEO")]
        input: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Print the effective configuration
    Config {
        /// Print the default config file path instead
        #[arg(long)]
        path: bool,
    },
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`).
fn parse_duration_secs(s: &str) -> Result<f64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<f64>() {
        return if secs.is_finite() {
            Ok(secs)
        } else {
            Err(format!("invalid duration: {s}"))
        };
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs_f64())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcribe_minimal() {
        let cli = Cli::try_parse_from(["subfuse", "transcribe", "lecture.mkv"]).unwrap();
        match cli.command {
            Commands::Transcribe {
                input,
                output,
                srt,
                language,
                model,
                chunk_length,
                overlap,
                translate_to,
                hardsub,
                hardsub_output,
                keep_temp,
            } => {
                assert_eq!(input, PathBuf::from("lecture.mkv"));
                assert!(output.is_none());
                assert!(srt.is_none());
                assert!(language.is_none());
                assert!(model.is_none());
                assert!(chunk_length.is_none());
                assert!(overlap.is_none());
                assert!(translate_to.is_none());
                assert!(!hardsub);
                assert!(hardsub_output.is_none());
                assert!(!keep_temp);
            }
            _ => panic!("Expected Transcribe command"),
        }
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_transcribe_with_options() {
        let cli = Cli::try_parse_from([
            "subfuse",
            "transcribe",
            "lecture.mkv",
            "--model",
            "small",
            "--language",
            "ko",
            "--translate-to",
            "en",
            "--hardsub",
            "--keep-temp",
        ])
        .unwrap();
        match cli.command {
            Commands::Transcribe {
                model,
                language,
                translate_to,
                hardsub,
                keep_temp,
                ..
            } => {
                assert_eq!(model.as_deref(), Some("small"));
                assert_eq!(language.as_deref(), Some("ko"));
                assert_eq!(translate_to.as_deref(), Some("en"));
                assert!(hardsub);
                assert!(keep_temp);
            }
            _ => panic!("Expected Transcribe command"),
        }
    }

    #[test]
    fn test_parse_transcribe_chunk_length_humantime() {
        let cli = Cli::try_parse_from([
            "subfuse",
            "transcribe",
            "lecture.mkv",
            "--chunk-length",
            "30m",
            "--overlap",
            "15s",
        ])
        .unwrap();
        match cli.command {
            Commands::Transcribe {
                chunk_length,
                overlap,
                ..
            } => {
                assert_eq!(chunk_length, Some(1800.0));
                assert_eq!(overlap, Some(15.0));
            }
            _ => panic!("Expected Transcribe command"),
        }
    }

    #[test]
    fn test_parse_transcribe_existing_srt() {
        let cli = Cli::try_parse_from([
            "subfuse",
            "transcribe",
            "lecture.mkv",
            "--srt",
            "lecture.srt",
        ])
        .unwrap();
        match cli.command {
            Commands::Transcribe { srt, .. } => {
                assert_eq!(srt, Some(PathBuf::from("lecture.srt")));
            }
            _ => panic!("Expected Transcribe command"),
        }
    }

    #[test]
    fn test_transcribe_requires_input() {
        let result = Cli::try_parse_from(["subfuse", "transcribe"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_translate() {
        let cli =
            Cli::try_parse_from(["subfuse", "translate", "lecture.srt", "--to", "en"]).unwrap();
        match cli.command {
            Commands::Translate { input, to, output } => {
                assert_eq!(input, PathBuf::from("lecture.srt"));
                assert_eq!(to, "en");
                assert!(output.is_none());
            }
            _ => panic!("Expected Translate command"),
        }
    }

    #[test]
    fn test_translate_requires_target() {
        let result = Cli::try_parse_from(["subfuse", "translate", "lecture.srt"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_hardsub() {
        let cli = Cli::try_parse_from([
            "subfuse",
            "hardsub",
            "lecture.mkv",
            "lecture.srt",
            "--font-size",
            "32",
            "--font-color",
            "yellow",
        ])
        .unwrap();
        match cli.command {
            Commands::Hardsub {
                video,
                subtitles,
                output,
                font_size,
                font_name,
                font_color,
            } => {
                assert_eq!(video, PathBuf::from("lecture.mkv"));
                assert_eq!(subtitles, PathBuf::from("lecture.srt"));
                assert!(output.is_none());
                assert_eq!(font_size, Some(32));
                assert!(font_name.is_none());
                assert_eq!(font_color.as_deref(), Some("yellow"));
            }
            _ => panic!("Expected Hardsub command"),
        }
    }

    #[test]
    fn test_hardsub_requires_subtitles() {
        let result = Cli::try_parse_from(["subfuse", "hardsub", "lecture.mkv"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from(["subfuse", "convert", "broken.srt"]).unwrap();
        match cli.command {
            Commands::Convert { input, output } => {
                assert_eq!(input, PathBuf::from("broken.srt"));
                assert!(output.is_none());
            }
            _ => panic!("Expected Convert command"),
        }
    }

    #[test]
    fn test_parse_convert_with_output() {
        let cli =
            Cli::try_parse_from(["subfuse", "convert", "broken.srt", "-o", "fixed.srt"]).unwrap();
        match cli.command {
            Commands::Convert { input, output } => {
                assert_eq!(input, PathBuf::from("broken.srt"));
                assert_eq!(output, Some(PathBuf::from("fixed.srt")));
            }
            _ => panic!("Expected Convert command"),
        }
    }

    #[test]
    fn test_parse_probe() {
        let cli = Cli::try_parse_from(["subfuse", "probe", "lecture.mkv"]).unwrap();
        match cli.command {
            Commands::Probe { input } => {
                assert_eq!(input, PathBuf::from("lecture.mkv"));
            }
            _ => panic!("Expected Probe command"),
        }
    }

    #[test]
    fn test_parse_config() {
        let cli = Cli::try_parse_from(["subfuse", "config"]).unwrap();
        match cli.command {
            Commands::Config { path } => assert!(!path),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::try_parse_from(["subfuse", "config", "--path"]).unwrap();
        match cli.command {
            Commands::Config { path } => assert!(path),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_parse_global_config_after_command() {
        let cli = Cli::try_parse_from([
            "subfuse",
            "probe",
            "lecture.mkv",
            "--config",
            "/tmp/subfuse.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/subfuse.toml")));
    }

    #[test]
    fn test_parse_global_quiet() {
        let cli = Cli::try_parse_from(["subfuse", "-q", "probe", "lecture.mkv"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_invalid_command_returns_error() {
        let result = Cli::try_parse_from(["subfuse", "invalid"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_missing_command_shows_help() {
        let result = Cli::try_parse_from(["subfuse"]);
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn test_help_flag() {
        let result = Cli::try_parse_from(["subfuse", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["subfuse", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_version_includes_build_metadata() {
        use clap::CommandFactory;
        let expected = crate::version_string();
        assert_eq!(Cli::command().get_version(), Some(expected.as_str()));
    }

    // ── Duration parsing tests ───────────────────────────────────────────

    #[test]
    fn test_parse_duration_secs_bare_number() {
        assert_eq!(parse_duration_secs("10").unwrap(), 10.0);
        assert_eq!(parse_duration_secs("5400").unwrap(), 5400.0);
        assert_eq!(parse_duration_secs("7.5").unwrap(), 7.5);
    }

    #[test]
    fn test_parse_duration_secs_units() {
        assert_eq!(parse_duration_secs("8s").unwrap(), 8.0);
        assert_eq!(parse_duration_secs("30m").unwrap(), 1800.0);
        assert_eq!(parse_duration_secs("1h").unwrap(), 3600.0);
    }

    #[test]
    fn test_parse_duration_secs_compound() {
        assert_eq!(parse_duration_secs("1h30m").unwrap(), 5400.0);
        assert_eq!(parse_duration_secs("2m30s").unwrap(), 150.0);
    }

    #[test]
    fn test_parse_duration_secs_invalid() {
        assert!(parse_duration_secs("abc").is_err());
        assert!(parse_duration_secs("10x").is_err());
        assert!(parse_duration_secs("").is_err());
        assert!(parse_duration_secs("inf").is_err());
    }
}
