//! Application command dispatch.
//!
//! Resolves configuration, builds the transcription and translation
//! backends, and renders progress and run reports for the CLI.

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::defaults::{self, AUTO_LANGUAGE, ENGLISH_ONLY_SUFFIX};
use crate::error::{Result, SubfuseError};
use crate::media::{burn_in, probe};
use crate::pipeline::{self, PipelineOptions};
use crate::subtitle::repair;
use crate::subtitle::srt::{self, format_timestamp};
use crate::transcribe::{ChunkTranscriber, ProgressEvent, WhisperChunkTranscriber};
use crate::translate::{Translator, translate_timeline};
use clap::CommandFactory;
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

#[cfg(feature = "translate")]
use crate::translate::{LibreTranslateConfig, LibreTranslator};

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
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
            let config = load_config(cli.config.as_deref())?;
            run_transcribe(
                config,
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
                cli.quiet,
            )
            .await
        }
        Commands::Translate { input, to, output } => {
            let config = load_config(cli.config.as_deref())?;
            run_translate(config, input, to, output, cli.quiet).await
        }
        Commands::Hardsub {
            video,
            subtitles,
            output,
            font_size,
            font_name,
            font_color,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run_hardsub(
                config, video, subtitles, output, font_size, font_name, font_color, cli.quiet,
            )
        }
        Commands::Convert { input, output } => run_convert(input, output, cli.quiet).await,
        Commands::Probe { input } => run_probe(&input),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "subfuse", &mut std::io::stdout());
            Ok(())
        }
        Commands::Config { path } => {
            if path {
                let config_path = cli.config.unwrap_or_else(Config::default_path);
                println!("{}", config_path.display());
                Ok(())
            } else {
                let config = load_config(cli.config.as_deref())?;
                print_config(&config)
            }
        }
    }
}

/// Run the transcribe command: the full pipeline with optional stages.
///
/// # Arguments
/// * `config` - Base configuration (can be overridden by CLI args)
/// * `input` - Media file to transcribe
/// * `output` - Optional subtitle output path override
/// * `existing_srt` - Optional subtitle file that replaces transcription
/// * `language` / `model` / `chunk_length` / `overlap` - Config overrides from CLI
/// * `translate_to` - Optional translation target (falls back to config)
/// * `hardsub` / `hardsub_output` - Burn-in stage controls
/// * `keep_temp` - Keep the run's working directory
/// * `quiet` - Suppress status messages and the progress bar
#[allow(clippy::too_many_arguments)]
async fn run_transcribe(
    mut config: Config,
    input: PathBuf,
    output: Option<PathBuf>,
    existing_srt: Option<PathBuf>,
    language: Option<String>,
    model: Option<String>,
    chunk_length: Option<f64>,
    overlap: Option<f64>,
    translate_to: Option<String>,
    hardsub: bool,
    hardsub_output: Option<PathBuf>,
    keep_temp: bool,
    quiet: bool,
) -> Result<()> {
    // Apply CLI overrides
    if let Some(m) = model {
        config.transcribe.model = m;
    }
    if let Some(l) = language {
        config.transcribe.language = l;
    }
    if let Some(len) = chunk_length {
        config.transcribe.chunk_length_seconds = len;
    }
    if let Some(secs) = overlap {
        config.transcribe.overlap_seconds = secs;
    }
    if keep_temp {
        config.output.keep_temp_files = true;
    }
    config.transcribe.model = resolve_model_for_language(
        &config.transcribe.model,
        &config.transcribe.language,
        quiet,
    );
    config.validate()?;

    let translate_to = translate_to.or_else(|| config.translate.target_language.clone());
    let hardsub = hardsub || hardsub_output.is_some();

    // Load the model ONCE before the run (this is the slow part), but not
    // at all when an existing subtitle file replaces transcription.
    let transcriber: Option<Arc<dyn ChunkTranscriber>> = if existing_srt.is_some() {
        None
    } else {
        Some(build_transcriber(&config, quiet)?)
    };
    let translator: Option<Arc<dyn Translator>> = match &translate_to {
        Some(_) => Some(build_translator(&config)?),
        None => None,
    };

    // First Ctrl+C stops gracefully: running chunks finish, pending ones
    // fail fast, and whatever merged is still written.
    let stop = Arc::new(AtomicBool::new(false));
    let ctrl_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nStopping after running chunks...");
            ctrl_stop.store(true, Ordering::Relaxed);
        }
    });

    let (progress, renderer) = if quiet {
        (None, None)
    } else {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Some(tx), Some(spawn_progress_renderer(rx)))
    };

    let mut options = PipelineOptions::new(config, input);
    options.output = output;
    options.existing_srt = existing_srt;
    options.translate_to = translate_to;
    options.hardsub = hardsub;
    options.hardsub_output = hardsub_output;

    let result = pipeline::run(options, transcriber, translator, progress, stop).await;

    // The pipeline dropped its progress sender, so the renderer is done
    if let Some(renderer) = renderer {
        let _ = renderer.join();
    }

    let report = result?;
    if !quiet || report.has_problems() {
        eprint!("{}", report.summary());
    }
    Ok(())
}

/// Run the translate command on an existing subtitle file.
async fn run_translate(
    config: Config,
    input: PathBuf,
    target: String,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let contents = tokio::fs::read_to_string(&input).await?;
    let parsed = srt::parse(&contents)?;
    if !parsed.skipped.is_empty() && !quiet {
        eprintln!(
            "⚠ Skipped {} malformed subtitle blocks",
            parsed.skipped.len()
        );
    }

    let translator = build_translator(&config)?;
    let outcome = translate_timeline(
        translator,
        &parsed.timeline,
        &target,
        &config.translate_options(),
    )
    .await;

    let output = output.unwrap_or_else(|| pipeline::translated_output_path(&input, &target));
    tokio::fs::write(&output, srt::serialize(&outcome.timeline)).await?;

    if !quiet {
        eprintln!("Translated subtitles: {}", output.display());
    }
    for error in &outcome.errors {
        eprintln!("⚠ {error}");
    }
    Ok(())
}

/// Run the hardsub command: burn a subtitle file into a video.
#[allow(clippy::too_many_arguments)]
fn run_hardsub(
    config: Config,
    video: PathBuf,
    subtitles: PathBuf,
    output: Option<PathBuf>,
    font_size: Option<u32>,
    font_name: Option<String>,
    font_color: Option<String>,
    quiet: bool,
) -> Result<()> {
    let mut style = config.hardsub_style();
    if let Some(size) = font_size {
        style.font_size = size;
    }
    if let Some(name) = font_name {
        style.font_name = name;
    }
    if let Some(color) = font_color {
        style.font_color = color;
    }

    let output = output.unwrap_or_else(|| pipeline::hardsub_output_path(&video));
    if !quiet {
        eprintln!("Re-encoding video with burned-in subtitles...");
    }
    burn_in(&video, &subtitles, &style, &output)?;
    if !quiet {
        eprintln!("Hardsubbed video: {}", output.display());
    }
    Ok(())
}

/// Run the convert command: recover single-line subtitle dumps.
async fn run_convert(input: PathBuf, output: Option<PathBuf>, quiet: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(&input).await?;
    let outcome = repair::repair_inline(&contents);

    let target = output.unwrap_or_else(|| input.clone());
    tokio::fs::write(&target, srt::serialize(&outcome.timeline)).await?;

    if !quiet {
        eprintln!(
            "Recovered {} fragments into {}",
            outcome.timeline.len(),
            target.display()
        );
    }
    for skip in &outcome.failed {
        eprintln!("⚠ line {}: {}", skip.line, skip.message);
    }
    Ok(())
}

/// Run the probe command: print media duration and streams.
fn run_probe(input: &Path) -> Result<()> {
    let media = probe(input)?;
    println!("{}", media.path().display());
    println!(
        "  duration: {} ({:.3}s)",
        format_timestamp(media.duration()),
        media.duration()
    );
    for stream in media.streams() {
        println!("  {}: {}", stream.kind, stream.codec);
    }
    Ok(())
}

/// Print the effective configuration as TOML.
fn print_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| SubfuseError::Other(format!("Failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/subfuse/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    Ok(config.with_env_overrides())
}

/// Resolve the model name based on the configured language.
///
/// Ensures a multilingual model is used when the language is not English.
/// - `language="auto"` + `model="base.en"` → switch to `"base"`, warn
/// - `language="ko"` + `model="base.en"` → switch to `"base"`, warn
/// - `language="en"` + `model="base.en"` → keep as-is
/// - `language="auto"` + `model="base"` → keep as-is
fn resolve_model_for_language(model: &str, language: &str, quiet: bool) -> String {
    let needs_multilingual =
        language == AUTO_LANGUAGE || (language != "en" && !language.is_empty());

    if needs_multilingual
        && let Some(base) = model.strip_suffix(ENGLISH_ONLY_SUFFIX)
        && !base.is_empty()
    {
        if !quiet {
            eprintln!(
                "Switching model '{}' → '{}' (language '{}' needs a multilingual model).",
                model, base, language
            );
        }
        return base.to_string();
    }
    model.to_string()
}

/// Build the whisper backend from the resolved configuration.
fn build_transcriber(config: &Config, quiet: bool) -> Result<Arc<dyn ChunkTranscriber>> {
    let mut whisper_config = config.whisper_config();
    if whisper_config.models_dir.is_none() {
        whisper_config.models_dir = Some(Config::default_models_dir());
    }

    if !quiet {
        eprintln!(
            "Loading model '{}' ({} backend)...",
            config.transcribe.model,
            defaults::gpu_backend()
        );
    }
    let transcriber = WhisperChunkTranscriber::new(whisper_config)?;
    if !quiet {
        eprintln!("Model loaded.");
    }
    Ok(Arc::new(transcriber))
}

#[cfg(feature = "translate")]
fn build_translator(config: &Config) -> Result<Arc<dyn Translator>> {
    Ok(Arc::new(LibreTranslator::new(LibreTranslateConfig {
        base_url: config.translate.base_url.clone(),
        api_key: config.translate.api_key.clone(),
        ..LibreTranslateConfig::default()
    })))
}

#[cfg(not(feature = "translate"))]
fn build_translator(_config: &Config) -> Result<Arc<dyn Translator>> {
    Err(SubfuseError::Other(
        concat!(
            "Translate feature not enabled. This binary was built without translation support.\n",
            "To fix: cargo build --release (translation is enabled by default)"
        )
        .to_string(),
    ))
}

/// Render chunk progress on stderr until the sending side hangs up.
fn spawn_progress_renderer(rx: Receiver<ProgressEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut bar: Option<ProgressBar> = None;
        while let Ok(event) = rx.recv() {
            let bar = bar.get_or_insert_with(|| make_chunk_bar(event.total));
            bar.set_position(event.completed as u64);
        }
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    })
}

fn make_chunk_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        // SAFETY: hardcoded template string - always valid
        #[allow(clippy::expect_used)]
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})")
            .expect("hardcoded progress bar template")
            .progress_chars("#>-"),
    );
    bar
}
