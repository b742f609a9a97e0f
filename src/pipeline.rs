//! Chunked transcription pipeline.
//!
//! Orchestrates the complete media-to-subtitles flow:
//! probe → segment → transcribe → merge → write, with optional
//! translation and hardsub burn-in stages at the end.

use crate::config::Config;
use crate::error::{Result, SubfuseError};
use crate::media::{burn_in, extract_chunk_audio, probe};
use crate::merge::{merge, normalize};
use crate::report::RunReport;
use crate::segment::{Chunk, segment};
use crate::subtitle::Timeline;
use crate::subtitle::srt;
use crate::transcribe::{ChunkTranscriber, ProgressEvent, transcribe_chunks};
use crate::translate::{Translator, translate_timeline};
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::{NamedTempFile, TempDir};
use tokio::task::spawn_blocking;

/// What one run should do, layered on top of a [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Resolved configuration for the run
    pub config: Config,
    /// Media file to transcribe
    pub input: PathBuf,
    /// Explicit subtitle output path, overriding the derived one
    pub output: Option<PathBuf>,
    /// Existing subtitle file that replaces transcription entirely
    pub existing_srt: Option<PathBuf>,
    /// Target language for the optional translation stage
    pub translate_to: Option<String>,
    /// Burn the subtitles into a new video after writing them
    pub hardsub: bool,
    /// Explicit hardsub output path, overriding the derived one
    pub hardsub_output: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn new(config: Config, input: impl Into<PathBuf>) -> Self {
        Self {
            config,
            input: input.into(),
            output: None,
            existing_srt: None,
            translate_to: None,
            hardsub: false,
            hardsub_output: None,
        }
    }
}

/// Run the pipeline: probe the input, transcribe it chunk by chunk, merge
/// the results into one timeline and write it out as SRT.
///
/// When `existing_srt` is set, probing and transcription are skipped: the
/// file is parsed and normalized instead, and feeds the later stages while
/// staying untouched on disk. A run only aborts on setup problems; failed
/// chunks and failed translations are recorded in the returned report and
/// the run keeps going.
///
/// # Arguments
/// * `options` - What to transcribe and which optional stages to run
/// * `transcriber` - Backend that turns chunk audio into fragments; required
///   unless `existing_srt` replaces transcription
/// * `translator` - Translation provider, required only when `translate_to` is set
/// * `progress` - Optional channel receiving one event per settled chunk
/// * `stop` - Graceful stop flag; pending chunks fail fast and later stages are skipped
///
/// # Returns
/// A [`RunReport`] describing the outputs and everything recoverable that
/// went wrong on the way.
pub async fn run(
    options: PipelineOptions,
    transcriber: Option<Arc<dyn ChunkTranscriber>>,
    translator: Option<Arc<dyn Translator>>,
    progress: Option<Sender<ProgressEvent>>,
    stop: Arc<AtomicBool>,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    let (timeline, srt_path) = match &options.existing_srt {
        Some(existing) => {
            let timeline = reuse_existing_srt(existing, &options.config, &mut report).await?;
            (timeline, existing.clone())
        }
        None => {
            let transcriber = transcriber.ok_or_else(|| {
                SubfuseError::Other(
                    "Transcription requested but no backend is configured".to_string(),
                )
            })?;
            let srt_path = match &options.output {
                Some(path) => path.clone(),
                None => srt_output_path(&options.input),
            };
            let timeline = transcribe_media(
                &options,
                &srt_path,
                transcriber,
                progress,
                &stop,
                &mut report,
            )
            .await?;
            (timeline, srt_path)
        }
    };

    report.fragment_count = timeline.len();
    report.srt_path = Some(srt_path.clone());

    // Optional translation pass over the finished timeline
    if let Some(target) = options.translate_to.as_deref()
        && !stop.load(Ordering::Relaxed)
    {
        let translator = translator.ok_or_else(|| {
            SubfuseError::Other(format!(
                "Translation to '{target}' requested but no translator is configured"
            ))
        })?;

        let outcome =
            translate_timeline(translator, &timeline, target, &options.config.translate_options())
                .await;
        let translated_path = translated_output_path(&srt_path, target);
        tokio::fs::write(&translated_path, srt::serialize(&outcome.timeline)).await?;
        report.translation_errors = outcome.errors;
        report.translated_srt_path = Some(translated_path);
    }

    // Optional burn-in, preferring the translated subtitles
    if options.hardsub && !stop.load(Ordering::Relaxed) {
        let (subtitle_source, _scratch) = burn_source(&report, &srt_path, &timeline).await?;
        let video = options.input.clone();
        let style = options.config.hardsub_style();
        let output = match &options.hardsub_output {
            Some(path) => path.clone(),
            None => hardsub_output_path(&options.input),
        };

        let burn_target = output.clone();
        spawn_blocking(move || burn_in(&video, &subtitle_source, &style, &burn_target))
            .await
            .map_err(|e| SubfuseError::Other(format!("Hardsub task panicked: {e}")))??;
        report.hardsub_path = Some(output);
    }

    Ok(report)
}

/// Parse and normalize an existing subtitle file. The file on disk stays
/// untouched; the normalized timeline feeds the later stages.
async fn reuse_existing_srt(
    path: &Path,
    config: &Config,
    report: &mut RunReport,
) -> Result<Timeline> {
    let contents = tokio::fs::read_to_string(path).await?;
    let parsed = srt::parse(&contents)?;
    report.parse_skips = parsed.skipped;
    report.used_existing_srt = true;

    // Existing files get the same ordering guarantees as fresh runs
    let outcome = normalize(parsed.timeline, &config.merge_params());
    report.duplicates_removed = outcome.duplicates_removed;
    report.dropped_fragments = outcome.dropped.len();
    Ok(outcome.timeline)
}

/// Probe, segment and transcribe the input, merge the per-chunk results
/// and write the timeline to `srt_path`.
async fn transcribe_media(
    options: &PipelineOptions,
    srt_path: &Path,
    transcriber: Arc<dyn ChunkTranscriber>,
    progress: Option<Sender<ProgressEvent>>,
    stop: &Arc<AtomicBool>,
    report: &mut RunReport,
) -> Result<Timeline> {
    // Probe before any heavy work
    let media = probe(&options.input)?;
    if !media.has_audio() {
        return Err(SubfuseError::Media {
            message: format!("{} has no audio stream", options.input.display()),
        });
    }
    report.media_duration = media.duration();

    let chunks = segment(
        media.duration(),
        options.config.transcribe.chunk_length_seconds,
        options.config.transcribe.overlap_seconds,
    )?;
    report.chunk_count = chunks.len();

    let work_dir = TempDir::new()?;
    let work_path = work_dir.path().to_path_buf();

    let mut pool_config = options.config.pool_config();
    pool_config.partial_dir = Some(work_path.clone());

    // The pool blocks on ffmpeg and on inference, so it runs off the
    // async runtime. Everything it borrows moves into the task.
    let pool_chunks = chunks.clone();
    let pool_stop = Arc::clone(stop);
    let outcome = spawn_blocking(move || {
        let prepare = |chunk: &Chunk| extract_chunk_audio(&media, chunk, &work_path);
        transcribe_chunks(
            &*transcriber,
            &pool_chunks,
            prepare,
            &pool_config,
            progress.as_ref(),
            &pool_stop,
        )
    })
    .await
    .map_err(|e| SubfuseError::Other(format!("Transcription pool panicked: {e}")))?;

    report.transcription_errors = outcome.errors;
    report.detected_language = outcome.detected_language;

    // Merge per-chunk fragments onto the global clock
    let merged = merge(&chunks, outcome.results, &options.config.merge_params());
    report.gaps = merged.gaps;
    report.duplicates_removed = merged.duplicates_removed;
    report.dropped_fragments = merged.dropped.len();

    // Partial results are still worth writing when chunks failed
    tokio::fs::write(srt_path, srt::serialize(&merged.timeline)).await?;

    if options.config.output.keep_temp_files {
        report.work_dir = Some(work_dir.keep());
    }

    Ok(merged.timeline)
}

/// Pick the subtitle file the burn-in reads. Translated output wins, and
/// a fresh run burns the file it just wrote. A reused subtitle file stays
/// untouched on disk, so its normalized timeline is snapshotted to a
/// scratch file and the scratch is burned instead. The returned handle
/// keeps the scratch file alive until the burn finishes.
async fn burn_source(
    report: &RunReport,
    srt_path: &Path,
    timeline: &Timeline,
) -> Result<(PathBuf, Option<NamedTempFile>)> {
    if let Some(translated) = &report.translated_srt_path {
        return Ok((translated.clone(), None));
    }
    if !report.used_existing_srt {
        return Ok((srt_path.to_path_buf(), None));
    }
    let scratch = tempfile::Builder::new()
        .prefix("subfuse-")
        .suffix(".srt")
        .tempfile()?;
    tokio::fs::write(scratch.path(), srt::serialize(timeline)).await?;
    Ok((scratch.path().to_path_buf(), Some(scratch)))
}

/// Default subtitle path: the input path with an `srt` extension.
pub fn srt_output_path(input: &Path) -> PathBuf {
    input.with_extension("srt")
}

/// Translated subtitle path: the target language slots in before the extension.
pub fn translated_output_path(srt_path: &Path, target: &str) -> PathBuf {
    srt_path.with_extension(format!("{target}.srt"))
}

/// Hardsub video path next to the input.
pub fn hardsub_output_path(input: &Path) -> PathBuf {
    input.with_extension("hardsub.mp4")
}
