//! Worker pool driving per-chunk transcription.
//!
//! Jobs flow through bounded crossbeam channels to a fixed set of worker
//! threads. Each worker prepares one chunk's audio, transcribes it, and
//! reports back; the collector retries failures with freshly prepared
//! audio up to the attempt limit, then records the chunk as failed instead
//! of aborting the run. Failed chunks surface as `None` result slots,
//! which the merge turns into gaps.

use crate::defaults;
use crate::error::{Result, SubfuseError};
use crate::segment::Chunk;
use crate::subtitle::{Fragment, Timeline, srt};
use crate::transcribe::{ChunkTranscriber, ChunkTranscription};
use crossbeam_channel::{Sender, bounded};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Settings for one pool run.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Transcription attempts per chunk before it is given up as a gap
    pub max_attempts: u32,
    /// Language hint for the model, or `auto` for detection
    pub language: String,
    /// Keep extracted chunk audio instead of deleting it after resolution
    pub keep_audio: bool,
    /// Directory receiving a `chunk_NNN.srt` snapshot after each success
    pub partial_dir: Option<PathBuf>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: defaults::TRANSCRIBE_WORKERS,
            max_attempts: defaults::MAX_TRANSCRIPTION_ATTEMPTS,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            keep_audio: false,
            partial_dir: None,
        }
    }
}

/// Progress notification emitted once per resolved chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Index of the chunk that just resolved
    pub chunk_index: usize,
    /// Chunks resolved so far, this one included
    pub completed: usize,
    /// Total chunks in the run
    pub total: usize,
    /// Whether the chunk produced fragments or gave up as a gap
    pub succeeded: bool,
}

/// What the pool produced.
///
/// `results[i]` holds chunk `i`'s chunk-local fragments, or `None` when
/// every attempt failed. `errors` collects one entry per failed attempt,
/// in resolution order.
#[derive(Debug, Default)]
pub struct ChunkOutcome {
    /// Per-chunk fragments, indexed by chunk ordinal
    pub results: Vec<Option<Vec<Fragment>>>,
    /// Every failed attempt, for the run report
    pub errors: Vec<SubfuseError>,
    /// Language the model detected, when it reported one
    pub detected_language: Option<String>,
}

struct Job {
    chunk: Chunk,
    attempt: u32,
}

struct JobResult {
    chunk: Chunk,
    attempt: u32,
    audio_path: Option<PathBuf>,
    outcome: Result<ChunkTranscription>,
}

/// Transcribe all chunks through a bounded worker pool.
///
/// `prepare_audio` produces the WAV for a chunk and runs once per attempt,
/// so a retry starts from fresh audio. Per-chunk failures never abort the
/// run; the hard caps are `max_attempts` tries per chunk.
///
/// When the run starts on `auto` and spans several chunks, the first chunk
/// resolves alone so its detected language can pin the hint for the rest;
/// if it never succeeds, the rest stay on `auto`.
pub fn transcribe_chunks<T, F>(
    transcriber: &T,
    chunks: &[Chunk],
    prepare_audio: F,
    config: &PoolConfig,
    progress: Option<&Sender<ProgressEvent>>,
    stop: &AtomicBool,
) -> ChunkOutcome
where
    T: ChunkTranscriber + ?Sized,
    F: Fn(&Chunk) -> Result<PathBuf> + Send + Sync,
{
    let total = chunks.len();
    let mut outcome = ChunkOutcome {
        results: vec![None; total],
        ..ChunkOutcome::default()
    };
    if total == 0 {
        return outcome;
    }

    let mut completed = 0usize;
    let mut hint = config.language.clone();
    let mut pool_chunks = chunks;

    // Resolve the first chunk inline when its detected language must pin
    // the hint before any other chunk is dispatched.
    if hint == defaults::AUTO_LANGUAGE && total > 1 {
        let first = chunks[0];
        let mut resolved = None;
        for _attempt in 0..config.max_attempts {
            if stop.load(Ordering::Relaxed) {
                outcome.errors.push(SubfuseError::Transcription {
                    chunk_index: first.index,
                    message: "stopped before transcription".to_string(),
                });
                break;
            }
            let (audio_path, result) = run_attempt(transcriber, &prepare_audio, &first, &hint);
            match result {
                Ok(transcription) => {
                    resolved = Some((audio_path, transcription));
                    break;
                }
                Err(e) => {
                    cleanup_audio(config, audio_path.as_deref());
                    outcome.errors.push(e);
                }
            }
        }

        completed += 1;
        match resolved {
            Some((audio_path, transcription)) => {
                if let Some(language) = &transcription.detected_language {
                    hint = language.clone();
                }
                record_success(&mut outcome, config, &first, transcription);
                cleanup_audio(config, audio_path.as_deref());
                send_progress(progress, first.index, completed, total, true);
            }
            None => {
                send_progress(progress, first.index, completed, total, false);
            }
        }
        pool_chunks = &chunks[1..];
    }

    if pool_chunks.is_empty() {
        return outcome;
    }

    let workers = config.workers.clamp(1, pool_chunks.len());
    let hint = hint.as_str();
    let prepare_audio = &prepare_audio;

    thread::scope(|scope| {
        let (job_tx, job_rx) = bounded::<Job>(pool_chunks.len());
        let (result_tx, result_rx) = bounded::<JobResult>(pool_chunks.len());

        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    let (audio_path, result) = if stop.load(Ordering::Relaxed) {
                        (
                            None,
                            Err(SubfuseError::Transcription {
                                chunk_index: job.chunk.index,
                                message: "stopped before transcription".to_string(),
                            }),
                        )
                    } else {
                        run_attempt(transcriber, prepare_audio, &job.chunk, hint)
                    };
                    let report = JobResult {
                        chunk: job.chunk,
                        attempt: job.attempt,
                        audio_path,
                        outcome: result,
                    };
                    if result_tx.send(report).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        for &chunk in pool_chunks {
            if job_tx.send(Job { chunk, attempt: 1 }).is_err() {
                break;
            }
        }

        let mut resolved = 0usize;
        while resolved < pool_chunks.len() {
            let Ok(report) = result_rx.recv() else {
                break;
            };
            match report.outcome {
                Ok(transcription) => {
                    resolved += 1;
                    completed += 1;
                    record_success(&mut outcome, config, &report.chunk, transcription);
                    cleanup_audio(config, report.audio_path.as_deref());
                    send_progress(progress, report.chunk.index, completed, total, true);
                }
                Err(e) => {
                    outcome.errors.push(e);
                    cleanup_audio(config, report.audio_path.as_deref());
                    let retry =
                        report.attempt < config.max_attempts && !stop.load(Ordering::Relaxed);
                    if retry {
                        let job = Job {
                            chunk: report.chunk,
                            attempt: report.attempt + 1,
                        };
                        if job_tx.send(job).is_ok() {
                            continue;
                        }
                    }
                    resolved += 1;
                    completed += 1;
                    send_progress(progress, report.chunk.index, completed, total, false);
                }
            }
        }
        drop(job_tx);
    });

    outcome
}

fn run_attempt<T, F>(
    transcriber: &T,
    prepare_audio: &F,
    chunk: &Chunk,
    hint: &str,
) -> (Option<PathBuf>, Result<ChunkTranscription>)
where
    T: ChunkTranscriber + ?Sized,
    F: Fn(&Chunk) -> Result<PathBuf>,
{
    match prepare_audio(chunk) {
        Ok(path) => {
            let result = transcriber.transcribe_chunk(chunk, &path, hint);
            (Some(path), result)
        }
        Err(e) => (None, Err(e)),
    }
}

fn record_success(
    outcome: &mut ChunkOutcome,
    config: &PoolConfig,
    chunk: &Chunk,
    transcription: ChunkTranscription,
) {
    if outcome.detected_language.is_none() {
        outcome.detected_language = transcription.detected_language.clone();
    }
    if let Some(dir) = config.partial_dir.as_deref() {
        if let Err(e) = write_partial_srt(dir, chunk, &transcription.fragments) {
            outcome.errors.push(e);
        }
    }
    if let Some(slot) = outcome.results.get_mut(chunk.index) {
        *slot = Some(transcription.fragments);
    }
}

fn cleanup_audio(config: &PoolConfig, audio_path: Option<&Path>) {
    if config.keep_audio {
        return;
    }
    if let Some(path) = audio_path {
        let _ = std::fs::remove_file(path);
    }
}

fn send_progress(
    progress: Option<&Sender<ProgressEvent>>,
    chunk_index: usize,
    completed: usize,
    total: usize,
    succeeded: bool,
) {
    if let Some(tx) = progress {
        let _ = tx.send(ProgressEvent {
            chunk_index,
            completed,
            total,
            succeeded,
        });
    }
}

/// Snapshot one chunk's fragments as `chunk_NNN.srt` with global times,
/// so an interrupted run leaves usable partial output behind.
fn write_partial_srt(dir: &Path, chunk: &Chunk, fragments: &[Fragment]) -> Result<()> {
    let mut rebased = fragments.to_vec();
    for fragment in &mut rebased {
        fragment.rebase(chunk.start);
    }
    let content = srt::serialize(&Timeline::new(rebased));
    std::fs::write(dir.join(format!("chunk_{:03}.srt", chunk.index)), content)?;
    Ok(())
}
