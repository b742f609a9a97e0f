//! End-to-end pipeline tests over the pure stages: segmentation, pooled
//! transcription with a mock backend, merge, SRT round-trips, and
//! translation. No ffmpeg or network involved.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use subfuse::merge::{self, MergeParams};
use subfuse::subtitle::srt;
use subfuse::transcribe::{MockChunkTranscriber, PoolConfig, transcribe_chunks};
use subfuse::translate::{MockTranslator, TranslateOptions, Translator, translate_timeline};
use subfuse::{Chunk, Fragment, Result, RunReport, Timeline, segment};

fn dummy_audio(chunk: &Chunk) -> Result<PathBuf> {
    Ok(PathBuf::from(format!("chunk_{:03}.wav", chunk.index)))
}

fn pool_config(language: &str) -> PoolConfig {
    PoolConfig {
        workers: 2,
        language: language.to_string(),
        ..PoolConfig::default()
    }
}

fn assert_ordered(timeline: &Timeline) {
    let mut prev_end = 0.0_f64;
    for fragment in &timeline.fragments {
        assert!(
            fragment.start >= prev_end,
            "fragment at {} overlaps previous end {}",
            fragment.start,
            prev_end
        );
        assert!(
            fragment.end > fragment.start,
            "degenerate fragment at {}",
            fragment.start
        );
        prev_end = fragment.end;
    }
}

fn texts(timeline: &Timeline) -> Vec<&str> {
    timeline.fragments.iter().map(|f| f.text.as_str()).collect()
}

#[test]
fn test_chunked_run_produces_one_clean_srt() {
    let chunks = segment(250.0, 100.0, 5.0).unwrap();
    assert_eq!(chunks.len(), 3);

    // Chunk 1 spans 95..200; its first fragment re-recognizes the
    // utterance already captured by chunk 0 inside the look-back window.
    let transcriber = MockChunkTranscriber::new("mock")
        .with_chunk_fragments(
            0,
            vec![
                Fragment::new(10.0, 12.0, "welcome to the lecture"),
                Fragment::new(97.0, 99.5, "as I was saying"),
            ],
        )
        .with_chunk_fragments(
            1,
            vec![
                Fragment::new(2.0, 4.5, "as I was saying"),
                Fragment::new(30.0, 33.0, "the middle part"),
            ],
        )
        .with_chunk_fragments(2, vec![Fragment::new(10.0, 12.0, "closing remarks")]);
    let stop = AtomicBool::new(false);

    let outcome = transcribe_chunks(
        &transcriber,
        &chunks,
        dummy_audio,
        &pool_config("en"),
        None,
        &stop,
    );
    assert!(outcome.errors.is_empty());

    let merged = merge::merge(&chunks, outcome.results, &MergeParams::default());
    assert!(merged.gaps.is_empty());
    assert!(merged.dropped.is_empty());
    assert_eq!(merged.duplicates_removed, 1);
    assert_ordered(&merged.timeline);
    assert_eq!(
        texts(&merged.timeline),
        vec![
            "welcome to the lecture",
            "as I was saying",
            "the middle part",
            "closing remarks",
        ]
    );

    // Chunk-local times landed on the global clock
    assert_eq!(merged.timeline.fragments[1].start, 97.0);
    assert_eq!(merged.timeline.fragments[2].start, 125.0);
    assert_eq!(merged.timeline.fragments[3].start, 205.0);

    // The rendered document parses back to the same timeline
    let rendered = srt::serialize(&merged.timeline);
    let parsed = srt::parse(&rendered).unwrap();
    assert!(parsed.skipped.is_empty());
    assert_eq!(texts(&parsed.timeline), texts(&merged.timeline));
    assert!(rendered.contains("00:02:05,000 --> 00:02:08,000"));
    assert!(rendered.contains("00:03:25,000 --> 00:03:27,000"));
}

#[test]
fn test_failed_chunk_leaves_gap_but_run_completes() {
    let chunks = segment(300.0, 100.0, 5.0).unwrap();
    let transcriber = MockChunkTranscriber::new("mock")
        .with_fragments(vec![Fragment::new(10.0, 12.0, "spoken line")])
        .with_chunk_failures(1, 2);
    let stop = AtomicBool::new(false);
    let config = PoolConfig {
        workers: 1,
        max_attempts: 2,
        language: "en".to_string(),
        ..PoolConfig::default()
    };

    let outcome = transcribe_chunks(&transcriber, &chunks, dummy_audio, &config, None, &stop);
    assert_eq!(outcome.errors.len(), 2, "one error per failed attempt");
    assert!(outcome.results[1].is_none());

    let merged = merge::merge(&chunks, outcome.results, &MergeParams::default());
    assert_eq!(merged.gaps.len(), 1);
    assert_eq!(merged.gaps[0].chunk_index, 1);
    assert_eq!(merged.gaps[0].start, 100.0);
    assert_eq!(merged.gaps[0].end, 200.0);
    assert_eq!(merged.timeline.len(), 2, "surviving chunks still render");

    let rendered = srt::serialize(&merged.timeline);
    assert!(rendered.contains("00:00:10,000 --> 00:00:12,000"));
    assert!(rendered.contains("00:03:25,000 --> 00:03:27,000"));

    let report = RunReport {
        chunk_count: chunks.len(),
        fragment_count: merged.timeline.len(),
        gaps: merged.gaps.clone(),
        transcription_errors: outcome.errors,
        ..RunReport::default()
    };
    assert!(report.has_problems());
    let summary = report.summary();
    assert!(summary.contains("1 gap in coverage"));
    assert!(summary.contains("chunk 1: 00:01:40,000 - 00:03:20,000"));
    assert!(summary.contains("2 failed transcription attempts"));
}

#[test]
fn test_existing_srt_normalizes_like_a_fresh_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("episode.srt");
    let messy = "\
1
00:00:05,000 --> 00:00:08,000
middle line

2
00:00:01,000 --> 00:00:03,000
opening line

3
total garbage
broken

4
00:00:07,000 --> 00:00:10,000
overlapping line

";
    std::fs::write(&path, messy).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed = srt::parse(&contents).unwrap();
    assert_eq!(parsed.skipped.len(), 1);
    assert_eq!(parsed.skipped[0].line, 9);

    let normalized = merge::normalize(parsed.timeline, &MergeParams::default());
    assert!(normalized.dropped.is_empty());
    assert_ordered(&normalized.timeline);
    assert_eq!(
        texts(&normalized.timeline),
        vec!["opening line", "middle line", "overlapping line"]
    );
    // The overlap with "middle line" got clamped away
    assert_eq!(normalized.timeline.fragments[2].start, 8.0);
    assert_eq!(normalized.timeline.fragments[2].end, 10.0);
}

#[test]
fn test_short_input_single_chunk_keeps_absolute_times() {
    let chunks = segment(45.0, 3600.0, 8.0).unwrap();
    assert_eq!(chunks.len(), 1);

    let transcriber = MockChunkTranscriber::new("mock").with_fragments(vec![
        Fragment::new(1.0, 3.0, "only chunk"),
        Fragment::new(40.0, 44.0, "near the end"),
    ]);
    let stop = AtomicBool::new(false);

    let outcome = transcribe_chunks(
        &transcriber,
        &chunks,
        dummy_audio,
        &pool_config("en"),
        None,
        &stop,
    );
    let merged = merge::merge(&chunks, outcome.results, &MergeParams::default());

    assert_eq!(merged.timeline.len(), 2);
    assert_eq!(merged.timeline.fragments[0].start, 1.0);
    assert_eq!(merged.timeline.fragments[1].end, 44.0);
    assert_eq!(merged.duplicates_removed, 0);
}

#[test]
fn test_detected_language_flows_into_report() {
    let chunks = segment(150.0, 60.0, 5.0).unwrap();
    let transcriber = MockChunkTranscriber::new("mock")
        .with_fragments(vec![Fragment::new(1.0, 2.0, "annyeong")])
        .with_detected_language("ko");
    let stop = AtomicBool::new(false);

    let outcome = transcribe_chunks(
        &transcriber,
        &chunks,
        dummy_audio,
        &pool_config("auto"),
        None,
        &stop,
    );
    assert_eq!(outcome.detected_language.as_deref(), Some("ko"));

    let report = RunReport {
        chunk_count: chunks.len(),
        fragment_count: 3,
        detected_language: outcome.detected_language,
        ..RunReport::default()
    };
    assert!(!report.has_problems());
    assert!(report.summary().contains("detected language: ko"));
}

#[tokio::test]
async fn test_translate_stage_keeps_timing_and_survives_failures() {
    let chunks = segment(120.0, 60.0, 5.0).unwrap();
    let transcriber = MockChunkTranscriber::new("mock")
        .with_chunk_fragments(0, vec![Fragment::new(5.0, 8.0, "hello")])
        .with_chunk_fragments(1, vec![Fragment::new(20.0, 23.0, "goodbye")]);
    let stop = AtomicBool::new(false);

    let outcome = transcribe_chunks(
        &transcriber,
        &chunks,
        dummy_audio,
        &pool_config("en"),
        None,
        &stop,
    );
    let merged = merge::merge(&chunks, outcome.results, &MergeParams::default());
    assert_eq!(merged.timeline.len(), 2);

    let translator: Arc<dyn Translator> = Arc::new(
        MockTranslator::new()
            .with_mapping("hello", "annyeonghaseyo")
            .failing_on("goodbye"),
    );
    let options = TranslateOptions {
        request_delay: Duration::ZERO,
        ..TranslateOptions::default()
    };
    let translated = translate_timeline(translator, &merged.timeline, "ko", &options).await;

    assert_eq!(translated.errors.len(), 1);
    let fragments = &translated.timeline.fragments;
    assert_eq!(fragments[0].text, "annyeonghaseyo");
    assert_eq!(fragments[0].start, 5.0);
    assert_eq!(fragments[0].end, 8.0);
    // The failed fragment keeps its original text and timing
    assert_eq!(fragments[1].text, "goodbye");
    assert_eq!(fragments[1].start, 75.0);
    assert_eq!(fragments[1].end, 78.0);

    let rendered = srt::serialize(&translated.timeline);
    assert!(rendered.contains("annyeonghaseyo"));
    assert!(rendered.contains("00:01:15,000 --> 00:01:18,000"));
}
