//! SRT serialization and parsing.
//!
//! Blocks of `index`, `HH:MM:SS,mmm --> HH:MM:SS,mmm`, one or more text
//! lines, and a blank separator. Serialization renumbers from 1; parsing
//! recovers from malformed blocks by skipping them and recording the line
//! number of each skip.

use crate::error::{Result, SubfuseError};
use crate::subtitle::{Fragment, Timeline};

/// A malformed block skipped during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseSkip {
    /// 1-based line number where the block starts.
    pub line: usize,
    /// What was wrong with the block.
    pub message: String,
}

/// Result of parsing an SRT document.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Fragments recovered from well-formed blocks, in file order.
    pub timeline: Timeline,
    /// Blocks that were skipped, with their starting line numbers.
    pub skipped: Vec<ParseSkip>,
}

/// Format fractional seconds as `HH:MM:SS,mmm`, rounding half-up to the
/// millisecond.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Parse `HH:MM:SS,mmm` (or the `.`-separated variant some tools emit)
/// into fractional seconds. Returns None on any structural mismatch.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let mut parts = value.trim().splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let rest = parts.next()?;

    let (secs_str, millis_str) = rest
        .split_once(',')
        .or_else(|| rest.split_once('.'))
        .unwrap_or((rest, "0"));
    let secs: u64 = secs_str.parse().ok()?;
    if millis_str.is_empty() || millis_str.len() > 3 {
        return None;
    }
    let millis: u64 = millis_str.parse().ok()?;
    // "SS,5" means 500ms, not 5ms
    let millis = millis * 10_u64.pow(3 - millis_str.len() as u32);

    if minutes >= 60 || secs >= 60 {
        return None;
    }
    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + secs as f64 + millis as f64 / 1000.0)
}

/// Serialize a timeline as SRT. Indices are assigned 1-based in order,
/// never carried over from any previous numbering.
pub fn serialize(timeline: &Timeline) -> String {
    let mut out = String::new();
    for (i, fragment) in timeline.fragments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(fragment.start),
            format_timestamp(fragment.end),
            fragment.text.trim()
        ));
    }
    out
}

/// Parse an SRT document.
///
/// Malformed blocks (bad index line, unparsable timestamps, missing text,
/// out-of-order indices) are skipped and recorded. Fails only when the
/// document contained blocks but none could be recovered.
///
/// # Errors
///
/// Returns `MalformedSubtitle` for the first skipped block when no block
/// in a non-empty document parsed.
pub fn parse(input: &str) -> Result<ParseOutcome> {
    let mut outcome = ParseOutcome::default();
    let mut last_index: u64 = 0;

    for block in blocks_of(input) {
        match parse_block(&block, last_index) {
            Ok((index, fragment)) => {
                last_index = index;
                outcome.timeline.fragments.push(fragment);
            }
            Err(skip) => outcome.skipped.push(skip),
        }
    }

    if outcome.timeline.is_empty()
        && let Some(first) = outcome.skipped.first()
    {
        return Err(SubfuseError::MalformedSubtitle {
            line: first.line,
            message: format!("no parseable blocks: {}", first.message),
        });
    }
    Ok(outcome)
}

/// A contiguous run of non-blank lines plus the 1-based number of its
/// first line.
struct Block {
    first_line: usize,
    lines: Vec<String>,
}

fn blocks_of(input: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;

    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
        } else {
            current
                .get_or_insert_with(|| Block {
                    first_line: i + 1,
                    lines: Vec::new(),
                })
                .lines
                .push(line.to_string());
        }
    }
    if let Some(block) = current.take() {
        blocks.push(block);
    }
    blocks
}

fn parse_block(block: &Block, last_index: u64) -> std::result::Result<(u64, Fragment), ParseSkip> {
    let skip = |message: String| ParseSkip {
        line: block.first_line,
        message,
    };

    if block.lines.len() < 3 {
        return Err(skip("incomplete block".to_string()));
    }

    let index: u64 = block.lines[0]
        .trim()
        .parse()
        .map_err(|_| skip(format!("invalid index line '{}'", block.lines[0])))?;
    if index <= last_index {
        return Err(skip(format!(
            "index {index} not increasing (previous {last_index})"
        )));
    }

    let (start_str, end_str) = block.lines[1]
        .split_once("-->")
        .ok_or_else(|| skip("missing '-->' time line".to_string()))?;
    let start = parse_timestamp(start_str)
        .ok_or_else(|| skip(format!("unparsable timestamp '{}'", start_str.trim())))?;
    let end = parse_timestamp(end_str)
        .ok_or_else(|| skip(format!("unparsable timestamp '{}'", end_str.trim())))?;
    if end < start {
        return Err(skip(format!("end {end:.3} precedes start {start:.3}")));
    }

    let text = block.lines[2..].join("\n");
    Ok((index, Fragment::new(start, end, text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_timeline() -> Timeline {
        Timeline::new(vec![
            Fragment::new(0.0, 2.5, "First line"),
            Fragment::new(3.0, 5.0, "Second line"),
            Fragment::new(3600.0, 3602.5, "hello world"),
        ])
    }

    #[test]
    fn test_format_timestamp_basic() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(3661.5), "01:01:01,500");
        assert_eq!(format_timestamp(7325.042), "02:02:05,042");
    }

    #[test]
    fn test_format_timestamp_rounds_half_up() {
        assert_eq!(format_timestamp(0.0005), "00:00:00,001");
        assert_eq!(format_timestamp(0.0004), "00:00:00,000");
        assert_eq!(format_timestamp(2.0006), "00:00:02,001");
        assert_eq!(format_timestamp(2.0004), "00:00:02,000");
    }

    #[test]
    fn test_parse_timestamp_comma_and_dot() {
        assert_eq!(parse_timestamp("00:00:01,500"), Some(1.5));
        assert_eq!(parse_timestamp("00:00:01.500"), Some(1.5));
        assert_eq!(parse_timestamp("01:01:01,500"), Some(3661.5));
        assert_eq!(parse_timestamp("10:00:00,000"), Some(36000.0));
    }

    #[test]
    fn test_parse_timestamp_short_millis() {
        // "01,5" is 500ms
        assert_eq!(parse_timestamp("00:00:01,5"), Some(1.5));
        assert_eq!(parse_timestamp("00:00:01,05"), Some(1.05));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("not a time"), None);
        assert_eq!(parse_timestamp("00:99:00,000"), None);
        assert_eq!(parse_timestamp("00:00:75,000"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("00:00:01,1234"), None);
    }

    #[test]
    fn test_serialize_renumbers_from_one() {
        let srt = serialize(&make_timeline());
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nFirst line\n"));
        assert!(srt.contains("\n2\n00:00:03,000 --> 00:00:05,000\nSecond line\n"));
        assert!(srt.contains("\n3\n01:00:00,000 --> 01:00:02,500\nhello world\n"));
        assert!(srt.ends_with("\n\n"));
    }

    #[test]
    fn test_round_trip_preserves_timeline() {
        let original = make_timeline();
        let outcome = parse(&serialize(&original)).unwrap();
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.timeline, original);
    }

    #[test]
    fn test_parse_multi_line_text() {
        let srt = "1\n00:00:00,000 --> 00:00:02,000\nline one\nline two\n\n";
        let outcome = parse(srt).unwrap();
        assert_eq!(outcome.timeline.fragments[0].text, "line one\nline two");
    }

    #[test]
    fn test_parse_skips_malformed_block_and_records_line() {
        let srt = "\
1
00:00:00,000 --> 00:00:02,000
fine

2
garbage timestamp line
broken

3
00:00:05,000 --> 00:00:06,000
also fine

";
        let outcome = parse(srt).unwrap();
        assert_eq!(outcome.timeline.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].line, 5);
        assert!(outcome.skipped[0].message.contains("-->"));
    }

    #[test]
    fn test_parse_skips_non_monotonic_index() {
        let srt = "\
1
00:00:00,000 --> 00:00:02,000
first

1
00:00:03,000 --> 00:00:04,000
repeated index

";
        let outcome = parse(srt).unwrap();
        assert_eq!(outcome.timeline.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].message.contains("not increasing"));
    }

    #[test]
    fn test_parse_skips_inverted_times() {
        let srt = "1\n00:00:05,000 --> 00:00:02,000\nbackwards\n\n2\n00:00:06,000 --> 00:00:07,000\nok\n\n";
        let outcome = parse(srt).unwrap();
        assert_eq!(outcome.timeline.len(), 1);
        assert_eq!(outcome.timeline.fragments[0].text, "ok");
    }

    #[test]
    fn test_parse_empty_input_is_empty_timeline() {
        let outcome = parse("").unwrap();
        assert!(outcome.timeline.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_parse_fails_when_nothing_salvageable() {
        let err = parse("complete\ngarbage\n\n").unwrap_err();
        match err {
            SubfuseError::MalformedSubtitle { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_accepts_crlf_line_endings() {
        let srt = "1\r\n00:00:00,000 --> 00:00:01,000\r\nwindows\r\n\r\n";
        let outcome = parse(srt).unwrap();
        assert_eq!(outcome.timeline.len(), 1);
        assert_eq!(outcome.timeline.fragments[0].text, "windows");
    }

    #[test]
    fn test_parse_accepts_dot_millis_and_serialize_normalizes() {
        let srt = "1\n00:00:00.250 --> 00:00:01.750\ndotted\n\n";
        let outcome = parse(srt).unwrap();
        assert_eq!(outcome.timeline.fragments[0].start, 0.25);
        let rendered = serialize(&outcome.timeline);
        assert!(rendered.contains("00:00:00,250 --> 00:00:01,750"));
    }
}
