//! Repair for single-line subtitle dumps.
//!
//! Some transcriber front-ends write `N HH:MM:SS,mmm --> HH:MM:SS,mmm text`
//! with everything on one line, occasionally using `.` instead of `,` for
//! milliseconds. This pass recovers those lines into a proper timeline:
//! parse, sort by the original block number, renumber on serialization.

use crate::subtitle::srt::{ParseSkip, parse_timestamp};
use crate::subtitle::{Fragment, Timeline};

/// How much of an unparseable line is kept in its skip record.
const SKIP_SNIPPET_LEN: usize = 100;

/// Result of an inline repair pass.
#[derive(Debug, Clone, Default)]
pub struct RepairOutcome {
    /// Recovered fragments, ordered by their original block numbers.
    pub timeline: Timeline,
    /// Lines that matched nothing, with line numbers and a content snippet.
    pub failed: Vec<ParseSkip>,
}

/// Recover inline subtitle lines from `input`.
///
/// Blank lines are ignored. Any other line that does not match
/// `number start --> end text` is recorded in `failed`. Never fails:
/// a fully unparseable input yields an empty timeline and one failure
/// per line, and the caller decides what that means.
pub fn repair_inline(input: &str) -> RepairOutcome {
    let mut entries: Vec<(u64, Fragment)> = Vec::new();
    let mut failed = Vec::new();

    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match parse_inline_line(line) {
            Some(entry) => entries.push(entry),
            None => failed.push(ParseSkip {
                line: i + 1,
                message: snippet(line),
            }),
        }
    }

    entries.sort_by_key(|(number, _)| *number);
    RepairOutcome {
        timeline: Timeline::new(entries.into_iter().map(|(_, f)| f).collect()),
        failed,
    }
}

fn parse_inline_line(line: &str) -> Option<(u64, Fragment)> {
    let mut tokens = line.split_whitespace();
    let number: u64 = tokens.next()?.parse().ok()?;
    let start = parse_timestamp(tokens.next()?)?;
    if tokens.next()? != "-->" {
        return None;
    }
    let end = parse_timestamp(tokens.next()?)?;
    if end < start {
        return None;
    }
    let text = tokens.collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }
    Some((number, Fragment::new(start, end, text)))
}

fn snippet(line: &str) -> String {
    if line.chars().count() <= SKIP_SNIPPET_LEN {
        line.to_string()
    } else {
        line.chars().take(SKIP_SNIPPET_LEN).collect()
    }
}
