//! LRC timed lyrics.

use std::sync::LazyLock;

use regex::Regex;

static RE_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d+):(\d{1,2})(?:[.:](\d{1,3}))?\]").expect("invalid RE_STAMP regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrcLine {
    pub at_ms: u64,
    pub text: String,
}

impl LrcLine {
    pub fn seconds(&self) -> u64 {
        self.at_ms / 1000
    }
}

/// Parse LRC text into lines sorted by time.
///
/// A line may carry several leading timestamps and is repeated once per
/// timestamp. Tag lines such as `[ar:...]` and lines without a timestamp are
/// dropped.
pub fn parse(text: &str) -> Vec<LrcLine> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let mut rest = raw.trim_end_matches('\r');
        let mut stamps = Vec::new();
        while let Some(caps) = RE_STAMP.captures(rest) {
            if let Some(at_ms) = stamp_ms(&caps) {
                stamps.push(at_ms);
            }
            rest = &rest[caps[0].len()..];
        }
        let text = rest.trim();
        lines.extend(stamps.into_iter().map(|at_ms| LrcLine { at_ms, text: text.to_string() }));
    }
    lines.sort_by_key(|l| l.at_ms);
    lines
}

/// Milliseconds for one `[mm:ss.xx]` stamp, `None` if it does not fit.
fn stamp_ms(caps: &regex::Captures<'_>) -> Option<u64> {
    let minutes: u64 = caps[1].parse().ok()?;
    let seconds: u64 = caps[2].parse().ok()?;
    let fraction = caps.get(3).map_or(0, |m| {
        let digits = m.as_str();
        let value: u64 = digits.parse().unwrap_or(0);
        value * 10u64.pow(3 - digits.len() as u32)
    });
    minutes.checked_mul(60)?.checked_add(seconds)?.checked_mul(1000)?.checked_add(fraction)
}

/// Index of the last line that has started by `elapsed` seconds.
pub fn current_line(lines: &[LrcLine], elapsed: u64) -> Option<usize> {
    lines.partition_point(|l| l.seconds() <= elapsed).checked_sub(1)
}
