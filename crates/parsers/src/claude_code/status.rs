use paneview_core::{ActivityState, SideSignals};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use super::{MODE_MARKERS, status_marker_text};
use crate::common::tail_lines;
use crate::{StatusReport, StatusWindow};

/// Interrupt affordance shown while a request is running
static INTERRUPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:esc|ctrl\+c) to interrupt\b").unwrap());

static CONTEXT_LABEL_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)context(?: window)? left(?: until auto-compact)?\s*:?\s*(\d{1,3})\s*%")
        .unwrap()
});

static CONTEXT_PERCENT_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3})\s*%\s*(?:of\s+)?context(?: window)? left").unwrap());

const MODE_LABEL_DELIMITERS: &[char] = &['(', '·', '|'];

/// Classify activity and read side signals from the tail of a snapshot.
///
/// Signal priority: the interrupt affordance in the status bar, then an
/// active spinner among the recent lines, then recent buffer changes. With
/// no signal at all the session reads as idle.
pub fn extract_status(
    text: &str,
    since_last_change: Option<Duration>,
    window: &StatusWindow,
) -> StatusReport {
    let status_bar = tail_lines(text, window.status_bar_lines);
    StatusReport {
        activity: classify_activity(text, since_last_change, window),
        side: extract_side_signals(&status_bar),
    }
}

pub fn classify_activity(
    text: &str,
    since_last_change: Option<Duration>,
    window: &StatusWindow,
) -> ActivityState {
    let status_bar = tail_lines(text, window.status_bar_lines);
    if status_bar.iter().any(|line| INTERRUPT_RE.is_match(line)) {
        return ActivityState::Working;
    }

    let recent = tail_lines(text, window.recent_lines);
    if recent.iter().any(|line| is_active_spinner(line)) {
        return ActivityState::Thinking;
    }

    match since_last_change {
        Some(elapsed) if elapsed < window.recent_change_threshold => ActivityState::Working,
        _ => ActivityState::Idle,
    }
}

/// A status line still in progress: `✢ Undulating… (3m 2s · thinking)`.
/// Completed markers such as `✻ Worked for 2m` carry no ellipsis.
fn is_active_spinner(line: &str) -> bool {
    status_marker_text(line).is_some_and(|text| text.contains('…') || text.contains("..."))
}

/// Remaining-context percentage and permission-mode label, when present.
pub fn extract_side_signals(status_bar: &[&str]) -> SideSignals {
    let mut side = SideSignals::default();
    for line in status_bar {
        if side.context_remaining_percent.is_none() {
            side.context_remaining_percent = context_percent(line);
        }
        if side.permission_mode.is_none() {
            side.permission_mode = permission_mode(line);
        }
    }
    side
}

fn context_percent(line: &str) -> Option<u8> {
    let caps = CONTEXT_LABEL_FIRST_RE
        .captures(line)
        .or_else(|| CONTEXT_PERCENT_FIRST_RE.captures(line))?;
    let value: u8 = caps.get(1)?.as_str().parse().ok()?;
    (value <= 100).then_some(value)
}

fn permission_mode(line: &str) -> Option<String> {
    let (idx, marker) = MODE_MARKERS
        .iter()
        .filter_map(|marker| line.find(marker).map(|idx| (idx, *marker)))
        .min_by_key(|(idx, _)| *idx)?;
    let rest = &line[idx + marker.len()..];
    let label = rest
        .split(MODE_LABEL_DELIMITERS)
        .next()
        .unwrap_or_default()
        .trim();
    let label = label.strip_suffix(" on").unwrap_or(label).trim();
    (!label.is_empty()).then(|| label.to_string())
}
