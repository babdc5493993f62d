use regex::Regex;
use std::sync::LazyLock;

use crate::common::{is_blank, is_box_border_line};

/// CSI, OSC, DCS/PM/APC strings, charset designation and other two-byte escapes.
static ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\x1b\[[0-?]*[ -/]*[@-~]",
        r"|\x1b\][^\x07\x1b\n]*(?:\x07|\x1b\\)",
        r"|\x1b[PX^_][^\x1b]*\x1b\\",
        r"|\x1b[()*+][0-9A-Za-z@<=>]",
        r"|\x1b[ -/]*[0-~]",
    ))
    .unwrap()
});

/// C0 controls except tab and newline, DEL, and C1 controls.
static CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B-\x1F\x7F\x{80}-\x{9F}]").unwrap());

const VERTICAL_BORDERS: &[char] = &['│', '┃', '║', '╎', '╏', '┆', '┇', '┊', '┋'];

/// Blank runs longer than this are collapsed.
const MAX_BLANK_RUN: usize = 2;

/// Reduce a raw pane capture to plain text.
///
/// Removes escape sequences and control bytes, drops box-drawing rules,
/// peels vertical box borders off each line, collapses long blank runs and
/// trims blank lines at both ends. Normalizing already-normalized text
/// returns it unchanged.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = raw.replace("\r\n", "\n");
    let text = ESCAPE_RE.replace_all(&text, "");
    let text = CONTROL_RE.replace_all(&text, "");

    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;
    for line in text.split('\n') {
        let line = line.trim_end();
        if is_box_border_line(line) {
            continue;
        }
        let line = strip_vertical_borders(line);
        if is_blank(line) {
            blank_run += 1;
            if blank_run > MAX_BLANK_RUN {
                continue;
            }
            lines.push("");
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }

    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Peel `│ ... │` style borders off a line, repeating until none are left so
/// nested frames come off in one pass.
fn strip_vertical_borders(line: &str) -> &str {
    let mut s = line;
    while let Some(rest) = s.trim_start().strip_prefix(VERTICAL_BORDERS) {
        s = rest.strip_prefix(' ').unwrap_or(rest);
    }
    while let Some(rest) = s.trim_end().strip_suffix(VERTICAL_BORDERS) {
        s = rest;
    }
    s.trim_end()
}
