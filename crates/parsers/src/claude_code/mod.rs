//! Interpreter for Claude Code's terminal UI.
//!
//! ```text
//! ❯ fix the failing test                     ← user prompt (column 0)
//! ⏺ Read(src/lib.rs)                          ← tool invocation
//!   ⎿  Read 120 lines                         ← tool result
//! ⏺ The assertion compares the wrong field.   ← assistant prose
//! ✻ Pondering… (esc to interrupt)             ← spinner / status marker
//! ──────────────────────────────────────────
//! ❯                                           ← input prompt, always redrawn
//! ──────────────────────────────────────────
//!   ⏵⏵ accept edits on (shift+tab to cycle)   ← footer: permission mode
//! ```

mod segment;
mod status;

pub use segment::segment;
pub use status::{classify_activity, extract_side_signals, extract_status};

use crate::{StatusReport, StatusWindow, TranscriptInterpreter};
use paneview_core::Turn;
use std::time::Duration;

/// Prompt glyph that opens a user turn.
pub const PROMPT_GLYPH: char = '❯';
/// Bullets that open an assistant block (`●` on Linux and Windows builds).
pub const ASSISTANT_GLYPHS: &[char] = &['⏺', '●'];
/// Gutter glyph in front of tool output.
pub const TOOL_RESULT_GLYPH: char = '⎿';
/// Spinner frames drawn in front of the status line.
pub const SPINNER_GLYPHS: &[char] = &['·', '✻', '✽', '✶', '✳', '✢', '*'];
/// Markers in front of the permission-mode label in the footer.
pub const MODE_MARKERS: &[&str] = &["⏵⏵", "▶▶", "⏸"];

pub struct ClaudeCodeInterpreter;

impl TranscriptInterpreter for ClaudeCodeInterpreter {
    fn name(&self) -> &str {
        "claude-code"
    }

    fn can_interpret(&self, text: &str) -> bool {
        is_structured(text)
    }

    fn extract_status(
        &self,
        text: &str,
        since_last_change: Option<Duration>,
        window: &StatusWindow,
    ) -> StatusReport {
        extract_status(text, since_last_change, window)
    }

    fn segment(&self, text: &str) -> Vec<Turn> {
        segment(text)
    }
}

/// Text after a spinner glyph at column 0, e.g. `Worked for 2m` or
/// `Undulating… (esc to interrupt)`. Both the status extractor and the
/// segmenter recognize status lines through this.
pub(crate) fn status_marker_text(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    let glyph = chars.next()?;
    if !SPINNER_GLYPHS.contains(&glyph) {
        return None;
    }
    let rest = chars.as_str();
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

/// The prompt glyph together with any of the response/tool/footer glyphs.
pub fn is_structured(text: &str) -> bool {
    text.contains(PROMPT_GLYPH)
        && (text.contains(ASSISTANT_GLYPHS)
            || text.contains(TOOL_RESULT_GLYPH)
            || text.contains(MODE_MARKERS[0]))
}
