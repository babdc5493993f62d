use paneview_core::{ActivityState, Role, Turn};
use regex::Regex;
use std::sync::LazyLock;

use super::{
    ASSISTANT_GLYPHS, MODE_MARKERS, PROMPT_GLYPH, TOOL_RESULT_GLYPH, classify_activity,
    status_marker_text,
};
use crate::StatusWindow;
use crate::common::{is_blank, is_ellipsis_line, is_rule_line};

/// `Read(src/lib.rs)`, `Bash(cargo test)`, `Web Search("rust regex")`
static TOOL_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:Read|Write|Edit|MultiEdit|Update|Create|Delete|Search|Grep|Glob|List|LS",
        r"|Fetch|WebFetch|WebSearch|Web Search|Bash|Shell|Execute|Run|Task|Agent",
        r"|TodoWrite|NotebookEdit|NotebookRead)\s*\(",
    ))
    .unwrap()
});

/// Collapsed tool summaries: `Read 3 files (ctrl+o to expand)`, `Update Todos`
static TOOL_SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:Update Todos\b|(?:Read|Wrote|Edited|Updated|Listed|Searched for|Fetched|Ran)\s+\d+\s+\w+)",
    )
    .unwrap()
});

static MCP_CALL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(MCP\)").unwrap());

/// Footer hints and status-bar text that never belong to a turn.
static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*\?\s+for shortcuts|shift\+tab to cycle|context left until auto-compact|^\s*esc to interrupt",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Chrome,
    Blank,
    StatusMarker,
    UserPrompt(&'a str),
    AssistantMarker(&'a str),
    ToolResult,
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if is_rule_line(line) || is_ellipsis_line(line) || is_footer(line) {
        return Line::Chrome;
    }
    if is_blank(line) {
        return Line::Blank;
    }
    if is_status_marker(line) {
        return Line::StatusMarker;
    }
    if let Some(prompt) = strip_prompt(line) {
        return Line::UserPrompt(prompt);
    }
    let indented = line.trim_start();
    if let Some(rest) = indented.strip_prefix(ASSISTANT_GLYPHS) {
        return Line::AssistantMarker(rest.trim());
    }
    if indented.starts_with(TOOL_RESULT_GLYPH) {
        return Line::ToolResult;
    }
    Line::Text(line.trim())
}

fn is_footer(line: &str) -> bool {
    let indented = line.trim_start();
    MODE_MARKERS.iter().any(|m| indented.starts_with(m)) || FOOTER_RE.is_match(line)
}

fn is_status_marker(line: &str) -> bool {
    status_marker_text(line).is_some()
}

/// Prompt glyph at column 0, followed by whitespace or nothing.
fn strip_prompt(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(PROMPT_GLYPH)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

pub(crate) fn is_tool_invocation(text: &str) -> bool {
    TOOL_CALL_RE.is_match(text) || TOOL_SUMMARY_RE.is_match(text) || MCP_CALL_RE.is_match(text)
}

/// A turn plus whether the pane showed that it was actually sent: a status
/// marker or an assistant block after a user prompt.
struct Built {
    turn: Turn,
    answered: bool,
}

#[derive(Default)]
struct Segmenter {
    turns: Vec<Built>,
    current: Option<Built>,
    in_tool_block: bool,
}

impl Segmenter {
    fn feed(&mut self, line: &str) {
        match classify(line) {
            Line::Chrome => {}
            Line::Blank => {
                if !self.in_tool_block && self.current_role() == Some(Role::Assistant) {
                    self.push_line(String::new());
                }
            }
            Line::StatusMarker => self.mark_answered(),
            Line::UserPrompt(prompt) => {
                self.start(Role::User);
                self.push_line(prompt.to_string());
                self.in_tool_block = false;
            }
            Line::AssistantMarker(rest) => {
                self.mark_answered();
                if self.current_role() != Some(Role::Assistant) {
                    self.start(Role::Assistant);
                }
                if is_tool_invocation(rest) {
                    self.in_tool_block = true;
                } else {
                    self.in_tool_block = false;
                    self.separate_block();
                    self.push_line(rest.to_string());
                }
            }
            Line::ToolResult => self.in_tool_block = true,
            Line::Text(text) => {
                if !self.in_tool_block {
                    self.push_line(text.to_string());
                }
            }
        }
    }

    fn current_role(&self) -> Option<Role> {
        self.current.as_ref().map(|built| built.turn.role)
    }

    fn start(&mut self, role: Role) {
        self.emit();
        self.current = Some(Built {
            turn: Turn::new(role),
            answered: false,
        });
    }

    fn emit(&mut self) {
        if let Some(built) = self.current.take() {
            self.turns.push(built);
        }
    }

    fn push_line(&mut self, line: String) {
        if let Some(built) = self.current.as_mut() {
            built.turn.lines.push(line);
        }
    }

    /// Credit the most recent user turn with a reply or status line.
    fn mark_answered(&mut self) {
        let latest_user = self
            .current
            .iter_mut()
            .chain(self.turns.iter_mut().rev())
            .find(|built| built.turn.is_user());
        if let Some(built) = latest_user {
            built.answered = true;
        }
    }

    /// A new `⏺` block after earlier prose starts a new paragraph.
    fn separate_block(&mut self) {
        if let Some(built) = self.current.as_mut() {
            if built.turn.lines.last().is_some_and(|l| !is_blank(l)) {
                built.turn.lines.push(String::new());
            }
        }
    }

    fn finish(mut self, text: &str) -> Vec<Turn> {
        self.emit();
        let mut turns: Vec<Built> = self
            .turns
            .into_iter()
            .filter_map(|mut built| {
                built.turn.trim_blank_edges();
                built.turn.has_content().then_some(built)
            })
            .collect();

        // The input prompt is redrawn on every idle screen, often with a
        // ghost suggestion in it. A trailing user turn nothing responded to
        // is only kept while the session is busy.
        if turns
            .last()
            .is_some_and(|built| built.turn.is_user() && !built.answered)
            && classify_activity(text, None, &StatusWindow::default()) == ActivityState::Idle
        {
            turns.pop();
        }

        turns.into_iter().map(|built| built.turn).collect()
    }
}

/// Split a normalized Claude Code screen into role-tagged turns, oldest first.
///
/// Tool invocations and their output are left out; every returned turn has
/// at least one non-blank line.
pub fn segment(text: &str) -> Vec<Turn> {
    let mut segmenter = Segmenter::default();
    for line in text.lines() {
        segmenter.feed(line);
    }
    segmenter.finish(text)
}
