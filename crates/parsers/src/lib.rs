pub mod claude_code;
pub mod normalize;

pub(crate) mod common;

pub use normalize::normalize;

use paneview_core::{ActivityState, SideSignals, Turn};
use std::time::Duration;

/// How much of a snapshot's tail the status extractor looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWindow {
    /// Non-blank lines treated as the status bar
    pub status_bar_lines: usize,
    /// Non-blank lines searched for an active spinner
    pub recent_lines: usize,
    /// Buffer changes younger than this count as activity
    pub recent_change_threshold: Duration,
}

impl Default for StatusWindow {
    fn default() -> Self {
        Self {
            status_bar_lines: 5,
            recent_lines: 15,
            recent_change_threshold: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub activity: ActivityState,
    pub side: SideSignals,
}

/// Reads one kind of interactive assistant UI out of normalized pane text.
pub trait TranscriptInterpreter: Send + Sync {
    /// Interpreter name (e.g. "claude-code")
    fn name(&self) -> &str;

    /// Whether the text looks like this assistant's UI at all
    fn can_interpret(&self, text: &str) -> bool;

    fn extract_status(
        &self,
        text: &str,
        since_last_change: Option<Duration>,
        window: &StatusWindow,
    ) -> StatusReport;

    /// Role-tagged turns, oldest first
    fn segment(&self, text: &str) -> Vec<Turn>;
}

/// Get all available interpreters
pub fn all_interpreters() -> Vec<Box<dyn TranscriptInterpreter>> {
    vec![Box::new(claude_code::ClaudeCodeInterpreter)]
}

/// First interpreter that recognizes the normalized text.
pub fn find_interpreter(text: &str) -> Option<Box<dyn TranscriptInterpreter>> {
    all_interpreters()
        .into_iter()
        .find(|interpreter| interpreter.can_interpret(text))
}

/// One-shot reading of a raw snapshot, for offline inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub normalized: String,
    /// Name of the interpreter that recognized the text, if any
    pub interpreter: Option<String>,
    pub status: StatusReport,
    pub turns: Vec<Turn>,
}

impl Interpretation {
    pub fn is_structured(&self) -> bool {
        self.interpreter.is_some()
    }
}

/// Normalize, then segment and classify with the first matching interpreter.
/// Unrecognized text yields no turns and an idle status.
pub fn interpret(
    raw: &str,
    since_last_change: Option<Duration>,
    window: &StatusWindow,
) -> Interpretation {
    let normalized = normalize(raw);
    let Some(interpreter) = find_interpreter(&normalized) else {
        return Interpretation {
            normalized,
            interpreter: None,
            status: StatusReport::default(),
            turns: Vec::new(),
        };
    };
    Interpretation {
        interpreter: Some(interpreter.name().to_string()),
        status: interpreter.extract_status(&normalized, since_last_change, window),
        turns: interpreter.segment(&normalized),
        normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paneview_core::testing::{assistant, screen, user};

    #[test]
    fn finds_claude_code_for_structured_text() {
        let interpreter = find_interpreter("❯ hi\n⏺ hello").expect("interpreter");
        assert_eq!(interpreter.name(), "claude-code");
        assert!(find_interpreter("$ ls\nCargo.toml").is_none());
    }

    #[test]
    fn interpret_runs_the_whole_pipeline() {
        let raw = screen(&[
            "\x1b[1m❯\x1b[0m hello",
            "⏺ hi there",
            "",
            "────────────────",
            "❯ ",
            "────────────────",
            "  ⏵⏵ accept edits on (shift+tab to cycle)",
        ]);
        let result = interpret(&raw, None, &StatusWindow::default());
        assert!(result.is_structured());
        assert_eq!(result.turns, vec![user(&["hello"]), assistant(&["hi there"])]);
        assert_eq!(result.status.activity, ActivityState::Idle);
        assert_eq!(result.status.side.permission_mode.as_deref(), Some("accept edits"));
    }

    #[test]
    fn unstructured_text_is_only_normalized() {
        let result = interpret("$ cargo build\r\n   Compiling\r\n", None, &StatusWindow::default());
        assert!(!result.is_structured());
        assert!(result.turns.is_empty());
        assert_eq!(result.normalized, "$ cargo build\n   Compiling");
    }
}
