use serde::{Deserialize, Serialize};

use crate::target::Target;

/// Text shown in the synthetic assistant turn while a reply is awaited.
pub const WORKING_PLACEHOLDER: &str = "…";

/// Who a turn is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One contiguous unit of dialogue attributed to a single role.
///
/// Turns coming out of the segmenter always carry at least one non-blank
/// line; use [`Turn::has_content`] before emitting hand-built ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub lines: Vec<String>,
}

impl Turn {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            lines: Vec::new(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            lines: vec![text.into()],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            lines: vec![text.into()],
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Lines joined with newlines, outer whitespace trimmed.
    pub fn text(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }

    pub fn has_content(&self) -> bool {
        self.lines.iter().any(|line| !line.trim().is_empty())
    }

    /// Drop blank lines at both ends, keeping inner paragraph breaks.
    pub fn trim_blank_edges(&mut self) {
        while self.lines.last().is_some_and(|l| l.trim().is_empty()) {
            self.lines.pop();
        }
        let leading = self
            .lines
            .iter()
            .take_while(|l| l.trim().is_empty())
            .count();
        self.lines.drain(..leading);
    }
}

/// Inferred operational phase of the remote interactive program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    #[default]
    Idle,
    Thinking,
    Working,
}

impl ActivityState {
    pub fn is_busy(self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Working => "working",
        }
    }
}

/// Optional values read from the status bar next to the activity state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideSignals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_remaining_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<String>,
}

impl SideSignals {
    pub fn is_empty(&self) -> bool {
        self.context_remaining_percent.is_none() && self.permission_mode.is_none()
    }
}

/// Everything a renderer needs to draw one tracked target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub target: Target,
    /// Authoritative turns segmented from the latest snapshot
    pub turns: Vec<Turn>,
    /// Locally issued input not yet seen in the transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_echo: Option<Turn>,
    pub show_working_indicator: bool,
    pub activity: ActivityState,
    #[serde(default)]
    pub side: SideSignals,
    /// False when the pane does not look like an assistant session
    pub structured: bool,
    /// Normalized pane text, set only for unstructured panes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl ViewModel {
    pub fn empty(target: Target) -> Self {
        Self {
            target,
            turns: Vec::new(),
            pending_echo: None,
            show_working_indicator: false,
            activity: ActivityState::Idle,
            side: SideSignals::default(),
            structured: false,
            raw_text: None,
        }
    }

    /// Turns in display order: transcript, then the optimistic echo, then the
    /// in-progress placeholder.
    pub fn rendered(&self) -> Vec<Turn> {
        let mut out = self.turns.clone();
        if let Some(echo) = &self.pending_echo {
            out.push(echo.clone());
        }
        if self.show_working_indicator {
            out.push(Turn::assistant(WORKING_PLACEHOLDER));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_blank_edges_keeps_inner_breaks() {
        let mut turn = Turn {
            role: Role::Assistant,
            lines: vec![
                "".into(),
                "first".into(),
                "".into(),
                "second".into(),
                "  ".into(),
            ],
        };
        turn.trim_blank_edges();
        assert_eq!(turn.lines, vec!["first", "", "second"]);
    }

    #[test]
    fn blank_turn_has_no_content() {
        let turn = Turn {
            role: Role::User,
            lines: vec!["   ".into(), "".into()],
        };
        assert!(!turn.has_content());
        assert_eq!(turn.text(), "");
    }

    #[test]
    fn rendered_appends_echo_then_placeholder() {
        let target: Target = "mobile:0".parse().unwrap();
        let mut view = ViewModel::empty(target);
        view.turns.push(Turn::user("hello"));
        view.turns.push(Turn::assistant("hi there"));
        view.pending_echo = Some(Turn::user("deploy now"));
        view.show_working_indicator = true;

        let rendered = view.rendered();
        assert_eq!(rendered.len(), 4);
        assert_eq!(rendered[2], Turn::user("deploy now"));
        assert_eq!(rendered[3].role, Role::Assistant);
        assert_eq!(rendered[3].text(), WORKING_PLACEHOLDER);
    }

    #[test]
    fn view_model_serializes_snake_case() {
        let target: Target = "mobile:2".parse().unwrap();
        let mut view = ViewModel::empty(target);
        view.activity = ActivityState::Thinking;
        view.side.context_remaining_percent = Some(12);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["activity"], "thinking");
        assert_eq!(json["side"]["context_remaining_percent"], 12);
        assert!(json["side"].get("permission_mode").is_none());
        assert_eq!(json["target"]["session"], "mobile");
        assert_eq!(json["target"]["window"], 2);
    }
}
