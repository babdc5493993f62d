use anyhow::{Context, Result};
use paneview_core::{ActivityState, Role, SideSignals, Turn, ViewModel};
use paneview_parsers::Interpretation;
use serde::Serialize;

/// Output format for transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    /// One JSON envelope per line
    Json,
}

/// Structured output envelope.
#[derive(Debug, Serialize)]
pub struct OutputEnvelope<T: Serialize> {
    pub version: &'static str,
    #[serde(rename = "type")]
    pub data_type: &'static str,
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    pub data: T,
}

impl<T: Serialize> OutputEnvelope<T> {
    pub fn new(data_type: &'static str, data: T) -> Self {
        Self {
            version: "0.1",
            data_type,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }

    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize output")
    }
}

#[derive(Debug, Serialize)]
struct InterpretationData<'a> {
    interpreter: Option<&'a str>,
    activity: ActivityState,
    side: &'a SideSignals,
    turns: &'a [Turn],
}

pub fn print_view(view: &ViewModel, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_view(view)),
        OutputFormat::Json => println!("{}", OutputEnvelope::new("view", view).to_line()?),
    }
    Ok(())
}

pub fn print_interpretation(result: &Interpretation, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_interpretation(result)),
        OutputFormat::Json => {
            let data = InterpretationData {
                interpreter: result.interpreter.as_deref(),
                activity: result.status.activity,
                side: &result.status.side,
                turns: &result.turns,
            };
            println!("{}", OutputEnvelope::new("interpretation", data).to_line()?);
        }
    }
    Ok(())
}

/// Header line plus the rendered transcript, or the raw pane text for
/// panes that are not an assistant session.
pub fn render_view(view: &ViewModel) -> String {
    let mut out = header(&view.target.to_string(), view.activity, &view.side);
    match (&view.raw_text, view.structured) {
        (Some(raw), false) => {
            out.push_str(raw);
            out.push('\n');
        }
        _ => out.push_str(&render_turns(&view.rendered())),
    }
    out
}

pub fn render_interpretation(result: &Interpretation) -> String {
    let label = result.interpreter.as_deref().unwrap_or("unrecognized");
    let mut out = header(label, result.status.activity, &result.status.side);
    if result.is_structured() {
        out.push_str(&render_turns(&result.turns));
    } else {
        out.push_str(&result.normalized);
        out.push('\n');
    }
    out
}

fn header(label: &str, activity: ActivityState, side: &SideSignals) -> String {
    let mut parts = vec![activity.label().to_string()];
    if let Some(mode) = &side.permission_mode {
        parts.push(mode.clone());
    }
    if let Some(percent) = side.context_remaining_percent {
        parts.push(format!("{percent}% context left"));
    }
    format!("[{label}] {}\n", parts.join(" · "))
}

fn render_turns(turns: &[Turn]) -> String {
    let mut out = String::new();
    for turn in turns {
        let label = match turn.role {
            Role::User => "you",
            Role::Assistant => "ai",
        };
        for (i, line) in turn.lines.iter().enumerate() {
            let gutter = if i == 0 { label } else { "" };
            if line.is_empty() {
                out.push_str(&format!("{gutter:>3} │\n"));
            } else {
                out.push_str(&format!("{gutter:>3} │ {line}\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use paneview_core::testing::{assistant, target, user};

    #[test]
    fn renders_turns_with_role_gutter() {
        let mut view = ViewModel::empty(target());
        view.structured = true;
        view.turns = vec![user(&["hello"]), assistant(&["hi", "", "there"])];
        view.side.permission_mode = Some("accept edits".into());
        view.side.context_remaining_percent = Some(12);
        assert_eq!(
            render_view(&view),
            "[mobile:0] idle · accept edits · 12% context left\n\
             you │ hello\n\
             \x20ai │ hi\n\
             \x20   │\n\
             \x20   │ there\n"
        );
    }

    #[test]
    fn renders_echo_and_placeholder() {
        let mut view = ViewModel::empty(target());
        view.structured = true;
        view.pending_echo = Some(user(&["deploy now"]));
        view.show_working_indicator = true;
        view.activity = ActivityState::Working;
        assert_eq!(
            render_view(&view),
            "[mobile:0] working\nyou │ deploy now\n ai │ …\n"
        );
    }

    #[test]
    fn raw_panes_print_their_text() {
        let mut view = ViewModel::empty(target());
        view.raw_text = Some("$ ls\nCargo.toml".into());
        assert_eq!(render_view(&view), "[mobile:0] idle\n$ ls\nCargo.toml\n");
    }

    #[test]
    fn json_envelope_carries_type_and_data() {
        let view = ViewModel::empty(target());
        let line = OutputEnvelope::new("view", &view).to_line().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "view");
        assert_eq!(value["data"]["target"]["session"], "mobile");
        assert!(value["@timestamp"].as_str().is_some());
    }
}
