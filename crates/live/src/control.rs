use paneview_core::{ControlKey, Target};
use paneview_runtime_config::TmuxSettings;
use std::future::Future;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ControlError, Result};

/// The multiplexer side: read a pane, type into it, press named keys.
pub trait SessionControl: Send + Sync + 'static {
    /// Full visible buffer of `target`, plus configured scrollback.
    fn capture_snapshot(&self, target: &Target) -> impl Future<Output = Result<String>> + Send;

    /// Type `text` literally, then press Enter.
    fn issue_input(&self, target: &Target, text: &str) -> impl Future<Output = Result<()>> + Send;

    fn issue_key(&self, target: &Target, key: ControlKey) -> impl Future<Output = Result<()>> + Send;
}

/// [`SessionControl`] backed by the `tmux` command line.
#[derive(Debug, Clone)]
pub struct TmuxControl {
    binary: String,
    history_lines: u32,
}

impl TmuxControl {
    pub fn new(binary: impl Into<String>, history_lines: u32) -> Self {
        Self {
            binary: binary.into(),
            history_lines,
        }
    }

    pub fn from_settings(settings: &TmuxSettings) -> Self {
        Self::new(settings.binary.clone(), settings.history_lines)
    }

    fn capture_args(&self, target: &Target) -> Vec<String> {
        vec![
            "capture-pane".into(),
            "-p".into(),
            "-t".into(),
            target.to_string(),
            "-S".into(),
            format!("-{}", self.history_lines),
        ]
    }

    fn literal_args(target: &Target, text: &str) -> Vec<String> {
        vec![
            "send-keys".into(),
            "-t".into(),
            target.to_string(),
            "-l".into(),
            "--".into(),
            text.to_string(),
        ]
    }

    fn key_args(target: &Target, key_name: &str) -> Vec<String> {
        vec![
            "send-keys".into(),
            "-t".into(),
            target.to_string(),
            key_name.to_string(),
        ]
    }

    async fn run(&self, command: &'static str, target: &Target, args: Vec<String>) -> Result<String> {
        debug!("{} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ControlError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(command_error(command, target, stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SessionControl for TmuxControl {
    async fn capture_snapshot(&self, target: &Target) -> Result<String> {
        self.run("capture-pane", target, self.capture_args(target)).await
    }

    async fn issue_input(&self, target: &Target, text: &str) -> Result<()> {
        self.run("send-keys", target, Self::literal_args(target, text))
            .await?;
        self.run(
            "send-keys",
            target,
            Self::key_args(target, ControlKey::Enter.tmux_name()),
        )
        .await?;
        Ok(())
    }

    async fn issue_key(&self, target: &Target, key: ControlKey) -> Result<()> {
        self.run("send-keys", target, Self::key_args(target, key.tmux_name()))
            .await?;
        Ok(())
    }
}

fn command_error(command: &'static str, target: &Target, stderr: String) -> ControlError {
    let missing = ["can't find", "no server running", "session not found"]
        .iter()
        .any(|needle| stderr.contains(needle));
    if missing {
        ControlError::NoTarget(target.clone())
    } else {
        ControlError::Command {
            command,
            target: target.clone(),
            stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paneview_core::testing::target;

    #[test]
    fn capture_includes_history() {
        let tmux = TmuxControl::new("tmux", 200);
        assert_eq!(
            tmux.capture_args(&target()),
            vec!["capture-pane", "-p", "-t", "mobile:0", "-S", "-200"]
        );
    }

    #[test]
    fn input_is_sent_literally() {
        assert_eq!(
            TmuxControl::literal_args(&target(), "-rf; echo hi"),
            vec!["send-keys", "-t", "mobile:0", "-l", "--", "-rf; echo hi"]
        );
        assert_eq!(
            TmuxControl::key_args(&target(), ControlKey::Interrupt.tmux_name()),
            vec!["send-keys", "-t", "mobile:0", "C-c"]
        );
    }

    #[test]
    fn missing_pane_errors_are_classified() {
        let err = command_error("capture-pane", &target(), "can't find window: 9".into());
        assert!(matches!(err, ControlError::NoTarget(_)));
        let err = command_error("send-keys", &target(), "unknown key: C-q".into());
        assert_eq!(err.to_string(), "send-keys failed for mobile:0: unknown key: C-q");
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let tmux = TmuxControl::new("/nonexistent/paneview-tmux", 10);
        let err = tmux.capture_snapshot(&target()).await.unwrap_err();
        assert!(matches!(err, ControlError::Spawn { .. }));
    }
}
