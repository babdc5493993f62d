use anyhow::{Context, Result, bail};
use paneview_core::{ControlKey, Target};
use paneview_live::{HubConfig, HubHandle, TmuxControl, spawn_hub};
use paneview_runtime_config::PaneviewConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::output::{OutputFormat, print_view};

/// Prefix for stdin lines that press a named key instead of typing text.
const KEY_COMMAND: &str = ":key ";

#[derive(Debug, PartialEq, Eq)]
enum StdinLine {
    Text(String),
    Key(ControlKey),
}

fn parse_stdin_line(line: &str) -> Result<Option<StdinLine>> {
    if let Some(name) = line.strip_prefix(KEY_COMMAND) {
        let key = name
            .parse::<ControlKey>()
            .with_context(|| format!("Unknown key '{}'", name.trim()))?;
        return Ok(Some(StdinLine::Key(key)));
    }
    if line.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(StdinLine::Text(line.to_string())))
}

/// Follow `targets`, printing each view as it changes. Lines read from stdin
/// go to the first target until stdin closes; Ctrl-C stops.
pub async fn run_watch(
    config: &PaneviewConfig,
    targets: Vec<Target>,
    format: OutputFormat,
) -> Result<()> {
    let Some(input_target) = targets.first().cloned() else {
        bail!("No target to watch");
    };

    let control = TmuxControl::from_settings(&config.tmux);
    let (hub, mut updates, task) = spawn_hub(control, HubConfig::from_config(config));
    for target in &targets {
        hub.show(target.clone())?;
    }
    info!(
        "Watching {} (input goes to {input_target})",
        targets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(update) => print_view(&update.view, format)?,
                None => break,
            },

            line = stdin.next_line(), if stdin_open => match line.context("Failed to read stdin")? {
                Some(line) => forward_line(&hub, &input_target, &line)?,
                None => {
                    debug!("stdin closed, continuing to watch");
                    stdin_open = false;
                }
            },

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    hub.shutdown();
    task.await.context("Session hub task failed")?;
    Ok(())
}

fn forward_line(hub: &HubHandle, target: &Target, line: &str) -> Result<()> {
    match parse_stdin_line(line) {
        Ok(Some(StdinLine::Text(text))) => hub.send_input(target.clone(), text)?,
        Ok(Some(StdinLine::Key(key))) => hub.send_key(target.clone(), key)?,
        Ok(None) => {}
        Err(e) => warn!("{e:#}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_lines_become_text_or_keys() {
        assert_eq!(
            parse_stdin_line("deploy now").unwrap(),
            Some(StdinLine::Text("deploy now".into()))
        );
        assert_eq!(
            parse_stdin_line(":key C-c").unwrap(),
            Some(StdinLine::Key(ControlKey::Interrupt))
        );
        assert_eq!(
            parse_stdin_line(":key esc").unwrap(),
            Some(StdinLine::Key(ControlKey::Escape))
        );
        assert_eq!(parse_stdin_line("   ").unwrap(), None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_stdin_line(":key C-q").unwrap_err();
        assert!(format!("{err:#}").contains("Unknown key 'C-q'"));
    }
}
