mod config;
mod output;
mod target_ref;
mod watch;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use paneview_core::ControlKey;
use paneview_live::{ReconcilePolicy, SessionControl, SessionTracker, TmuxControl, status_window};
use paneview_parsers::interpret;
use paneview_runtime_config::PaneviewConfig;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::time::Instant;

use output::OutputFormat;
use target_ref::{resolve_target, resolve_targets};

const DEFAULT_LOG_FILTER: &str = "paneview=info";

#[derive(Parser)]
#[command(
    name = "paneview",
    about = "Read tmux panes running a coding assistant as a chat transcript"
)]
struct Cli {
    /// Config file (default: ~/.config/paneview/paneview.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow panes and print the transcript whenever it changes.
    /// Lines typed on stdin are sent to the first target; `:key NAME` presses a key.
    Watch {
        /// Targets as session:window, session, or a window index
        targets: Vec<String>,

        /// Poll period override
        #[arg(long)]
        interval_ms: Option<u64>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Capture a pane once and print its transcript
    Show {
        target: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Type text into a pane and press Enter
    Send {
        target: String,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Press a named key (interrupt, eof, clear, suspend, escape, tab, enter, up, down, left, right)
    Key { target: String, key: ControlKey },

    /// Interpret a saved pane capture (file or stdin) without tmux
    Parse {
        file: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_override = cli.config.as_deref();
    let mut config = config::load_config(config_override)?;

    match cli.command {
        Commands::Watch {
            targets,
            interval_ms,
            format,
        } => {
            if let Some(ms) = interval_ms {
                if ms == 0 {
                    bail!("--interval-ms must be greater than zero");
                }
                config.poll.interval_ms = ms;
            }
            let targets = resolve_targets(&targets, &config.tmux.default_session)?;
            watch::run_watch(&config, targets, format).await
        }
        Commands::Show { target, format } => run_show(&config, target.as_deref(), format).await,
        Commands::Send { target, text } => {
            let target = resolve_target(Some(&target), &config.tmux.default_session)?;
            let text = text.join(" ");
            TmuxControl::from_settings(&config.tmux)
                .issue_input(&target, &text)
                .await
                .with_context(|| format!("Failed to send input to {target}"))
        }
        Commands::Key { target, key } => {
            let target = resolve_target(Some(&target), &config.tmux.default_session)?;
            TmuxControl::from_settings(&config.tmux)
                .issue_key(&target, key)
                .await
                .with_context(|| format!("Failed to send {} to {target}", key.tmux_name()))
        }
        Commands::Parse { file, format } => run_parse(&config, file.as_deref(), format),
        Commands::Config => config::show_config(config_override, &config),
    }
}

async fn run_show(config: &PaneviewConfig, target: Option<&str>, format: OutputFormat) -> Result<()> {
    let target = resolve_target(target, &config.tmux.default_session)?;
    let raw = TmuxControl::from_settings(&config.tmux)
        .capture_snapshot(&target)
        .await
        .with_context(|| format!("Failed to capture {target}"))?;

    let mut tracker = SessionTracker::new(
        target,
        status_window(config),
        ReconcilePolicy::from_settings(&config.reconcile),
    );
    let view = tracker
        .apply_snapshot(Some(&raw), Instant::now())
        .unwrap_or_else(|| tracker.view_model());
    output::print_view(&view, format)
}

fn run_parse(config: &PaneviewConfig, file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            raw
        }
    };
    let result = interpret(&raw, None, &status_window(config));
    output::print_interpretation(&result, format)
}
