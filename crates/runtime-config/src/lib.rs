//! Shared runtime configuration types.
//!
//! The CLI reads `paneview.toml` into these types and hands them to the live
//! engine. Every field has a serde default, so a partial or missing file
//! yields a working configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "paneview.toml";

/// Top-level configuration (persisted as `paneview.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PaneviewConfig {
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub status: StatusSettings,
    #[serde(default)]
    pub reconcile: ReconcileSettings,
    #[serde(default)]
    pub tmux: TmuxSettings,
}

impl PaneviewConfig {
    /// Parse a config file body and repair unusable values.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        apply_fallbacks(&mut config);
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollSettings {
    /// Refresh period for each visible session.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSettings {
    #[serde(default = "default_status_bar_lines")]
    pub status_bar_lines: usize,
    #[serde(default = "default_recent_lines")]
    pub recent_lines: usize,
    /// Buffer changes younger than this read as activity.
    #[serde(default = "default_recent_change_secs")]
    pub recent_change_secs: u64,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            status_bar_lines: default_status_bar_lines(),
            recent_lines: default_recent_lines(),
            recent_change_secs: default_recent_change_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconcileSettings {
    /// Prefix of the pending input that must show up in a user turn.
    #[serde(default = "default_echo_match_chars")]
    pub echo_match_chars: usize,
    /// The optimistic echo is dropped after this long regardless.
    #[serde(default = "default_echo_ceiling_secs")]
    pub echo_ceiling_secs: u64,
    #[serde(default = "default_min_response_secs")]
    pub min_response_secs: u64,
    #[serde(default = "default_quiet_secs")]
    pub quiet_secs: u64,
    /// Upper bound on showing the working placeholder.
    #[serde(default = "default_working_ceiling_secs")]
    pub working_ceiling_secs: u64,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            echo_match_chars: default_echo_match_chars(),
            echo_ceiling_secs: default_echo_ceiling_secs(),
            min_response_secs: default_min_response_secs(),
            quiet_secs: default_quiet_secs(),
            working_ceiling_secs: default_working_ceiling_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmuxSettings {
    #[serde(default = "default_tmux_binary")]
    pub binary: String,
    /// Scrollback lines included in each capture.
    #[serde(default = "default_history_lines")]
    pub history_lines: u32,
    /// Session used when a target is given as a bare window index.
    #[serde(default = "default_session")]
    pub default_session: String,
}

impl Default for TmuxSettings {
    fn default() -> Self {
        Self {
            binary: default_tmux_binary(),
            history_lines: default_history_lines(),
            default_session: default_session(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_interval_ms() -> u64 {
    1_000
}
fn default_status_bar_lines() -> usize {
    5
}
fn default_recent_lines() -> usize {
    15
}
fn default_recent_change_secs() -> u64 {
    5
}
fn default_echo_match_chars() -> usize {
    20
}
fn default_echo_ceiling_secs() -> u64 {
    10
}
fn default_min_response_secs() -> u64 {
    3
}
fn default_quiet_secs() -> u64 {
    5
}
fn default_working_ceiling_secs() -> u64 {
    180
}
fn default_tmux_binary() -> String {
    "tmux".to_string()
}
fn default_history_lines() -> u32 {
    200
}
fn default_session() -> String {
    "mobile".to_string()
}

/// Replace values that would stall polling or disable matching with their
/// defaults. Returns true when any field was updated.
pub fn apply_fallbacks(config: &mut PaneviewConfig) -> bool {
    let mut changed = false;

    if config.poll.interval_ms == 0 {
        config.poll.interval_ms = default_interval_ms();
        changed = true;
    }

    if config.status.status_bar_lines == 0 {
        config.status.status_bar_lines = default_status_bar_lines();
        changed = true;
    }

    if config.status.recent_lines < config.status.status_bar_lines {
        config.status.recent_lines = config.status.status_bar_lines;
        changed = true;
    }

    if config.reconcile.echo_match_chars == 0 {
        config.reconcile.echo_match_chars = default_echo_match_chars();
        changed = true;
    }

    if config.tmux.binary.trim().is_empty() {
        config.tmux.binary = default_tmux_binary();
        changed = true;
    }

    if config.tmux.default_session.trim().is_empty() {
        config.tmux.default_session = default_session();
        changed = true;
    }

    changed
}
