//! Rules for retiring the optimistic echo and the working placeholder.

use paneview_core::{ActivityState, Turn};
use paneview_runtime_config::ReconcileSettings;
use std::time::Duration;
use tokio::time::Instant;

/// Input issued locally and not yet seen in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInput {
    pub text: String,
    pub issued_at: Instant,
    /// User turns that already matched `text` when it was issued
    pub baseline: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoDecision {
    Keep,
    /// A user turn now carries the text
    Absorbed,
    /// Never showed up; dropped so it cannot linger
    Expired,
}

/// Why the working placeholder was taken down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    Idle,
    Quiet,
    Ceiling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePolicy {
    pub echo_match_chars: usize,
    pub echo_ceiling: Duration,
    pub min_response: Duration,
    pub quiet_window: Duration,
    pub working_ceiling: Duration,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self::from_settings(&ReconcileSettings::default())
    }
}

impl ReconcilePolicy {
    pub fn from_settings(settings: &ReconcileSettings) -> Self {
        Self {
            echo_match_chars: settings.echo_match_chars,
            echo_ceiling: Duration::from_secs(settings.echo_ceiling_secs),
            min_response: Duration::from_secs(settings.min_response_secs),
            quiet_window: Duration::from_secs(settings.quiet_secs),
            working_ceiling: Duration::from_secs(settings.working_ceiling_secs),
        }
    }

    /// Count the user turns containing the leading `echo_match_chars`
    /// characters of `text`. Both sides are compared with whitespace runs
    /// collapsed so terminal wrapping does not break the match.
    pub fn matching_user_turns(&self, text: &str, turns: &[Turn]) -> usize {
        let key: String = collapse_whitespace(text)
            .chars()
            .take(self.echo_match_chars)
            .collect();
        if key.is_empty() {
            return 0;
        }
        turns
            .iter()
            .filter(|turn| turn.is_user())
            .filter(|turn| collapse_whitespace(&turn.lines.join(" ")).contains(&key))
            .count()
    }

    /// Start tracking `text` against the transcript as it stands now.
    pub fn pending_input(&self, text: &str, turns: &[Turn], now: Instant) -> PendingInput {
        PendingInput {
            text: text.to_string(),
            issued_at: now,
            baseline: self.matching_user_turns(text, turns),
        }
    }

    /// The echo is absorbed once more user turns match than at issue time,
    /// so a short reply such as `y` is not retired by older history.
    pub fn echo_decision(&self, pending: &PendingInput, turns: &[Turn], now: Instant) -> EchoDecision {
        if self.matching_user_turns(&pending.text, turns) > pending.baseline {
            EchoDecision::Absorbed
        } else if now.saturating_duration_since(pending.issued_at) > self.echo_ceiling {
            EchoDecision::Expired
        } else {
            EchoDecision::Keep
        }
    }

    /// Decide whether a reply awaited since `issued_at` is over.
    ///
    /// Quiet time counts from the later of the last buffer change and the
    /// issue time, so a screen that was already still when the input went
    /// out does not release the wait early.
    pub fn release_reason(
        &self,
        issued_at: Instant,
        activity: ActivityState,
        last_changed_at: Option<Instant>,
        now: Instant,
    ) -> Option<ReleaseReason> {
        let elapsed = now.saturating_duration_since(issued_at);
        if elapsed > self.working_ceiling {
            return Some(ReleaseReason::Ceiling);
        }
        if elapsed <= self.min_response {
            return None;
        }
        if activity == ActivityState::Idle {
            return Some(ReleaseReason::Idle);
        }
        let quiet_since = last_changed_at.map_or(issued_at, |changed| changed.max(issued_at));
        (now.saturating_duration_since(quiet_since) >= self.quiet_window)
            .then_some(ReleaseReason::Quiet)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
