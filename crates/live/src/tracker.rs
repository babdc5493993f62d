use paneview_core::{Target, Turn, ViewModel};
use paneview_parsers::{StatusReport, StatusWindow, TranscriptInterpreter, find_interpreter, normalize};
use tokio::time::Instant;
use tracing::debug;

use crate::reconcile::{EchoDecision, PendingInput, ReconcilePolicy};

/// Derived state for one tracked target.
///
/// Timing is passed in by the caller so every decision is reproducible.
pub struct SessionTracker {
    target: Target,
    window: StatusWindow,
    policy: ReconcilePolicy,
    last_raw: Option<String>,
    normalized: String,
    interpreter: Option<Box<dyn TranscriptInterpreter>>,
    turns: Vec<Turn>,
    status: StatusReport,
    pending: Option<PendingInput>,
    awaiting_since: Option<Instant>,
    first_seen_at: Option<Instant>,
    last_changed_at: Option<Instant>,
    last_view: Option<ViewModel>,
}

impl SessionTracker {
    pub fn new(target: Target, window: StatusWindow, policy: ReconcilePolicy) -> Self {
        Self {
            target,
            window,
            policy,
            last_raw: None,
            normalized: String::new(),
            interpreter: None,
            turns: Vec::new(),
            status: StatusReport::default(),
            pending: None,
            awaiting_since: None,
            first_seen_at: None,
            last_changed_at: None,
            last_view: None,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn pending_input(&self) -> Option<&PendingInput> {
        self.pending.as_ref()
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_since.is_some()
    }

    pub fn first_seen_at(&self) -> Option<Instant> {
        self.first_seen_at
    }

    pub fn last_changed_at(&self) -> Option<Instant> {
        self.last_changed_at
    }

    /// Record locally issued input. Blank input is ignored; otherwise the
    /// view is republished with the echo and the working placeholder.
    /// Input issued while another is pending replaces it.
    pub fn issue_input(&mut self, text: &str, now: Instant) -> Option<ViewModel> {
        if text.trim().is_empty() {
            debug!("{}: ignoring blank input", self.target);
            return None;
        }
        self.pending = Some(self.policy.pending_input(text, &self.turns, now));
        self.awaiting_since = Some(now);
        self.publish()
    }

    /// Fold in one refresh. `None` means the capture failed: derived state
    /// is kept but timers still run. Returns the view only when it changed.
    pub fn apply_snapshot(&mut self, raw: Option<&str>, now: Instant) -> Option<ViewModel> {
        if let Some(raw) = raw {
            self.ingest(raw, now);
        }
        self.refresh_status(now);
        self.reconcile(now);
        self.publish()
    }

    /// The view as it would be rendered right now.
    pub fn view_model(&self) -> ViewModel {
        let structured = self.interpreter.is_some();
        ViewModel {
            target: self.target.clone(),
            turns: self.turns.clone(),
            pending_echo: self.pending.as_ref().map(|p| Turn::user(p.text.clone())),
            show_working_indicator: self.awaiting_since.is_some(),
            activity: self.status.activity,
            side: self.status.side.clone(),
            structured,
            raw_text: (!structured && !self.normalized.is_empty()).then(|| self.normalized.clone()),
        }
    }

    fn ingest(&mut self, raw: &str, now: Instant) {
        if self.last_raw.as_deref() == Some(raw) {
            return;
        }

        self.normalized = normalize(raw);
        self.interpreter = find_interpreter(&self.normalized);
        self.turns = self
            .interpreter
            .as_ref()
            .map(|interpreter| interpreter.segment(&self.normalized))
            .unwrap_or_default();
        self.last_raw = Some(raw.to_string());

        if self.first_seen_at.is_none() {
            self.first_seen_at = Some(now);
        } else {
            self.last_changed_at = Some(now);
        }
        debug!(
            "{}: snapshot changed, {} turns via {}",
            self.target,
            self.turns.len(),
            self.interpreter.as_ref().map_or("raw", |i| i.name())
        );
    }

    fn refresh_status(&mut self, now: Instant) {
        let since_last_change = self
            .last_changed_at
            .map(|changed| now.saturating_duration_since(changed));
        self.status = match &self.interpreter {
            Some(interpreter) => {
                interpreter.extract_status(&self.normalized, since_last_change, &self.window)
            }
            None => StatusReport::default(),
        };
    }

    fn reconcile(&mut self, now: Instant) {
        if let Some(pending) = &self.pending {
            match self.policy.echo_decision(pending, &self.turns, now) {
                EchoDecision::Keep => {}
                decision => {
                    debug!("{}: pending echo retired ({decision:?})", self.target);
                    self.pending = None;
                }
            }
        }

        if let Some(issued_at) = self.awaiting_since {
            if let Some(reason) = self.policy.release_reason(
                issued_at,
                self.status.activity,
                self.last_changed_at,
                now,
            ) {
                debug!("{}: response wait released ({reason:?})", self.target);
                self.awaiting_since = None;
            }
        }
    }

    fn publish(&mut self) -> Option<ViewModel> {
        let view = self.view_model();
        if self.last_view.as_ref() == Some(&view) {
            return None;
        }
        self.last_view = Some(view.clone());
        Some(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paneview_core::ActivityState;
    use paneview_core::testing::{assistant, screen, target, user};
    use std::time::Duration;

    fn tracker() -> SessionTracker {
        SessionTracker::new(target(), StatusWindow::default(), ReconcilePolicy::default())
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn idle_screen() -> String {
        screen(&["❯ hello", "⏺ hi there", "", "❯ ", "  ? for shortcuts"])
    }

    #[test]
    fn first_snapshot_publishes_turns() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let view = tracker.apply_snapshot(Some(&idle_screen()), t0).expect("view");
        assert_eq!(view.turns, vec![user(&["hello"]), assistant(&["hi there"])]);
        assert!(view.structured);
        assert_eq!(view.raw_text, None);
        assert_eq!(tracker.first_seen_at(), Some(t0));
        assert_eq!(tracker.last_changed_at(), None);
    }

    #[test]
    fn unchanged_snapshot_publishes_nothing() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.apply_snapshot(Some(&idle_screen()), t0);
        assert!(tracker.apply_snapshot(Some(&idle_screen()), t0 + secs(1)).is_none());
        assert_eq!(tracker.last_changed_at(), None);
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut tracker = tracker();
        assert!(tracker.issue_input("  \n ", Instant::now()).is_none());
        assert!(tracker.pending_input().is_none());
        assert!(!tracker.is_awaiting_response());
    }

    #[test]
    fn issued_input_shows_echo_and_placeholder() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.apply_snapshot(Some(&idle_screen()), t0);
        let view = tracker.issue_input("deploy now", t0).expect("view");
        assert_eq!(view.pending_echo, Some(user(&["deploy now"])));
        assert!(view.show_working_indicator);
        assert_eq!(view.rendered().len(), 4);
    }

    #[test]
    fn matching_snapshot_absorbs_echo_immediately() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.apply_snapshot(Some(&idle_screen()), t0);
        tracker.issue_input("deploy now", t0);

        let busy = screen(&[
            "❯ hello",
            "⏺ hi there",
            "❯ deploy now",
            "✻ Deploying… (esc to interrupt)",
            "❯ ",
        ]);
        let view = tracker
            .apply_snapshot(Some(&busy), t0 + Duration::from_millis(500))
            .expect("view");
        assert_eq!(view.pending_echo, None);
        assert_eq!(view.turns.last(), Some(&user(&["deploy now"])));
        assert!(view.show_working_indicator);
        assert_eq!(view.activity, ActivityState::Working);
    }

    #[test]
    fn unanswered_input_clears_on_timers() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let idle = idle_screen();
        tracker.apply_snapshot(Some(&idle), t0);
        tracker.issue_input("deploy now", t0);

        let view = tracker.view_model();
        assert!(tracker.apply_snapshot(Some(&idle), t0 + secs(1)).is_none());
        assert!(tracker.apply_snapshot(Some(&idle), t0 + secs(2)).is_none());
        assert_eq!(tracker.view_model(), view);

        // Idle screen after the minimum response time ends the wait.
        let view = tracker.apply_snapshot(Some(&idle), t0 + secs(4)).expect("view");
        assert!(!view.show_working_indicator);
        assert!(view.pending_echo.is_some());

        let view = tracker.apply_snapshot(None, t0 + secs(11)).expect("view");
        assert_eq!(view.pending_echo, None);
        assert_eq!(view.turns.len(), 2);
    }

    #[test]
    fn busy_screen_holds_placeholder_until_ceiling() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.issue_input("deploy now", t0);

        let mut elapsed = 0;
        let mut view = tracker.view_model();
        while elapsed <= 180 {
            elapsed += 1;
            let spinner = format!("✻ Deploying… ({elapsed}s · esc to interrupt)");
            let frame = screen(&["❯ hello", spinner.as_str(), "❯ "]);
            if let Some(next) = tracker.apply_snapshot(Some(&frame), t0 + secs(elapsed)) {
                view = next;
            }
            if elapsed < 180 {
                assert!(view.show_working_indicator, "released at {elapsed}s");
            }
        }
        assert!(!view.show_working_indicator);
    }

    #[test]
    fn failed_capture_keeps_last_state() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.apply_snapshot(Some(&idle_screen()), t0);
        let before = tracker.view_model();
        assert!(tracker.apply_snapshot(None, t0 + secs(1)).is_none());
        assert_eq!(tracker.view_model(), before);
    }

    #[test]
    fn recent_change_reads_working_then_idle() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.apply_snapshot(Some(&screen(&["❯ hi", "⏺ streaming"])), t0);
        let view = tracker
            .apply_snapshot(Some(&screen(&["❯ hi", "⏺ streaming more"])), t0 + secs(1))
            .expect("view");
        assert_eq!(view.activity, ActivityState::Working);

        let view = tracker.apply_snapshot(None, t0 + secs(7)).expect("view");
        assert_eq!(view.activity, ActivityState::Idle);
    }

    #[test]
    fn plain_shell_is_shown_raw() {
        let mut tracker = tracker();
        let view = tracker
            .apply_snapshot(Some("\x1b[32m$\x1b[0m ls\r\nCargo.toml\r\n"), Instant::now())
            .expect("view");
        assert!(!view.structured);
        assert!(view.turns.is_empty());
        assert_eq!(view.raw_text.as_deref(), Some("$ ls\nCargo.toml"));
    }

    #[test]
    fn repeated_short_reply_still_echoes() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let asked = screen(&["❯ y", "⏺ Confirmed.", "", "❯ ", "  ? for shortcuts"]);
        tracker.apply_snapshot(Some(&asked), t0);
        tracker.issue_input("y", t0);

        let view = tracker.apply_snapshot(Some(&asked), t0 + secs(1));
        assert!(view.is_none());
        assert_eq!(tracker.view_model().pending_echo, Some(user(&["y"])));

        let answered = screen(&[
            "❯ y",
            "⏺ Confirmed.",
            "❯ y",
            "✻ Applying… (esc to interrupt)",
            "❯ ",
        ]);
        let view = tracker.apply_snapshot(Some(&answered), t0 + secs(2)).expect("view");
        assert_eq!(view.pending_echo, None);
    }

    #[test]
    fn newer_input_replaces_pending() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        tracker.issue_input("first", t0);
        let view = tracker.issue_input("second", t0 + secs(1)).expect("view");
        assert_eq!(view.pending_echo, Some(user(&["second"])));
    }
}
