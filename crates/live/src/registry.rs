use paneview_core::{Target, ViewModel};
use paneview_parsers::StatusWindow;
use std::collections::HashMap;
use tokio::time::Instant;

use crate::reconcile::ReconcilePolicy;
use crate::tracker::SessionTracker;

/// Trackers keyed by target. Every call names its target explicitly; there
/// is no notion of a current session.
pub struct SessionRegistry {
    sessions: HashMap<Target, SessionTracker>,
    window: StatusWindow,
    policy: ReconcilePolicy,
}

impl SessionRegistry {
    pub fn new(window: StatusWindow, policy: ReconcilePolicy) -> Self {
        Self {
            sessions: HashMap::new(),
            window,
            policy,
        }
    }

    /// Start tracking `target`. Returns false if it was already tracked.
    pub fn open(&mut self, target: &Target) -> bool {
        if self.sessions.contains_key(target) {
            return false;
        }
        let tracker = SessionTracker::new(target.clone(), self.window, self.policy.clone());
        self.sessions.insert(target.clone(), tracker);
        true
    }

    pub fn close(&mut self, target: &Target) -> bool {
        self.sessions.remove(target).is_some()
    }

    pub fn contains(&self, target: &Target) -> bool {
        self.sessions.contains_key(target)
    }

    /// Tracked targets in `session:window` order.
    pub fn targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.sessions.keys().cloned().collect();
        targets.sort();
        targets
    }

    pub fn tracker(&self, target: &Target) -> Option<&SessionTracker> {
        self.sessions.get(target)
    }

    pub fn view_model(&self, target: &Target) -> Option<ViewModel> {
        self.sessions.get(target).map(SessionTracker::view_model)
    }

    /// Record input for `target`, tracking it first if needed.
    pub fn on_input_issued(&mut self, target: &Target, text: &str, now: Instant) -> Option<ViewModel> {
        self.tracker_mut(target).issue_input(text, now)
    }

    /// Fold a refresh into `target`'s tracker. Some only when the view changed.
    pub fn on_refresh_tick(
        &mut self,
        target: &Target,
        raw: Option<&str>,
        now: Instant,
    ) -> Option<ViewModel> {
        self.tracker_mut(target).apply_snapshot(raw, now)
    }

    fn tracker_mut(&mut self, target: &Target) -> &mut SessionTracker {
        self.sessions
            .entry(target.clone())
            .or_insert_with(|| SessionTracker::new(target.clone(), self.window, self.policy.clone()))
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(StatusWindow::default(), ReconcilePolicy::default())
    }
}
