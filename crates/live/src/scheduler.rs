//! The hub: one task that owns every tracker, plus one poll task per
//! visible session.
//!
//! All registry mutations arrive as messages, so nothing is shared or
//! locked. Poll tasks only capture; they hand raw snapshots back to the hub
//! tagged with the epoch of the open they belong to, and results from a
//! closed or re-opened session are dropped. Input and key presses for a
//! target go through that target's outbox and reach the pane in the order
//! they were issued.

use paneview_core::{ControlKey, Target, ViewModel};
use paneview_parsers::StatusWindow;
use paneview_runtime_config::PaneviewConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::control::SessionControl;
use crate::error::{ControlError, HubClosed};
use crate::reconcile::ReconcilePolicy;
use crate::registry::SessionRegistry;

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub poll_interval: Duration,
    pub status_window: StatusWindow,
    pub policy: ReconcilePolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::from_config(&PaneviewConfig::default())
    }
}

impl HubConfig {
    pub fn from_config(config: &PaneviewConfig) -> Self {
        Self {
            poll_interval: config.poll.interval(),
            status_window: status_window(config),
            policy: ReconcilePolicy::from_settings(&config.reconcile),
        }
    }
}

/// Status extractor window from the `[status]` section.
pub fn status_window(config: &PaneviewConfig) -> StatusWindow {
    StatusWindow {
        status_bar_lines: config.status.status_bar_lines,
        recent_lines: config.status.recent_lines,
        recent_change_threshold: Duration::from_secs(config.status.recent_change_secs),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubCommand {
    Open(Target),
    Close(Target),
    /// Start polling; opens the session if needed
    Show(Target),
    /// Stop polling but keep the tracker
    Hide(Target),
    SendInput { target: Target, text: String },
    SendKey { target: Target, key: ControlKey },
}

/// A changed view leaving the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    pub target: Target,
    pub view: ViewModel,
}

#[derive(Debug)]
struct PollResult {
    target: Target,
    epoch: u64,
    snapshot: Result<String, ControlError>,
}

struct Poller {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Something to type into a pane.
#[derive(Debug)]
enum Outbound {
    Input(String),
    Key(ControlKey),
}

/// Cheap, cloneable front door to a running hub.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
    shutdown: watch::Sender<bool>,
}

impl HubHandle {
    pub fn send(&self, command: HubCommand) -> Result<(), HubClosed> {
        self.commands.send(command).map_err(|_| HubClosed)
    }

    pub fn open(&self, target: Target) -> Result<(), HubClosed> {
        self.send(HubCommand::Open(target))
    }

    pub fn close(&self, target: Target) -> Result<(), HubClosed> {
        self.send(HubCommand::Close(target))
    }

    pub fn show(&self, target: Target) -> Result<(), HubClosed> {
        self.send(HubCommand::Show(target))
    }

    pub fn hide(&self, target: Target) -> Result<(), HubClosed> {
        self.send(HubCommand::Hide(target))
    }

    pub fn send_input(&self, target: Target, text: impl Into<String>) -> Result<(), HubClosed> {
        self.send(HubCommand::SendInput {
            target,
            text: text.into(),
        })
    }

    pub fn send_key(&self, target: Target, key: ControlKey) -> Result<(), HubClosed> {
        self.send(HubCommand::SendKey { target, key })
    }

    /// Stop the hub and every poll task.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Spawn the hub on the current runtime.
///
/// Returns the handle, the stream of view updates and the hub's join handle.
pub fn spawn_hub<C: SessionControl>(
    control: C,
    config: HubConfig,
) -> (
    HubHandle,
    mpsc::UnboundedReceiver<ViewUpdate>,
    JoinHandle<()>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let hub = Hub::new(Arc::new(control), config, update_tx);
    let task = tokio::spawn(hub.run(command_rx, shutdown_rx));
    let handle = HubHandle {
        commands: command_tx,
        shutdown: shutdown_tx,
    };
    (handle, update_rx, task)
}

struct Hub<C> {
    control: Arc<C>,
    registry: SessionRegistry,
    poll_interval: Duration,
    epochs: HashMap<Target, u64>,
    next_epoch: u64,
    pollers: HashMap<Target, Poller>,
    outboxes: HashMap<Target, mpsc::UnboundedSender<Outbound>>,
    results_tx: mpsc::UnboundedSender<PollResult>,
    results_rx: mpsc::UnboundedReceiver<PollResult>,
    updates: mpsc::UnboundedSender<ViewUpdate>,
}

impl<C: SessionControl> Hub<C> {
    fn new(control: Arc<C>, config: HubConfig, updates: mpsc::UnboundedSender<ViewUpdate>) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            control,
            registry: SessionRegistry::new(config.status_window, config.policy),
            poll_interval: config.poll_interval,
            epochs: HashMap::new(),
            next_epoch: 0,
            pollers: HashMap::new(),
            outboxes: HashMap::new(),
            results_tx,
            results_rx,
            updates,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<HubCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },

                Some(result) = self.results_rx.recv() => self.apply_poll(result),

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Session hub shutting down");
        for (_, poller) in self.pollers.drain() {
            poller.stop.send_replace(true);
        }
        // Dropping the senders lets each outbox finish what is queued.
        self.outboxes.clear();
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Open(target) => self.open(&target),
            HubCommand::Close(target) => self.close(&target),
            HubCommand::Show(target) => self.show(target),
            HubCommand::Hide(target) => self.hide(&target),
            HubCommand::SendInput { target, text } => self.send_input(target, text),
            HubCommand::SendKey { target, key } => self.send_key(target, key),
        }
    }

    fn open(&mut self, target: &Target) {
        if self.epochs.contains_key(target) {
            debug!("{target} already open");
            return;
        }
        self.next_epoch += 1;
        self.epochs.insert(target.clone(), self.next_epoch);
        self.registry.open(target);
        info!("Opened {target}");
    }

    fn close(&mut self, target: &Target) {
        self.stop_poller(target);
        self.outboxes.remove(target);
        if self.epochs.remove(target).is_some() {
            self.registry.close(target);
            info!("Closed {target}");
        }
    }

    fn show(&mut self, target: Target) {
        self.open(&target);
        if self.pollers.contains_key(&target) {
            return;
        }
        let Some(&epoch) = self.epochs.get(&target) else {
            return;
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(poll_session(
            Arc::clone(&self.control),
            target.clone(),
            epoch,
            self.poll_interval,
            self.results_tx.clone(),
            stop_rx,
        ));
        info!("Polling {target} every {:?}", self.poll_interval);
        self.pollers.insert(target, Poller {
            stop: stop_tx,
            task,
        });
    }

    fn hide(&mut self, target: &Target) {
        if self.stop_poller(target) {
            info!("Stopped polling {target}");
        }
    }

    fn stop_poller(&mut self, target: &Target) -> bool {
        let Some(poller) = self.pollers.remove(target) else {
            return false;
        };
        poller.stop.send_replace(true);
        if poller.task.is_finished() {
            debug!("poller for {target} had already exited");
        }
        true
    }

    fn send_input(&mut self, target: Target, text: String) {
        if text.trim().is_empty() {
            debug!("Ignoring blank input for {target}");
            return;
        }
        self.open(&target);
        if let Some(view) = self.registry.on_input_issued(&target, &text, Instant::now()) {
            self.publish(&target, view);
        }

        self.enqueue(&target, Outbound::Input(text));
    }

    fn send_key(&mut self, target: Target, key: ControlKey) {
        self.enqueue(&target, Outbound::Key(key));
    }

    /// Queue `outbound` behind anything already waiting for `target`.
    fn enqueue(&mut self, target: &Target, outbound: Outbound) {
        let outbox = self.outboxes.entry(target.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(deliver(Arc::clone(&self.control), target.clone(), rx));
            tx
        });
        if let Err(mpsc::error::SendError(dropped)) = outbox.send(outbound) {
            warn!("Outbox for {target} is gone, dropping {dropped:?}");
            self.outboxes.remove(target);
        }
    }

    fn apply_poll(&mut self, result: PollResult) {
        let PollResult {
            target,
            epoch,
            snapshot,
        } = result;
        if self.epochs.get(&target) != Some(&epoch) {
            debug!("Discarding late snapshot for {target} (epoch {epoch})");
            return;
        }

        let raw = match snapshot {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!("Capture failed for {target}: {e}");
                None
            }
        };
        if let Some(view) = self
            .registry
            .on_refresh_tick(&target, raw.as_deref(), Instant::now())
        {
            self.publish(&target, view);
        }
    }

    fn publish(&self, target: &Target, view: ViewModel) {
        let update = ViewUpdate {
            target: target.clone(),
            view,
        };
        if self.updates.send(update).is_err() {
            debug!("No view subscriber for {target}");
        }
    }
}

/// Send queued input to `target` one command at a time, in queue order.
async fn deliver<C: SessionControl>(
    control: Arc<C>,
    target: Target,
    mut queue: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(outbound) = queue.recv().await {
        match outbound {
            Outbound::Input(text) => {
                if let Err(e) = control.issue_input(&target, &text).await {
                    warn!("Failed to send input to {target}: {e}");
                }
            }
            Outbound::Key(key) => {
                if let Err(e) = control.issue_key(&target, key).await {
                    warn!("Failed to send {} to {target}: {e}", key.tmux_name());
                }
            }
        }
    }
    debug!("Outbox for {target} closed");
}

/// Capture `target` on every tick until told to stop. The first tick fires
/// at once so a newly shown session refreshes immediately. A capture that
/// is already running when the stop arrives still reports its result.
async fn poll_session<C: SessionControl>(
    control: Arc<C>,
    target: Target,
    epoch: u64,
    period: Duration,
    results: mpsc::UnboundedSender<PollResult>,
    mut stop: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = control.capture_snapshot(&target).await;
                let result = PollResult {
                    target: target.clone(),
                    epoch,
                    snapshot,
                };
                if results.send(result).is_err() {
                    break;
                }
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
    debug!("Poller for {target} exited");
}
