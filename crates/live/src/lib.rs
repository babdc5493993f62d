//! Live side of paneview: per-target trackers, echo reconciliation, the
//! polling hub and the tmux collaborator.

pub mod control;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod scheduler;
pub mod tracker;

pub use control::{SessionControl, TmuxControl};
pub use error::{ControlError, HubClosed};
pub use reconcile::{EchoDecision, PendingInput, ReconcilePolicy, ReleaseReason};
pub use registry::SessionRegistry;
pub use scheduler::{HubCommand, HubConfig, HubHandle, ViewUpdate, spawn_hub, status_window};
pub use tracker::SessionTracker;
