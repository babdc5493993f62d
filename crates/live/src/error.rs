use paneview_core::Target;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no such pane: {0}")]
    NoTarget(Target),

    #[error("{command} failed for {target}: {stderr}")]
    Command {
        command: &'static str,
        target: Target,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, ControlError>;

/// Returned by [`crate::HubHandle`] once the hub task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session hub has shut down")]
pub struct HubClosed;
