use cipherscan_core::ProgressEvent;

/// Events flowing from backend analysis tasks to the TUI.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// Progress from the sequential batch or a single-file re-run.
    Progress { event: ProgressEvent },
    /// The whole batch has been processed.
    BatchComplete,
}
