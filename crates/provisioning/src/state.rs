//! State machine of the single-resource provisioning pipeline.

use serde::{Deserialize, Serialize};

/// The state of one account provisioning run.
///
/// State transitions:
/// ```text
/// Validated ──► Persisted ──┬──► Notified ──► Done
///     │                     └──► NotifyFailed ──► Compensating ──► Compensated
///     └──────────────────────────────────────────► Compensating
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProvisioningState {
    /// The request passed validation and uniqueness checks.
    #[default]
    Validated,

    /// The record was written to the store.
    Persisted,

    /// The notification was accepted.
    Notified,

    /// All steps completed successfully (terminal state).
    Done,

    /// The notification failed or was rejected.
    NotifyFailed,

    /// Undo actions are running.
    Compensating,

    /// Undo actions finished; the failure is reported (terminal state).
    Compensated,
}

impl ProvisioningState {
    /// Returns true if the machine may move from `self` to `next`.
    pub fn can_transition_to(&self, next: ProvisioningState) -> bool {
        use ProvisioningState::*;
        matches!(
            (self, next),
            (Validated, Persisted)
                | (Validated, Compensating)
                | (Persisted, Notified)
                | (Persisted, NotifyFailed)
                | (Notified, Done)
                | (NotifyFailed, Compensating)
                | (Compensating, Compensated)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisioningState::Done | ProvisioningState::Compensated)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningState::Validated => "Validated",
            ProvisioningState::Persisted => "Persisted",
            ProvisioningState::Notified => "Notified",
            ProvisioningState::Done => "Done",
            ProvisioningState::NotifyFailed => "NotifyFailed",
            ProvisioningState::Compensating => "Compensating",
            ProvisioningState::Compensated => "Compensated",
        }
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
