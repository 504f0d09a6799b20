//! Provisioning error types.

use domain::DomainError;
use record_store::StoreError;
use thiserror::Error;

use crate::batch::ItemFailure;
use crate::state::ProvisioningState;

/// Call-level errors of the provisioning pipelines.
///
/// Item-level failures of a batch are not errors of this type; they are
/// collected into the batch outcome as data.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// The request failed validation before any side effect.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The record store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A natural key is already taken by another record.
    #[error("{field} is already registered: {value}")]
    Conflict { field: String, value: String },

    /// Every item of a batch failed.
    #[error("No items were created: all {requested} requested items failed")]
    NothingCreated {
        requested: u32,
        errors: Vec<ItemFailure>,
    },

    /// Scannable-code generation failed.
    #[error("Code image generation failed: {0}")]
    CodeGeneration(String),

    /// Object storage rejected or failed a request.
    #[error("Object storage error: {0}")]
    Storage(String),

    /// The notifier could not reach its provider.
    #[error("Notification transport error: {0}")]
    NotificationTransport(String),

    /// The notifier's provider refused the message.
    #[error("Notification to {recipient} was rejected")]
    NotificationRejected { recipient: String },

    /// Credential generation or hashing failed.
    #[error("Credential error: {0}")]
    Credential(String),

    /// A state transition that the state machine does not allow.
    #[error("Invalid provisioning state transition: {from} -> {to}")]
    InvalidState {
        from: ProvisioningState,
        to: ProvisioningState,
    },

    /// A failure whose compensation did not fully succeed.
    #[error("{cause} (compensation incomplete: {})", .failures.join("; "))]
    CompensationIncomplete {
        cause: Box<ProvisioningError>,
        failures: Vec<String>,
    },
}

impl ProvisioningError {
    /// Returns the error that triggered compensation, unwrapping
    /// `CompensationIncomplete`.
    pub fn root_cause(&self) -> &ProvisioningError {
        match self {
            ProvisioningError::CompensationIncomplete { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Returns true if the store was unreachable: either directly, or for
    /// every item of a batch.
    pub fn is_store_outage(&self) -> bool {
        match self {
            ProvisioningError::NothingCreated { errors, .. } => {
                !errors.is_empty() && errors.iter().all(ItemFailure::is_store_unavailable)
            }
            ProvisioningError::Store(e) => e.is_unavailable(),
            _ => false,
        }
    }
}

/// Convenience type alias for provisioning results.
pub type Result<T> = std::result::Result<T, ProvisioningError>;
