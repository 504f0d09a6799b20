//! Shared types for the provisioning workspace.

mod types;

pub use types::RecordId;
