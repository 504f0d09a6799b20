//! Provisioning pipelines.
//!
//! This crate provides:
//! - [`BatchProvisioner`]: N products from one request, with per-item
//!   failures reported as data
//! - [`ArtifactProvisioner`]: scannable-code image generation and upload,
//!   attached to a product best-effort
//! - [`AccountProvisioner`]: one user account whose side effects are
//!   compensated in reverse when the notification fails
//! - [`ArtifactReconciler`]: retry pass for products without an artifact
//!
//! External services sit behind traits in [`services`], each with an
//! in-memory implementation.

pub mod account;
pub mod artifact;
pub mod batch;
pub mod compensation;
pub mod error;
pub mod reconcile;
pub mod services;
pub mod state;

pub use account::{AccountConfig, AccountProvisioner};
pub use artifact::{ArtifactConfig, ArtifactProvisioner, AttachOutcome};
pub use batch::{BatchConfig, BatchOutcome, BatchProvisioner, ItemFailure, ItemFailureKind};
pub use compensation::{CompensationReport, CompensationStack};
pub use error::{ProvisioningError, Result};
pub use reconcile::{ArtifactReconciler, ReconcileReport};
pub use services::{
    CodeImageGenerator, DeleteOutcome, HostedObject, ImagePayload, InMemoryCodeImageGenerator,
    InMemoryNotifier, InMemoryObjectStorage, LogNotifier, Notification, Notifier, ObjectStorage,
    SmtpConfig, SmtpNotifier, UploadOptions,
};
pub use state::ProvisioningState;
