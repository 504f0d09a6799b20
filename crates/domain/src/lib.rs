//! Domain layer for the provisioning pipeline.
//!
//! This crate provides:
//! - Product and User records stored through the record store
//! - Pure identifier derivation (code + display name)
//! - Batch and single-user requests with validation
//! - The tagged artifact state attached to products

pub mod artifact;
pub mod error;
pub mod identifier;
pub mod product;
pub mod user;

pub use artifact::{ArtifactReference, ArtifactState};
pub use error::DomainError;
pub use identifier::{Identifier, IdentifierInput};
pub use product::{
    BatchTemplate, BillNumber, Money, Product, ProvisioningItem, ProvisioningRequest, TierCode,
};
pub use user::{NewUser, NewUserRequest, Role, User};
