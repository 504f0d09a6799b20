//! Batch provisioning: N records from one request, failures tolerated per item.

use std::time::Instant;

use common::RecordId;
use domain::{DomainError, Product, ProvisioningItem, ProvisioningRequest};
use record_store::{RecordStore, RecordStoreExt, StoreError};
use serde::Serialize;

use crate::artifact::ArtifactProvisioner;
use crate::error::{ProvisioningError, Result};
use crate::services::{CodeImageGenerator, ObjectStorage};

/// Limits applied to batch requests.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_batch_size: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
        }
    }
}

/// Why a single item was not created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ItemFailureKind {
    /// The uniqueness check found the code already taken.
    CodeCollision,
    /// The store's unique index rejected the write.
    DuplicateKey { field: String, value: String },
    /// The store could not be reached for this item.
    StoreUnavailable { message: String },
    /// The store failed for this item.
    Store { message: String },
}

/// An item-level failure, reported as data in the batch outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub index: u32,
    pub display_name: String,
    pub code: String,
    #[serde(flatten)]
    pub kind: ItemFailureKind,
}

impl ItemFailure {
    /// Returns true if the item failed because the store was unreachable.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self.kind, ItemFailureKind::StoreUnavailable { .. })
    }
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "item {} ({}): ", self.index, self.display_name)?;
        match &self.kind {
            ItemFailureKind::CodeCollision => {
                write!(f, "code {} already exists", self.code)
            }
            ItemFailureKind::DuplicateKey { field, value } => {
                write!(f, "{field} {value} was taken concurrently")
            }
            ItemFailureKind::StoreUnavailable { message } => {
                write!(f, "store unavailable: {message}")
            }
            ItemFailureKind::Store { message } => write!(f, "store error: {message}"),
        }
    }
}

/// Result of a batch with at least one created item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    created_count: usize,
    requested_count: u32,
    items: Vec<Product>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ItemFailure>,
}

impl BatchOutcome {
    pub fn created_count(&self) -> usize {
        self.created_count
    }

    pub fn requested_count(&self) -> u32 {
        self.requested_count
    }

    /// Created products, in index order.
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    /// Item failures, in index order.
    pub fn errors(&self) -> &[ItemFailure] {
        &self.errors
    }
}

/// Creates a batch of products from one request.
///
/// Items are processed strictly in order, so the uniqueness check of item
/// `i + 1` sees the commit of item `i`. Created records are never rolled
/// back when a later item fails.
pub struct BatchProvisioner<S, G, O> {
    store: S,
    artifacts: ArtifactProvisioner<G, O>,
    config: BatchConfig,
}

impl<S, G, O> BatchProvisioner<S, G, O>
where
    S: RecordStore<Product>,
    G: CodeImageGenerator,
    O: ObjectStorage,
{
    /// Creates a new batch provisioner.
    pub fn new(store: S, artifacts: ArtifactProvisioner<G, O>, config: BatchConfig) -> Self {
        Self {
            store,
            artifacts,
            config,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the artifact provisioner used for each item.
    pub fn artifacts(&self) -> &ArtifactProvisioner<G, O> {
        &self.artifacts
    }

    /// Runs the batch.
    ///
    /// # Errors
    ///
    /// - a validation error before any side effect
    /// - `NothingCreated` when every item failed
    #[tracing::instrument(skip(self, request), fields(count = request.count, bill_no = %request.bill_no))]
    pub async fn provision(&self, request: &ProvisioningRequest) -> Result<BatchOutcome> {
        metrics::counter!("provisioning_batches_total").increment(1);
        let started = Instant::now();

        let template = request.validate()?;
        if template.count > self.config.max_batch_size {
            return Err(DomainError::validation(
                "count",
                format!(
                    "count {} exceeds the maximum batch size of {}",
                    template.count, self.config.max_batch_size
                ),
            )
            .into());
        }

        let mut items = Vec::new();
        let mut errors = Vec::new();
        for item in template.items() {
            match self.provision_item(item).await {
                Ok(product) => items.push(product),
                Err(failure) => {
                    tracing::warn!(index = failure.index, code = %failure.code, %failure, "item failed");
                    errors.push(failure);
                }
            }
        }

        metrics::counter!("provisioning_items_created_total").increment(items.len() as u64);
        metrics::counter!("provisioning_items_failed_total").increment(errors.len() as u64);
        metrics::histogram!("provisioning_batch_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        if items.is_empty() {
            return Err(ProvisioningError::NothingCreated {
                requested: template.count,
                errors,
            });
        }

        tracing::info!(
            created = items.len(),
            failed = errors.len(),
            "batch provisioned"
        );
        Ok(BatchOutcome {
            created_count: items.len(),
            requested_count: template.count,
            items,
            errors,
        })
    }

    /// Check, persist, then attach the artifact for one item.
    async fn provision_item(&self, item: ProvisioningItem) -> std::result::Result<Product, ItemFailure> {
        let failure = |kind| ItemFailure {
            index: item.index,
            display_name: item.display_name().to_string(),
            code: item.code().to_string(),
            kind,
        };

        match self.store.exists(&Product::code_filter(item.code())).await {
            Ok(false) => {}
            Ok(true) => return Err(failure(ItemFailureKind::CodeCollision)),
            Err(e) => return Err(failure(store_failure(e))),
        }

        let created = match self.store.create(item.clone().into_product(RecordId::new())).await {
            Ok(product) => product,
            Err(StoreError::DuplicateKey { field, value, .. }) => {
                return Err(failure(ItemFailureKind::DuplicateKey { field, value }));
            }
            Err(e) => return Err(failure(store_failure(e))),
        };
        tracing::debug!(index = item.index, record_id = %created.id, "item persisted");

        Ok(self
            .artifacts
            .attach_to(&self.store, created)
            .await
            .into_product())
    }
}

fn store_failure(err: StoreError) -> ItemFailureKind {
    let message = err.to_string();
    if err.is_unavailable() {
        ItemFailureKind::StoreUnavailable { message }
    } else {
        ItemFailureKind::Store { message }
    }
}
