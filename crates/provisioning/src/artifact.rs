//! Artifact provisioning: code image generation, upload, attachment.

use common::RecordId;
use domain::{ArtifactReference, ArtifactState, Product};
use record_store::RecordStore;

use crate::error::Result;
use crate::services::{CodeImageGenerator, ObjectStorage, UploadOptions};

/// Where artifacts point to and where they are stored.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    /// Base of the URL encoded in each code image.
    pub target_base_url: String,
    /// Storage folder for uploaded images.
    pub folder: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            target_base_url: "http://localhost:3000".to_string(),
            folder: "products".to_string(),
        }
    }
}

/// Result of [`ArtifactProvisioner::attach_to`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttachOutcome {
    /// The artifact is hosted and the record points to it.
    Attached(Product),
    /// The record exists without an artifact. `product` reflects whatever
    /// artifact state could be written.
    Failed { product: Product, reason: String },
}

impl AttachOutcome {
    /// Returns the product in its latest known state.
    pub fn product(&self) -> &Product {
        match self {
            AttachOutcome::Attached(product) => product,
            AttachOutcome::Failed { product, .. } => product,
        }
    }

    /// Consumes the outcome, returning the product.
    pub fn into_product(self) -> Product {
        match self {
            AttachOutcome::Attached(product) => product,
            AttachOutcome::Failed { product, .. } => product,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, AttachOutcome::Attached(_))
    }
}

/// Produces a scannable-code image for a record and hosts it.
///
/// Uploads go to a path derived only from the record id, with overwrite
/// enabled, so running the provisioner twice for the same record replaces
/// the same object.
pub struct ArtifactProvisioner<G, O> {
    generator: G,
    storage: O,
    config: ArtifactConfig,
}

impl<G, O> ArtifactProvisioner<G, O>
where
    G: CodeImageGenerator,
    O: ObjectStorage,
{
    /// Creates a new artifact provisioner.
    pub fn new(generator: G, storage: O, config: ArtifactConfig) -> Self {
        Self {
            generator,
            storage,
            config,
        }
    }

    /// Returns the URL encoded into the record's code image.
    pub fn target_url(&self, id: RecordId) -> String {
        format!(
            "{}/products/{}",
            self.config.target_base_url.trim_end_matches('/'),
            id
        )
    }

    /// Returns the deterministic upload location for a record.
    pub fn upload_options(&self, id: RecordId) -> UploadOptions {
        UploadOptions {
            folder: self.config.folder.clone(),
            public_id: format!("product_{}", id.simple()),
            overwrite: true,
        }
    }

    /// Generates and uploads the artifact for a record.
    ///
    /// The two steps run strictly in sequence; no record is touched.
    #[tracing::instrument(skip(self), fields(record_id = %id))]
    pub async fn provision(&self, id: RecordId) -> Result<ArtifactReference> {
        let payload = self.generator.generate(&self.target_url(id)).await?;
        let hosted = self
            .storage
            .upload(payload, &self.upload_options(id))
            .await?;

        tracing::debug!(url = %hosted.url, "Artifact uploaded");
        Ok(hosted.into())
    }

    /// Provisions the artifact and records the result on the product.
    ///
    /// Never fails: on error the product is marked `Failed` if the store
    /// allows, otherwise it keeps its previous state.
    #[tracing::instrument(skip(self, store, product), fields(record_id = %product.id, code = %product.code))]
    pub async fn attach_to<S>(&self, store: &S, product: Product) -> AttachOutcome
    where
        S: RecordStore<Product> + ?Sized,
    {
        let reason = match self.provision(product.id).await {
            Ok(reference) => {
                match write_state(store, &product, ArtifactState::Attached(reference)).await {
                    Ok(updated) => return AttachOutcome::Attached(updated),
                    Err(e) => format!("artifact hosted but record update failed: {e}"),
                }
            }
            Err(e) => e.to_string(),
        };

        tracing::warn!(%reason, "Artifact provisioning failed");
        metrics::counter!("artifact_failures_total").increment(1);

        let failed = ArtifactState::Failed {
            reason: reason.clone(),
        };
        let product = match write_state(store, &product, failed).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(error = %e, "Could not record artifact failure");
                product
            }
        };
        AttachOutcome::Failed { product, reason }
    }
}

async fn write_state<S>(store: &S, product: &Product, state: ArtifactState) -> Result<Product>
where
    S: RecordStore<Product> + ?Sized,
{
    let fields = Product::artifact_update(&state)?;
    Ok(store.update(product.id, fields).await?)
}
