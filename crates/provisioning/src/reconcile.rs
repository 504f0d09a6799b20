//! Out-of-band retry of artifacts that were never attached.

use domain::Product;
use record_store::RecordStore;
use serde::Serialize;

use crate::artifact::ArtifactProvisioner;
use crate::error::Result;
use crate::services::{CodeImageGenerator, ObjectStorage};

/// Summary of a reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Products whose artifact was pending or failed.
    pub examined: usize,
    pub attached: usize,
    pub failed: usize,
}

/// Re-runs artifact provisioning for products without an attached artifact.
///
/// Uploads overwrite the same path, so a pass may be repeated or run
/// concurrently with batches without creating duplicate objects.
pub struct ArtifactReconciler<'a, S: ?Sized, G, O> {
    store: &'a S,
    artifacts: &'a ArtifactProvisioner<G, O>,
}

impl<'a, S, G, O> ArtifactReconciler<'a, S, G, O>
where
    S: RecordStore<Product> + ?Sized,
    G: CodeImageGenerator,
    O: ObjectStorage,
{
    pub fn new(store: &'a S, artifacts: &'a ArtifactProvisioner<G, O>) -> Self {
        Self { store, artifacts }
    }

    /// Runs one pass over the store.
    ///
    /// # Errors
    ///
    /// Returns an error only if the products cannot be listed.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let pending = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|product| product.artifact.needs_reconcile());

        for product in pending {
            report.examined += 1;
            if self.artifacts.attach_to(self.store, product).await.is_attached() {
                report.attached += 1;
            } else {
                report.failed += 1;
            }
        }

        metrics::counter!("artifact_reconcile_attached_total").increment(report.attached as u64);
        tracing::info!(
            examined = report.examined,
            attached = report.attached,
            failed = report.failed,
            "reconcile pass finished"
        );
        Ok(report)
    }
}
