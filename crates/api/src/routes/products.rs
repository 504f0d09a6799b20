//! Product provisioning and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::RecordId;
use domain::{Product, ProvisioningRequest, User};
use provisioning::{ArtifactReconciler, BatchOutcome, ReconcileReport};
use record_store::RecordStore;

use crate::AppState;
use crate::error::ApiError;

/// POST /products/batch: provision a batch of products.
#[tracing::instrument(skip(state, req))]
pub async fn provision_batch<P, U>(
    State(state): State<Arc<AppState<P, U>>>,
    Json(req): Json<ProvisioningRequest>,
) -> Result<(StatusCode, Json<BatchOutcome>), ApiError>
where
    P: RecordStore<Product> + 'static,
    U: RecordStore<User> + 'static,
{
    let outcome = state.batch.provision(&req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /products: list all products.
#[tracing::instrument(skip(state))]
pub async fn list<P, U>(
    State(state): State<Arc<AppState<P, U>>>,
) -> Result<Json<Vec<Product>>, ApiError>
where
    P: RecordStore<Product> + 'static,
    U: RecordStore<User> + 'static,
{
    let products = state.batch.store().list().await?;
    Ok(Json(products))
}

/// GET /products/{id}: load one product.
#[tracing::instrument(skip(state))]
pub async fn get<P, U>(
    State(state): State<Arc<AppState<P, U>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError>
where
    P: RecordStore<Product> + 'static,
    U: RecordStore<User> + 'static,
{
    let record_id: RecordId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid product id: {e}")))?;

    let product = state
        .batch
        .store()
        .get(record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(product))
}

/// POST /products/artifacts/reconcile: retry missing artifacts.
#[tracing::instrument(skip(state))]
pub async fn reconcile<P, U>(
    State(state): State<Arc<AppState<P, U>>>,
) -> Result<Json<ReconcileReport>, ApiError>
where
    P: RecordStore<Product> + 'static,
    U: RecordStore<User> + 'static,
{
    let reconciler = ArtifactReconciler::new(state.batch.store(), state.batch.artifacts());
    let report = reconciler.reconcile().await?;
    Ok(Json(report))
}
