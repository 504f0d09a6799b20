//! HTTP API server with observability for the provisioning pipelines.
//!
//! Provides REST endpoints for batch product provisioning, artifact
//! reconciliation and privileged account creation, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{Product, User};
use metrics_exporter_prometheus::PrometheusHandle;
use provisioning::{
    AccountProvisioner, ArtifactProvisioner, BatchProvisioner, InMemoryCodeImageGenerator,
    InMemoryObjectStorage, Notifier,
};
use record_store::RecordStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<P, U> {
    pub batch: BatchProvisioner<P, InMemoryCodeImageGenerator, InMemoryObjectStorage>,
    pub accounts: AccountProvisioner<U, Arc<dyn Notifier>, InMemoryObjectStorage>,
    pub storage: InMemoryObjectStorage,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<P, U>(state: Arc<AppState<P, U>>, metrics_handle: PrometheusHandle) -> Router
where
    P: RecordStore<Product> + 'static,
    U: RecordStore<User> + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<P, U>))
        .route("/products/batch", post(routes::products::provision_batch::<P, U>))
        .route("/products/{id}", get(routes::products::get::<P, U>))
        .route(
            "/products/artifacts/reconcile",
            post(routes::products::reconcile::<P, U>),
        )
        .route("/users", post(routes::users::create::<P, U>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around the given stores and notifier.
///
/// Code images and uploaded documents live in an in-memory object storage
/// served under `{PUBLIC_BASE_URL}/objects`.
pub fn create_default_state<P, U>(
    products: P,
    users: U,
    notifier: Arc<dyn Notifier>,
    config: &Config,
) -> Arc<AppState<P, U>>
where
    P: RecordStore<Product>,
    U: RecordStore<User>,
{
    let storage = InMemoryObjectStorage::new(format!(
        "{}/objects",
        config.public_base_url.trim_end_matches('/')
    ));

    let artifacts = ArtifactProvisioner::new(
        InMemoryCodeImageGenerator::new(),
        storage.clone(),
        config.artifact_config(),
    );
    let batch = BatchProvisioner::new(products, artifacts, config.batch_config());
    let accounts = AccountProvisioner::new(
        users,
        notifier,
        storage.clone(),
        config.account_config(),
    );

    Arc::new(AppState {
        batch,
        accounts,
        storage,
    })
}
