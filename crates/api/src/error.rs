//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use provisioning::ProvisioningError;
use record_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Provisioning pipeline error.
    Provisioning(ProvisioningError),
    /// Record store error.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, error_body(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            ApiError::Provisioning(err) => provisioning_error_to_response(err),
            ApiError::Store(err) => {
                let status = store_error_status(&err);
                (status, error_body(err.to_string()))
            }
        };

        if status.is_server_error() {
            let message = body["error"].to_string();
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }
        (status, axum::Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn provisioning_error_to_response(err: ProvisioningError) -> (StatusCode, serde_json::Value) {
    if let ProvisioningError::NothingCreated { errors, .. } = &err {
        let status = if err.is_store_outage() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        let body = serde_json::json!({ "error": err.to_string(), "errors": errors });
        return (status, body);
    }
    (provisioning_error_status(&err), error_body(err.to_string()))
}

fn provisioning_error_status(err: &ProvisioningError) -> StatusCode {
    match err.root_cause() {
        ProvisioningError::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
        ProvisioningError::Domain(DomainError::Store(e)) | ProvisioningError::Store(e) => {
            store_error_status(e)
        }
        ProvisioningError::Conflict { .. } => StatusCode::CONFLICT,
        ProvisioningError::NothingCreated { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ProvisioningError::NotificationTransport(_)
        | ProvisioningError::NotificationRejected { .. }
        | ProvisioningError::CodeGeneration(_)
        | ProvisioningError::Storage(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_error_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::DuplicateKey { .. } => StatusCode::CONFLICT,
        StoreError::InvalidUpdate(_) => StatusCode::BAD_REQUEST,
        e if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ProvisioningError> for ApiError {
    fn from(err: ProvisioningError) -> Self {
        ApiError::Provisioning(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
