//! Privileged account creation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{NewUserRequest, Product, Role, User};
use record_store::RecordStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

/// A created user, without the credential hash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub documents: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            documents: user.documents,
            created_at: user.created_at,
        }
    }
}

/// POST /users: create an account and send its credential.
#[tracing::instrument(skip(state, req))]
pub async fn create<P, U>(
    State(state): State<Arc<AppState<P, U>>>,
    Json(req): Json<NewUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError>
where
    P: RecordStore<Product> + 'static,
    U: RecordStore<User> + 'static,
{
    let user = state.accounts.provision(&req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}
