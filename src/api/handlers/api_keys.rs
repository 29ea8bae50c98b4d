//! API key management endpoints.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, post},
    Json, Router,
};
use uuid::Uuid;

use super::session_user;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::api_key::ApiKeyCreated;
use crate::services::api_key_service::{ApiKeyInfo, CreateApiKeyRequest};

/// Create API key routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/apikey", post(create_key).get(list_keys))
        .route("/apikey/:id", delete(delete_key))
}

async fn create_key(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyCreated>)> {
    let user_id = session_user(&headers)?;
    let created = state.api_keys.create_key(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_keys(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ApiKeyInfo>>> {
    let user_id = session_user(&headers)?;
    let keys = state.api_keys.list_keys(&user_id).await?;
    Ok(Json(keys))
}

async fn delete_key(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let user_id = session_user(&headers)?;
    state.api_keys.delete_key(&user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
