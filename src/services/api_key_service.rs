//! API key service.
//!
//! The authorization gate for publish and yank: resolves an opaque key
//! secret to its owning user, checks scopes and expiry, and enforces that
//! only a package's original publisher may act on it. Also manages key
//! creation, listing, and deletion for authenticated users.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::api_key::{ApiKey, ApiKeyCreated, ApiKeyScope};
use crate::store::ApiKeyStore;

/// Maximum label length accepted on key creation.
const MAX_LABEL_LENGTH: usize = 255;

/// Request for creating a new API key.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    pub label: Option<String>,
    /// Days until expiration; absent means the key never expires.
    pub expires_days: Option<i64>,
    pub scopes: Vec<ApiKeyScope>,
}

/// Key metadata returned by listings (no secret).
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyInfo {
    pub id: Uuid,
    pub scopes: Vec<ApiKeyScope>,
    pub created_at: DateTime<Utc>,
    pub label: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ApiKey> for ApiKeyInfo {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            scopes: key.scopes,
            created_at: key.created_at,
            label: key.label,
            expires_at: key.expires_at,
        }
    }
}

/// API key service.
#[derive(Clone)]
pub struct ApiKeyService {
    store: Arc<dyn ApiKeyStore>,
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self { store }
    }

    /// Resolve a key secret to its owning user id, requiring every scope in
    /// `required_scopes` and an unexpired key.
    ///
    /// Expiry is compared against the current time on every call, never
    /// cached. Read-only.
    pub async fn resolve_owner(
        &self,
        secret: &str,
        required_scopes: &[ApiKeyScope],
    ) -> Result<String> {
        let key = self.store.find_by_secret(secret).await?.ok_or_else(|| {
            tracing::warn!("Rejected action with unknown API key");
            AppError::Unauthorized("Given API key is incorrect".into())
        })?;

        for scope in required_scopes {
            if !key.has_scope(*scope) {
                tracing::warn!(key_id = %key.id, scope = %scope, "API key lacks required scope");
                return Err(AppError::Unauthorized(format!(
                    "This API key does not have the {} scope",
                    scope
                )));
            }
        }

        if key.is_expired(Utc::now()) {
            tracing::warn!(key_id = %key.id, expires_at = ?key.expires_at, "Expired API key used");
            return Err(AppError::Unauthorized("API key is invalid".into()));
        }

        Ok(key.user_id)
    }

    /// Resolve the key and additionally require that its owner matches the
    /// package owner. Used before publishing to or yanking from an existing
    /// package.
    pub async fn assert_ownership(
        &self,
        secret: &str,
        required_scopes: &[ApiKeyScope],
        expected_owner: &str,
        package_name: &str,
    ) -> Result<()> {
        let owner = self.resolve_owner(secret, required_scopes).await?;
        if owner != expected_owner {
            tracing::warn!(package = package_name, "Non-owner attempted a gated action");
            return Err(AppError::Unauthorized(format!(
                "You are not the owner of package {}",
                package_name
            )));
        }
        Ok(())
    }

    /// Create a new API key. The opaque secret is returned exactly once.
    pub async fn create_key(
        &self,
        user_id: &str,
        request: CreateApiKeyRequest,
    ) -> Result<ApiKeyCreated> {
        if request.scopes.is_empty() || request.scopes.len() > 2 {
            return Err(AppError::Validation(
                "API key must carry one or two scopes".into(),
            ));
        }
        if let Some(label) = &request.label {
            if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
                return Err(AppError::Validation(format!(
                    "API key label must be between 1 and {} characters",
                    MAX_LABEL_LENGTH
                )));
            }
        }
        if let Some(days) = request.expires_days {
            if days <= 0 {
                return Err(AppError::Validation(
                    "API key expiry must be a positive number of days".into(),
                ));
            }
        }

        let key = ApiKey {
            id: Uuid::new_v4(),
            key: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            label: request.label,
            scopes: request.scopes,
            created_at: Utc::now(),
            expires_at: request.expires_days.map(|days| Utc::now() + Duration::days(days)),
        };

        self.store.insert_key(&key).await?;

        tracing::info!(
            key_id = %key.id,
            label = key.label.as_deref().unwrap_or("<no label>"),
            user_id,
            "New API key generated"
        );

        Ok(ApiKeyCreated {
            id: key.id,
            key: key.key,
            scopes: key.scopes,
            created_at: key.created_at,
            label: key.label,
            expires_at: key.expires_at,
        })
    }

    /// List a user's keys, secrets omitted.
    pub async fn list_keys(&self, user_id: &str) -> Result<Vec<ApiKeyInfo>> {
        let keys = self.store.list_for_user(user_id).await?;
        Ok(keys.into_iter().map(ApiKeyInfo::from).collect())
    }

    /// Delete a key by id, scoped to its owner.
    pub async fn delete_key(&self, user_id: &str, id: Uuid) -> Result<()> {
        self.store.delete_key(user_id, id).await?;
        tracing::info!(key_id = %id, user_id, "API key deleted");
        Ok(())
    }
}
