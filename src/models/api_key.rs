//! API key model and capability scopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Capability a key may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyScope {
    Publish,
    Yank,
}

impl ApiKeyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyScope::Publish => "publish",
            ApiKeyScope::Yank => "yank",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "publish" => Ok(ApiKeyScope::Publish),
            "yank" => Ok(ApiKeyScope::Yank),
            other => Err(AppError::Validation(format!("Unknown scope: {}", other))),
        }
    }
}

impl std::fmt::Display for ApiKeyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API key entity for publish/yank authorization.
///
/// The opaque `key` secret is unique across all keys. It is returned in full
/// only once, at creation time; listings expose metadata only.
#[derive(Clone, Serialize)]
pub struct ApiKey {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub key: String,
    pub user_id: String,
    pub label: Option<String>,
    pub scopes: Vec<ApiKeyScope>,
    pub created_at: DateTime<Utc>,
    /// Absent means the key never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

redacted_debug!(ApiKey {
    show id,
    redact key,
    show user_id,
    show label,
    show scopes,
    show created_at,
    show expires_at,
});

impl ApiKey {
    /// Whether the key has passed its expiry timestamp, compared against the
    /// current time at every call.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp < now).unwrap_or(false)
    }

    pub fn has_scope(&self, scope: ApiKeyScope) -> bool {
        self.scopes.contains(&scope)
    }
}

/// Response type for key creation (includes the secret exactly once).
#[derive(Clone, Serialize)]
pub struct ApiKeyCreated {
    pub id: Uuid,
    pub key: String,
    pub scopes: Vec<ApiKeyScope>,
    pub created_at: DateTime<Utc>,
    pub label: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

redacted_debug!(ApiKeyCreated {
    show id,
    redact key,
    show scopes,
    show label,
});
