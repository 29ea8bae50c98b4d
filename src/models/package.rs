//! Package, version, and download models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Package entity.
///
/// The validated name is the primary key and immutable after creation.
/// Versions and downloads are owned one-to-many collections, always fetched
/// as materialized snapshots through the store.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Package {
    pub name: String,
    pub owner_user_id: String,
    pub created_at: DateTime<Utc>,
}

/// One published archive under a package, keyed by (package_name, version).
///
/// Immutable once created, except for `is_yanked` which flips true exactly
/// once via the yank operation and is never reversed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Version {
    pub package_name: String,
    pub version: String,
    #[serde(skip_serializing)]
    pub data: Vec<u8>,
    pub size_kb: f64,
    /// Publisher display name snapshotted at publish time, not re-resolved.
    pub owner_display_name: String,
    pub readme: Option<String>,
    pub description: Option<String>,
    /// Manifest keywords joined with ", ".
    pub tags: Option<String>,
    pub repository: Option<String>,
    pub is_yanked: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields of a version assembled by the publish pipeline, before the store
/// assigns the creation timestamp.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub version: String,
    pub data: Vec<u8>,
    pub size_kb: f64,
    pub owner_display_name: String,
    pub readme: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub repository: Option<String>,
}

/// Immutable download log record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Download {
    pub id: Uuid,
    pub package_name: String,
    pub version: String,
    pub downloaded_at: DateTime<Utc>,
}
