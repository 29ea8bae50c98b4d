//! Persistence interfaces and backends.
//!
//! The registry core never holds live object graphs: every read returns a
//! materialized snapshot, and relationship traversal is an explicit store
//! call. Two backends implement the interfaces: Postgres for production and
//! an in-memory table set for tests and ephemeral runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::api_key::ApiKey;
use crate::models::package::{Download, NewVersion, Package, Version};

/// Store for packages, their versions, and the download log.
///
/// Uniqueness of `packages.name` and `(package_name, version)` is enforced
/// here; a racing duplicate publish surfaces as a `Conflict` error from the
/// insert methods.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Look up a package by exact name.
    async fn find_package(&self, name: &str) -> Result<Option<Package>>;

    /// All versions of a package, yanked included, unordered.
    async fn find_versions(&self, name: &str) -> Result<Vec<Version>>;

    /// Look up one version by exact (name, version) key.
    async fn find_version(&self, name: &str, version: &str) -> Result<Option<Version>>;

    /// Atomically create a package and its first version.
    async fn create_package_with_version(
        &self,
        name: &str,
        owner_user_id: &str,
        version: &NewVersion,
    ) -> Result<()>;

    /// Append a version to an existing package.
    async fn insert_version(&self, name: &str, version: &NewVersion) -> Result<()>;

    /// Flip a version's yanked flag to true. Never reversed.
    async fn set_yanked(&self, name: &str, version: &str) -> Result<()>;

    /// Up to `limit` packages.
    async fn list_packages(&self, limit: i64) -> Result<Vec<Package>>;

    /// All packages owned by a user.
    async fn packages_by_owner(&self, user_id: &str) -> Result<Vec<Package>>;

    /// Append a download log row with the current timestamp.
    async fn record_download(&self, name: &str, version: &str) -> Result<Download>;

    /// Download rows for one version, newest first.
    async fn downloads_for_version(&self, name: &str, version: &str) -> Result<Vec<Download>>;

    /// Total downloads across all versions of a package.
    async fn count_downloads_for_package(&self, name: &str) -> Result<i64>;

    /// All download rows, ordered by timestamp.
    async fn list_downloads(&self, newest_first: bool) -> Result<Vec<Download>>;
}

/// Store for API keys.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Look up a key by its opaque secret.
    async fn find_by_secret(&self, secret: &str) -> Result<Option<ApiKey>>;

    /// Insert a freshly generated key.
    async fn insert_key(&self, key: &ApiKey) -> Result<()>;

    /// All keys belonging to a user.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ApiKey>>;

    /// Delete a key by id, scoped to its owner. Deleting a key that does not
    /// exist (or belongs to someone else) is a no-op.
    async fn delete_key(&self, user_id: &str, id: Uuid) -> Result<()>;
}
