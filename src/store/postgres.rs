//! Postgres-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ApiKeyStore, PackageStore};
use crate::error::{AppError, Result};
use crate::models::api_key::{ApiKey, ApiKeyScope};
use crate::models::package::{Download, NewVersion, Package, Version};

/// Postgres store for all registry entities.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Postgres unique-constraint violation (SQLSTATE 23505), used to turn a
/// racing duplicate publish into a conflict instead of a server error.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

const VERSION_COLUMNS: &str = "package_name, version, data, size_kb, owner_display_name, \
     readme, description, tags, repository, is_yanked, created_at";

#[async_trait]
impl PackageStore for PgStore {
    async fn find_package(&self, name: &str) -> Result<Option<Package>> {
        let package = sqlx::query_as::<_, Package>(
            "SELECT name, owner_user_id, created_at FROM packages WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(package)
    }

    async fn find_versions(&self, name: &str) -> Result<Vec<Version>> {
        let versions = sqlx::query_as::<_, Version>(&format!(
            "SELECT {VERSION_COLUMNS} FROM versions WHERE package_name = $1"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    async fn find_version(&self, name: &str, version: &str) -> Result<Option<Version>> {
        let version = sqlx::query_as::<_, Version>(&format!(
            "SELECT {VERSION_COLUMNS} FROM versions WHERE package_name = $1 AND version = $2"
        ))
        .bind(name)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(version)
    }

    async fn create_package_with_version(
        &self,
        name: &str,
        owner_user_id: &str,
        version: &NewVersion,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO packages (name, owner_user_id) VALUES ($1, $2)")
            .bind(name)
            .bind(owner_user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Package {} already exists", name))
                } else {
                    AppError::Database(e)
                }
            })?;

        insert_version_row(&mut tx, name, version).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_version(&self, name: &str, version: &NewVersion) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_version_row(&mut tx, name, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_yanked(&self, name: &str, version: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE versions SET is_yanked = TRUE WHERE package_name = $1 AND version = $2")
                .bind(name)
                .bind(version)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Version {} of package {} not found",
                version, name
            )));
        }
        Ok(())
    }

    async fn list_packages(&self, limit: i64) -> Result<Vec<Package>> {
        let packages = sqlx::query_as::<_, Package>(
            "SELECT name, owner_user_id, created_at FROM packages ORDER BY created_at LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(packages)
    }

    async fn packages_by_owner(&self, user_id: &str) -> Result<Vec<Package>> {
        let packages = sqlx::query_as::<_, Package>(
            "SELECT name, owner_user_id, created_at FROM packages WHERE owner_user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(packages)
    }

    async fn record_download(&self, name: &str, version: &str) -> Result<Download> {
        let download = sqlx::query_as::<_, Download>(
            "INSERT INTO downloads (id, package_name, version) VALUES ($1, $2, $3) \
             RETURNING id, package_name, version, downloaded_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(version)
        .fetch_one(&self.pool)
        .await?;

        Ok(download)
    }

    async fn downloads_for_version(&self, name: &str, version: &str) -> Result<Vec<Download>> {
        let downloads = sqlx::query_as::<_, Download>(
            "SELECT id, package_name, version, downloaded_at FROM downloads \
             WHERE package_name = $1 AND version = $2 ORDER BY downloaded_at DESC",
        )
        .bind(name)
        .bind(version)
        .fetch_all(&self.pool)
        .await?;

        Ok(downloads)
    }

    async fn count_downloads_for_package(&self, name: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM downloads WHERE package_name = $1")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn list_downloads(&self, newest_first: bool) -> Result<Vec<Download>> {
        let order = if newest_first { "DESC" } else { "ASC" };
        let downloads = sqlx::query_as::<_, Download>(&format!(
            "SELECT id, package_name, version, downloaded_at FROM downloads ORDER BY downloaded_at {order}"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(downloads)
    }
}

async fn insert_version_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    name: &str,
    version: &NewVersion,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO versions (package_name, version, data, size_kb, owner_display_name, \
         readme, description, tags, repository) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(name)
    .bind(&version.version)
    .bind(&version.data)
    .bind(version.size_kb)
    .bind(&version.owner_display_name)
    .bind(&version.readme)
    .bind(&version.description)
    .bind(&version.tags)
    .bind(&version.repository)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!(
                "Version {} already exists for package {}",
                version.version, name
            ))
        } else {
            AppError::Database(e)
        }
    })?;

    Ok(())
}

/// Row shape for `api_keys`; scopes arrive as TEXT[] and are parsed into the
/// typed enum on the way out.
#[derive(FromRow)]
struct ApiKeyRow {
    id: Uuid,
    key: String,
    user_id: String,
    label: Option<String>,
    scopes: Vec<String>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl ApiKeyRow {
    fn into_model(self) -> Result<ApiKey> {
        let scopes = self
            .scopes
            .iter()
            .map(|s| ApiKeyScope::parse(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(ApiKey {
            id: self.id,
            key: self.key,
            user_id: self.user_id,
            label: self.label,
            scopes,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

const API_KEY_COLUMNS: &str = "id, key, user_id, label, scopes, created_at, expires_at";

#[async_trait]
impl ApiKeyStore for PgStore {
    async fn find_by_secret(&self, secret: &str) -> Result<Option<ApiKey>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE key = $1"
        ))
        .bind(secret)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ApiKeyRow::into_model).transpose()
    }

    async fn insert_key(&self, key: &ApiKey) -> Result<()> {
        let scopes: Vec<String> = key.scopes.iter().map(|s| s.as_str().to_string()).collect();

        sqlx::query(
            "INSERT INTO api_keys (id, key, user_id, label, scopes, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(key.id)
        .bind(&key.key)
        .bind(&key.user_id)
        .bind(&key.label)
        .bind(&scopes)
        .bind(key.created_at)
        .bind(key.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ApiKey>> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ApiKeyRow::into_model).collect()
    }

    async fn delete_key(&self, user_id: &str, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
