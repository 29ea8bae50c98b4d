//! Package registry core.
//!
//! Orchestrates the publish pipeline, yanking, the read-only query surface,
//! and download serving. Sole writer of persisted package state; all
//! authorization goes through the API key service before any validation or
//! write happens.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{ARCHIVE_CONTENT_TYPE, MAX_UPLOAD_BYTES};
use crate::error::{AppError, Result};
use crate::models::api_key::ApiKeyScope;
use crate::models::manifest::{MANIFEST_FILE, README_FILE};
use crate::models::package::{NewVersion, Version};
use crate::services::api_key_service::ApiKeyService;
use crate::services::extract_service;
use crate::services::identity_service::IdentityResolver;
use crate::services::name_validator::validate_name;
use crate::services::version_order::{sort_versions_desc, validate_version};
use crate::store::PackageStore;

/// Version fields exposed in listings.
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub size_kb: f64,
    pub is_yanked: bool,
}

impl From<&Version> for VersionSummary {
    fn from(v: &Version) -> Self {
        Self {
            version: v.version.clone(),
            created_at: v.created_at,
            size_kb: v.size_kb,
            is_yanked: v.is_yanked,
        }
    }
}

/// Full detail of one version, as served by the version-detail endpoint and
/// embedded as the summary entry of package listings.
#[derive(Debug, Clone, Serialize)]
pub struct VersionDetail {
    #[serde(flatten)]
    pub summary: VersionSummary,
    pub owner_display_name: String,
    pub readme: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub repository: Option<String>,
}

impl From<&Version> for VersionDetail {
    fn from(v: &Version) -> Self {
        Self {
            summary: VersionSummary::from(v),
            owner_display_name: v.owner_display_name.clone(),
            readme: v.readme.clone(),
            description: v.description.clone(),
            tags: v.tags.clone(),
            repository: v.repository.clone(),
        }
    }
}

/// One package with its visible versions, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PackageListing {
    pub name: String,
    pub versions: Vec<VersionSummary>,
    pub latest: VersionDetail,
}

/// Byte payload of a served download.
#[derive(Debug)]
pub struct DownloadPayload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// A download log entry joined with its package and version keys.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadEntry {
    pub package: String,
    pub version: String,
    pub download_date: DateTime<Utc>,
}

/// Package registry service.
pub struct PackageService {
    store: Arc<dyn PackageStore>,
    api_keys: ApiKeyService,
    identity: Arc<dyn IdentityResolver>,
    staging_path: PathBuf,
}

impl PackageService {
    pub fn new(
        store: Arc<dyn PackageStore>,
        api_keys: ApiKeyService,
        identity: Arc<dyn IdentityResolver>,
        staging_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            api_keys,
            identity,
            staging_path: staging_path.into(),
        }
    }

    /// Publish a new version of a package.
    ///
    /// Ownership and credential checks run before any input validation so
    /// that validation messages for an existing package cannot be probed
    /// without a valid scoped key.
    pub async fn publish(
        &self,
        name: &str,
        version: &str,
        data: Bytes,
        mime_type: &str,
        api_key_secret: &str,
    ) -> Result<()> {
        let name = name.trim();

        let existing = self.store.find_package(name).await?;
        let owner_user_id = match &existing {
            Some(package) => {
                self.api_keys
                    .assert_ownership(
                        api_key_secret,
                        &[ApiKeyScope::Publish],
                        &package.owner_user_id,
                        name,
                    )
                    .await?;
                let versions = self.store.find_versions(name).await?;
                if versions.iter().any(|v| v.version == version) {
                    return Err(AppError::Conflict(format!(
                        "Version {} already exists for package {}",
                        version, name
                    )));
                }
                package.owner_user_id.clone()
            }
            None => {
                self.api_keys
                    .resolve_owner(api_key_secret, &[ApiKeyScope::Publish])
                    .await?
            }
        };

        let owner_display_name = self.identity.resolve_display_name(&owner_user_id).await?;

        validate_name(name)?;
        validate_version(version)?;
        self.validate_archive(&data, mime_type)?;

        let staging_dir = self.staging_path.join(format!("{}_{}", name, version));
        std::fs::create_dir_all(&staging_dir)?;

        let publish_result = self
            .extract_and_persist(
                name,
                version,
                &data,
                &owner_user_id,
                owner_display_name,
                &staging_dir,
                existing.is_some(),
            )
            .await;

        // The staging directory is scratch space for a single publish call.
        if let Err(e) = std::fs::remove_dir_all(&staging_dir) {
            tracing::warn!(dir = %staging_dir.display(), "Failed to clean staging directory: {}", e);
        }

        publish_result
    }

    #[allow(clippy::too_many_arguments)]
    async fn extract_and_persist(
        &self,
        name: &str,
        version: &str,
        data: &Bytes,
        owner_user_id: &str,
        owner_display_name: String,
        staging_dir: &std::path::Path,
        package_exists: bool,
    ) -> Result<()> {
        extract_service::extract_tar_gz(data, staging_dir)?;
        let manifest = extract_service::parse_manifest(&staging_dir.join(MANIFEST_FILE))?;
        let readme = extract_service::read_optional_text(&staging_dir.join(README_FILE))?;

        let new_version = NewVersion {
            version: version.to_string(),
            data: data.to_vec(),
            size_kb: data.len() as f64 / 1024.0,
            owner_display_name,
            readme,
            description: manifest.package.description.clone(),
            tags: manifest.package.keywords.as_ref().map(|k| k.join(", ")),
            repository: manifest.package.repository.clone(),
        };

        if package_exists {
            self.store.insert_version(name, &new_version).await?;
            tracing::info!(package = name, version, "New version published");
        } else {
            self.store
                .create_package_with_version(name, owner_user_id, &new_version)
                .await?;
            tracing::info!(
                package = name,
                version,
                owner_user_id,
                "New package published"
            );
        }

        Ok(())
    }

    fn validate_archive(&self, data: &Bytes, mime_type: &str) -> Result<()> {
        if data.is_empty() {
            return Err(AppError::Validation("Given file is empty".into()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(format!(
                "Given file is too big. Max file size is {} MiB",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }
        if mime_type != ARCHIVE_CONTENT_TYPE || !extract_service::looks_like_gzip(data) {
            return Err(AppError::Validation("Given file is not a gzip file".into()));
        }
        Ok(())
    }

    /// Soft-delete a version.
    ///
    /// Lookup failures are reported as `Unauthorized` rather than `NotFound`
    /// so non-owners cannot probe for package existence. Re-yanking an
    /// already-yanked version succeeds silently.
    pub async fn yank(&self, name: &str, version: &str, api_key_secret: &str) -> Result<()> {
        let name = name.trim();

        let package = self
            .store
            .find_package(name)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("You are not the owner of package {}", name)))?;

        self.api_keys
            .assert_ownership(
                api_key_secret,
                &[ApiKeyScope::Yank],
                &package.owner_user_id,
                name,
            )
            .await?;

        let target = self.store.find_version(name, version).await?;
        if target.is_none() {
            return Err(AppError::Unauthorized(format!(
                "You are not the owner of package {}",
                name
            )));
        }

        self.store.set_yanked(name, version).await?;
        tracing::info!(package = name, version, "Version yanked");
        Ok(())
    }

    /// The newest non-yanked version of a package.
    pub async fn latest_version(&self, name: &str) -> Result<VersionSummary> {
        let name = name.trim();
        self.require_package(name).await?;

        let versions = self.visible_versions(name).await?;
        versions
            .first()
            .map(VersionSummary::from)
            .ok_or_else(|| AppError::NotFound(format!("Package {} not found", name)))
    }

    /// All non-yanked versions, newest first.
    pub async fn all_versions(&self, name: &str) -> Result<Vec<VersionSummary>> {
        let name = name.trim();
        self.require_package(name).await?;

        let versions = self.visible_versions(name).await?;
        Ok(versions.iter().map(VersionSummary::from).collect())
    }

    /// Detail view of one exact version.
    pub async fn get_version(&self, name: &str, version: &str) -> Result<VersionDetail> {
        let name = name.trim();
        validate_version(version)?;

        let found = self
            .store
            .find_version(name, version)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Version {} not found for package {}",
                    version, name
                ))
            })?;

        Ok(VersionDetail::from(&found))
    }

    /// Up to `limit` packages (default 10, capped at 100) with their visible
    /// versions. Packages whose every version is yanked are excluded.
    pub async fn list_packages(&self, limit: Option<i64>) -> Result<Vec<PackageListing>> {
        let limit = limit.unwrap_or(10).clamp(1, 100);
        let packages = self.store.list_packages(limit).await?;

        let mut listings = Vec::new();
        for package in packages {
            if let Some(listing) = self.build_listing(&package.name, true).await? {
                listings.push(listing);
            }
        }
        Ok(listings)
    }

    /// All packages owned by a user, yanked versions included.
    pub async fn user_packages(&self, user_id: &str) -> Result<Vec<PackageListing>> {
        let packages = self.store.packages_by_owner(user_id).await?;

        let mut listings = Vec::new();
        for package in packages {
            if let Some(listing) = self.build_listing(&package.name, false).await? {
                listings.push(listing);
            }
        }
        Ok(listings)
    }

    /// Serve the archive bytes of one version, appending a download record.
    ///
    /// Recording is best-effort: its failure is logged and never blocks the
    /// response. No record is written when the lookup fails.
    pub async fn download(
        &self,
        name: &str,
        version: &str,
        include_yanked: bool,
    ) -> Result<DownloadPayload> {
        let name = name.trim();

        let found = self.store.find_version(name, version).await?;
        let found = match found {
            Some(v) if !v.is_yanked || include_yanked => v,
            _ => {
                return Err(AppError::NotFound(format!(
                    "Version {} not found for package {}",
                    version, name
                )))
            }
        };

        if let Err(e) = self.store.record_download(name, version).await {
            tracing::warn!(package = name, version, "Failed to record download: {}", e);
        }

        Ok(DownloadPayload {
            file_name: format!("{}-{}", name, version),
            data: found.data,
        })
    }

    /// Download timestamps for one version, newest first.
    pub async fn version_download_history(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Vec<DateTime<Utc>>> {
        let downloads = self
            .store
            .downloads_for_version(name.trim(), version.trim())
            .await?;
        Ok(downloads.into_iter().map(|d| d.downloaded_at).collect())
    }

    /// Total downloads across all versions of a package.
    pub async fn package_download_count(&self, name: &str) -> Result<i64> {
        self.store.count_downloads_for_package(name.trim()).await
    }

    /// All download records with the grand total.
    pub async fn list_all_downloads(
        &self,
        newest_first: bool,
    ) -> Result<(Vec<DownloadEntry>, i64)> {
        let downloads = self.store.list_downloads(newest_first).await?;
        let total = downloads.len() as i64;
        let entries = downloads
            .into_iter()
            .map(|d| DownloadEntry {
                package: d.package_name,
                version: d.version,
                download_date: d.downloaded_at,
            })
            .collect();
        Ok((entries, total))
    }

    async fn require_package(&self, name: &str) -> Result<()> {
        self.store
            .find_package(name)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Package {} not found", name)))
    }

    /// Non-yanked versions of a package, newest first.
    async fn visible_versions(&self, name: &str) -> Result<Vec<Version>> {
        let versions = self.store.find_versions(name).await?;
        let sorted = sort_versions_desc(versions)?;
        Ok(sorted.into_iter().filter(|v| !v.is_yanked).collect())
    }

    /// Build a listing for one package, or `None` when no version passes the
    /// yank filter.
    async fn build_listing(&self, name: &str, filter_yanked: bool) -> Result<Option<PackageListing>> {
        let versions = self.store.find_versions(name).await?;
        let sorted = sort_versions_desc(versions)?;
        let visible: Vec<&Version> = sorted
            .iter()
            .filter(|v| !filter_yanked || !v.is_yanked)
            .collect();

        let Some(latest) = visible.first() else {
            return Ok(None);
        };

        Ok(Some(PackageListing {
            name: name.to_string(),
            versions: visible.iter().map(|v| VersionSummary::from(*v)).collect(),
            latest: VersionDetail::from(*latest),
        }))
    }
}
