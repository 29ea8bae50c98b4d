//! In-memory store.
//!
//! Mirrors the Postgres backend's uniqueness semantics over plain locked
//! tables. Backs the integration test suite and ephemeral development runs;
//! nothing survives process exit.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{ApiKeyStore, PackageStore};
use crate::error::{AppError, Result};
use crate::models::api_key::ApiKey;
use crate::models::package::{Download, NewVersion, Package, Version};

#[derive(Default)]
struct Tables {
    packages: HashMap<String, Package>,
    // Insertion order doubles as creation order.
    versions: Vec<Version>,
    downloads: Vec<Download>,
    api_keys: Vec<ApiKey>,
}

/// Lock-protected in-memory tables implementing both store interfaces.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn materialize_version(name: &str, version: &NewVersion) -> Version {
        Version {
            package_name: name.to_string(),
            version: version.version.clone(),
            data: version.data.clone(),
            size_kb: version.size_kb,
            owner_display_name: version.owner_display_name.clone(),
            readme: version.readme.clone(),
            description: version.description.clone(),
            tags: version.tags.clone(),
            repository: version.repository.clone(),
            is_yanked: false,
            created_at: Utc::now(),
        }
    }

    fn push_version(tables: &mut Tables, name: &str, version: &NewVersion) -> Result<()> {
        let duplicate = tables
            .versions
            .iter()
            .any(|v| v.package_name == name && v.version == version.version);
        if duplicate {
            return Err(AppError::Conflict(format!(
                "Version {} already exists for package {}",
                version.version, name
            )));
        }
        tables
            .versions
            .push(Self::materialize_version(name, version));
        Ok(())
    }
}

#[async_trait]
impl PackageStore for MemoryStore {
    async fn find_package(&self, name: &str) -> Result<Option<Package>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.packages.get(name).cloned())
    }

    async fn find_versions(&self, name: &str) -> Result<Vec<Version>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .versions
            .iter()
            .filter(|v| v.package_name == name)
            .cloned()
            .collect())
    }

    async fn find_version(&self, name: &str, version: &str) -> Result<Option<Version>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .versions
            .iter()
            .find(|v| v.package_name == name && v.version == version)
            .cloned())
    }

    async fn create_package_with_version(
        &self,
        name: &str,
        owner_user_id: &str,
        version: &NewVersion,
    ) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        if tables.packages.contains_key(name) {
            return Err(AppError::Conflict(format!(
                "Package {} already exists",
                name
            )));
        }
        Self::push_version(&mut tables, name, version)?;
        tables.packages.insert(
            name.to_string(),
            Package {
                name: name.to_string(),
                owner_user_id: owner_user_id.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn insert_version(&self, name: &str, version: &NewVersion) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        Self::push_version(&mut tables, name, version)
    }

    async fn set_yanked(&self, name: &str, version: &str) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        let found = tables
            .versions
            .iter_mut()
            .find(|v| v.package_name == name && v.version == version);
        match found {
            Some(v) => {
                v.is_yanked = true;
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Version {} of package {} not found",
                version, name
            ))),
        }
    }

    async fn list_packages(&self, limit: i64) -> Result<Vec<Package>> {
        let tables = self.tables.read().unwrap();
        let mut packages: Vec<Package> = tables.packages.values().cloned().collect();
        packages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        packages.truncate(limit.max(0) as usize);
        Ok(packages)
    }

    async fn packages_by_owner(&self, user_id: &str) -> Result<Vec<Package>> {
        let tables = self.tables.read().unwrap();
        let mut packages: Vec<Package> = tables
            .packages
            .values()
            .filter(|p| p.owner_user_id == user_id)
            .cloned()
            .collect();
        packages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(packages)
    }

    async fn record_download(&self, name: &str, version: &str) -> Result<Download> {
        let mut tables = self.tables.write().unwrap();
        let download = Download {
            id: Uuid::new_v4(),
            package_name: name.to_string(),
            version: version.to_string(),
            downloaded_at: Utc::now(),
        };
        tables.downloads.push(download.clone());
        Ok(download)
    }

    async fn downloads_for_version(&self, name: &str, version: &str) -> Result<Vec<Download>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .downloads
            .iter()
            .rev()
            .filter(|d| d.package_name == name && d.version == version)
            .cloned()
            .collect())
    }

    async fn count_downloads_for_package(&self, name: &str) -> Result<i64> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .downloads
            .iter()
            .filter(|d| d.package_name == name)
            .count() as i64)
    }

    async fn list_downloads(&self, newest_first: bool) -> Result<Vec<Download>> {
        let tables = self.tables.read().unwrap();
        let mut downloads: Vec<Download> = tables.downloads.clone();
        if newest_first {
            downloads.reverse();
        }
        Ok(downloads)
    }
}

#[async_trait]
impl ApiKeyStore for MemoryStore {
    async fn find_by_secret(&self, secret: &str) -> Result<Option<ApiKey>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.api_keys.iter().find(|k| k.key == secret).cloned())
    }

    async fn insert_key(&self, key: &ApiKey) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        if tables.api_keys.iter().any(|k| k.key == key.key) {
            return Err(AppError::Conflict("API key secret already exists".into()));
        }
        tables.api_keys.push(key.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ApiKey>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .api_keys
            .iter()
            .rev()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_key(&self, user_id: &str, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        tables
            .api_keys
            .retain(|k| !(k.id == id && k.user_id == user_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_version(version: &str) -> NewVersion {
        NewVersion {
            version: version.to_string(),
            data: vec![1, 2, 3],
            size_kb: 3.0 / 1024.0,
            owner_display_name: "alice".to_string(),
            readme: None,
            description: None,
            tags: None,
            repository: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_version_rejected() {
        let store = MemoryStore::new();
        store
            .create_package_with_version("pkg", "1", &new_version("1.0.0"))
            .await
            .unwrap();

        let err = store
            .insert_version("pkg", &new_version("1.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let versions = store.find_versions("pkg").await.unwrap();
        assert_eq!(versions.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_package_rejected() {
        let store = MemoryStore::new();
        store
            .create_package_with_version("pkg", "1", &new_version("1.0.0"))
            .await
            .unwrap();

        let err = store
            .create_package_with_version("pkg", "2", &new_version("2.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_yank_is_one_way() {
        let store = MemoryStore::new();
        store
            .create_package_with_version("pkg", "1", &new_version("1.0.0"))
            .await
            .unwrap();

        store.set_yanked("pkg", "1.0.0").await.unwrap();
        let version = store.find_version("pkg", "1.0.0").await.unwrap().unwrap();
        assert!(version.is_yanked);

        // Re-yanking succeeds and stays yanked.
        store.set_yanked("pkg", "1.0.0").await.unwrap();
        let version = store.find_version("pkg", "1.0.0").await.unwrap().unwrap();
        assert!(version.is_yanked);
    }

    #[tokio::test]
    async fn test_downloads_newest_first() {
        let store = MemoryStore::new();
        store
            .create_package_with_version("pkg", "1", &new_version("1.0.0"))
            .await
            .unwrap();

        let first = store.record_download("pkg", "1.0.0").await.unwrap();
        let second = store.record_download("pkg", "1.0.0").await.unwrap();

        let history = store.downloads_for_version("pkg", "1.0.0").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
        assert_eq!(store.count_downloads_for_package("pkg").await.unwrap(), 2);
    }
}
