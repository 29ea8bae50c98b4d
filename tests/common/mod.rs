//! Common test utilities for registry integration tests.
//!
//! Provides an in-memory registry wired exactly like production (same
//! services, same store interfaces) plus helpers to build real gzip-tar
//! package archives.

#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use forge_registry::error::Result;
use forge_registry::models::api_key::{ApiKeyCreated, ApiKeyScope};
use forge_registry::services::api_key_service::{ApiKeyService, CreateApiKeyRequest};
use forge_registry::services::identity_service::IdentityResolver;
use forge_registry::services::package_service::PackageService;
use forge_registry::store::memory::MemoryStore;

/// Content type expected for package uploads.
pub const GZIP: &str = "application/gzip";

/// Identity resolver that derives a display name from the user id without
/// any network traffic.
pub struct FakeIdentityResolver;

#[async_trait]
impl IdentityResolver for FakeIdentityResolver {
    async fn resolve_display_name(&self, user_id: &str) -> Result<String> {
        Ok(format!("user-{}", user_id))
    }
}

/// A fully wired registry backed by the in-memory store.
pub struct TestRegistry {
    pub packages: PackageService,
    pub api_keys: ApiKeyService,
    pub store: Arc<MemoryStore>,
    // Held for its Drop; the staging directory lives as long as the registry.
    _staging: TempDir,
}

impl TestRegistry {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let api_keys = ApiKeyService::new(store.clone());
        let staging = TempDir::new().expect("staging dir");
        let packages = PackageService::new(
            store.clone(),
            api_keys.clone(),
            Arc::new(FakeIdentityResolver),
            staging.path(),
        );
        Self {
            packages,
            api_keys,
            store,
            _staging: staging,
        }
    }

    /// Issue a key for `user_id` carrying the given scopes.
    pub async fn issue_key(&self, user_id: &str, scopes: Vec<ApiKeyScope>) -> ApiKeyCreated {
        self.api_keys
            .create_key(
                user_id,
                CreateApiKeyRequest {
                    label: None,
                    expires_days: None,
                    scopes,
                },
            )
            .await
            .expect("key creation")
    }

    /// Issue a key with both scopes.
    pub async fn issue_full_key(&self, user_id: &str) -> ApiKeyCreated {
        self.issue_key(user_id, vec![ApiKeyScope::Publish, ApiKeyScope::Yank])
            .await
    }
}

/// Build a gzip-compressed tar archive with the given files nested under a
/// single `package/` top-level directory, as publishing tools produce.
pub fn build_archive(files: &[(&str, &str)]) -> Bytes {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("package/{}", name), content.as_bytes())
            .expect("tar entry");
    }
    let tar_bytes = builder.into_inner().expect("tar finish");

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes).expect("gzip write");
    Bytes::from(encoder.finish().expect("gzip finish"))
}

/// A minimal valid archive: manifest with description `d` and keywords
/// `a`, `b`, plus a readme.
pub fn default_archive() -> Bytes {
    build_archive(&[
        (
            "Forge.toml",
            r#"
[package]
name = "foo_bar"
type = "lib"
version = "1.0.0"
description = "d"
keywords = ["a", "b"]
repository = "https://example.com/foo_bar"
"#,
        ),
        ("README.md", "# foo_bar\n"),
    ])
}

/// An archive with a manifest only (no readme) and no optional fields.
pub fn bare_archive() -> Bytes {
    build_archive(&[("Forge.toml", "[package]\nname = \"bare\"\n")])
}
