//! End-to-end lifecycle tests over the in-memory store: publish, duplicate
//! handling, version ordering, yank visibility, downloads and authorization.

mod common;

use bytes::Bytes;
use common::{bare_archive, build_archive, default_archive, TestRegistry, GZIP};
use forge_registry::error::AppError;
use forge_registry::models::api_key::ApiKeyScope;

fn archive_for(name: &str, version: &str) -> Bytes {
    build_archive(&[(
        "Forge.toml",
        &format!(
            "[package]\nname = \"{}\"\nversion = \"{}\"\ndescription = \"d\"\nkeywords = [\"a\", \"b\"]\n",
            name, version
        ),
    )])
}

#[tokio::test]
async fn publish_persists_package_version_and_manifest_metadata() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect("publish");

    let detail = registry
        .packages
        .get_version("foo_bar", "1.0.0")
        .await
        .expect("stored version");
    assert_eq!(detail.summary.version, "1.0.0");
    assert!(!detail.summary.is_yanked);
    assert!(detail.summary.size_kb > 0.0);
    assert_eq!(detail.owner_display_name, "user-7");
    assert_eq!(detail.description.as_deref(), Some("d"));
    assert_eq!(detail.tags.as_deref(), Some("a, b"));
    assert_eq!(
        detail.repository.as_deref(),
        Some("https://example.com/foo_bar")
    );
    assert!(detail.readme.as_deref().unwrap_or("").contains("foo_bar"));
}

#[tokio::test]
async fn publish_trims_surrounding_whitespace_from_the_name() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    registry
        .packages
        .publish("  foo_bar  ", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect("publish");

    registry
        .packages
        .get_version("foo_bar", "1.0.0")
        .await
        .expect("stored under the trimmed name");
}

#[tokio::test]
async fn duplicate_version_is_rejected_and_nothing_extra_is_stored() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect("first publish");

    let err = registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect_err("second publish of the same version");
    assert!(matches!(err, AppError::Conflict(_)));

    let versions = registry
        .packages
        .all_versions("foo_bar")
        .await
        .expect("versions");
    assert_eq!(versions.len(), 1);
}

#[tokio::test]
async fn latest_version_follows_semver_order_not_publish_order() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    for version in ["2.0.0", "1.5.0"] {
        registry
            .packages
            .publish("foo_bar", version, archive_for("foo_bar", version), GZIP, &key.key)
            .await
            .expect("publish");
    }

    let latest = registry
        .packages
        .latest_version("foo_bar")
        .await
        .expect("latest");
    assert_eq!(latest.version, "2.0.0");

    let versions = registry
        .packages
        .all_versions("foo_bar")
        .await
        .expect("versions");
    let order: Vec<_> = versions.iter().map(|v| v.version.as_str()).collect();
    assert_eq!(order, ["2.0.0", "1.5.0"]);
}

#[tokio::test]
async fn prerelease_sorts_below_its_release() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    for version in ["1.2.0", "2.0.0", "1.2.0-beta"] {
        registry
            .packages
            .publish("foo_bar", version, archive_for("foo_bar", version), GZIP, &key.key)
            .await
            .expect("publish");
    }

    let versions = registry
        .packages
        .all_versions("foo_bar")
        .await
        .expect("versions");
    let order: Vec<_> = versions.iter().map(|v| v.version.as_str()).collect();
    assert_eq!(order, ["2.0.0", "1.2.0", "1.2.0-beta"]);
}

#[tokio::test]
async fn yanked_only_version_hides_the_package_from_listings() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect("publish");
    registry
        .packages
        .yank("foo_bar", "1.0.0", &key.key)
        .await
        .expect("yank");

    let listings = registry
        .packages
        .list_packages(None)
        .await
        .expect("listing");
    assert!(listings.is_empty());

    let versions = registry
        .packages
        .all_versions("foo_bar")
        .await
        .expect("versions");
    assert!(versions.is_empty());

    let err = registry
        .packages
        .latest_version("foo_bar")
        .await
        .expect_err("no visible version left");
    assert!(matches!(err, AppError::NotFound(_)));

    // The owner still sees their own package, yanked or not.
    let mine = registry
        .packages
        .user_packages("7")
        .await
        .expect("user packages");
    assert_eq!(mine.len(), 1);
    assert!(mine[0].versions[0].is_yanked);
}

#[tokio::test]
async fn yank_is_idempotent() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect("publish");

    registry
        .packages
        .yank("foo_bar", "1.0.0", &key.key)
        .await
        .expect("first yank");
    registry
        .packages
        .yank("foo_bar", "1.0.0", &key.key)
        .await
        .expect("repeated yank succeeds");
}

#[tokio::test]
async fn yank_of_unknown_package_or_version_reads_as_unauthorized() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    let err = registry
        .packages
        .yank("ghost", "1.0.0", &key.key)
        .await
        .expect_err("unknown package");
    assert!(matches!(err, AppError::Unauthorized(_)));

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect("publish");
    let err = registry
        .packages
        .yank("foo_bar", "9.9.9", &key.key)
        .await
        .expect_err("unknown version");
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn download_returns_bytes_and_records_the_download() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;
    let archive = default_archive();

    registry
        .packages
        .publish("foo_bar", "1.0.0", archive.clone(), GZIP, &key.key)
        .await
        .expect("publish");

    let payload = registry
        .packages
        .download("foo_bar", "1.0.0", false)
        .await
        .expect("download");
    assert_eq!(payload.file_name, "foo_bar-1.0.0");
    assert_eq!(payload.data, archive.to_vec());

    let count = registry
        .packages
        .package_download_count("foo_bar")
        .await
        .expect("count");
    assert_eq!(count, 1);

    let history = registry
        .packages
        .version_download_history("foo_bar", "1.0.0")
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn yanked_version_downloads_only_when_explicitly_requested() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect("publish");
    registry
        .packages
        .yank("foo_bar", "1.0.0", &key.key)
        .await
        .expect("yank");

    let err = registry
        .packages
        .download("foo_bar", "1.0.0", false)
        .await
        .expect_err("yanked version is hidden by default");
    assert!(matches!(err, AppError::NotFound(_)));

    // The refused attempt must not leave a download record behind.
    let count = registry
        .packages
        .package_download_count("foo_bar")
        .await
        .expect("count");
    assert_eq!(count, 0);

    registry
        .packages
        .download("foo_bar", "1.0.0", true)
        .await
        .expect("explicit yanked download");
    let count = registry
        .packages
        .package_download_count("foo_bar")
        .await
        .expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn all_downloads_reports_entries_with_totals() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &key.key)
        .await
        .expect("publish");
    for _ in 0..3 {
        registry
            .packages
            .download("foo_bar", "1.0.0", false)
            .await
            .expect("download");
    }

    let (entries, total) = registry
        .packages
        .list_all_downloads(true)
        .await
        .expect("all downloads");
    assert_eq!(total, 3);
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.package == "foo_bar"));
}

#[tokio::test]
async fn publish_requires_the_publish_scope() {
    let registry = TestRegistry::new();
    let yank_only = registry.issue_key("7", vec![ApiKeyScope::Yank]).await;

    let err = registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &yank_only.key)
        .await
        .expect_err("yank-scoped key cannot publish");
    assert!(matches!(err, AppError::Unauthorized(_)));

    let listings = registry
        .packages
        .list_packages(None)
        .await
        .expect("listing");
    assert!(listings.is_empty());
}

#[tokio::test]
async fn yank_requires_the_yank_scope() {
    let registry = TestRegistry::new();
    let publish_only = registry.issue_key("7", vec![ApiKeyScope::Publish]).await;

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &publish_only.key)
        .await
        .expect("publish");

    let err = registry
        .packages
        .yank("foo_bar", "1.0.0", &publish_only.key)
        .await
        .expect_err("publish-scoped key cannot yank");
    assert!(matches!(err, AppError::Unauthorized(_)));

    let versions = registry
        .packages
        .all_versions("foo_bar")
        .await
        .expect("versions");
    assert!(!versions[0].is_yanked);
}

#[tokio::test]
async fn only_the_owner_may_publish_new_versions() {
    let registry = TestRegistry::new();
    let owner = registry.issue_full_key("7").await;
    let intruder = registry.issue_full_key("8").await;

    registry
        .packages
        .publish("foo_bar", "1.0.0", default_archive(), GZIP, &owner.key)
        .await
        .expect("publish");

    let err = registry
        .packages
        .publish(
            "foo_bar",
            "2.0.0",
            archive_for("foo_bar", "2.0.0"),
            GZIP,
            &intruder.key,
        )
        .await
        .expect_err("non-owner publish");
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = registry
        .packages
        .yank("foo_bar", "1.0.0", &intruder.key)
        .await
        .expect_err("non-owner yank");
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn unknown_api_key_is_rejected_before_any_validation() {
    let registry = TestRegistry::new();

    // Invalid name and invalid key together: authorization loses nothing
    // by going first, and the caller learns only that the key is bad.
    let err = registry
        .packages
        .publish("con", "not-a-version", default_archive(), GZIP, "no-such-key")
        .await
        .expect_err("unknown key");
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn reserved_and_malformed_names_are_rejected() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    for name in ["con", "Foo", "_edge", "a-b", "x__y"] {
        let err = registry
            .packages
            .publish(name, "1.0.0", default_archive(), GZIP, &key.key)
            .await
            .expect_err("invalid name");
        assert!(matches!(err, AppError::Validation(_)), "name {:?}", name);
    }

    let listings = registry
        .packages
        .list_packages(None)
        .await
        .expect("listing");
    assert!(listings.is_empty());
}

#[tokio::test]
async fn invalid_semver_is_rejected() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    let err = registry
        .packages
        .publish("foo_bar", "1.0", default_archive(), GZIP, &key.key)
        .await
        .expect_err("not full semver");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn archive_content_checks_reject_bad_uploads() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    let err = registry
        .packages
        .publish("foo_bar", "1.0.0", Bytes::new(), GZIP, &key.key)
        .await
        .expect_err("empty body");
    assert!(matches!(err, AppError::Validation(_)));

    let err = registry
        .packages
        .publish(
            "foo_bar",
            "1.0.0",
            default_archive(),
            "application/zip",
            &key.key,
        )
        .await
        .expect_err("wrong content type");
    assert!(matches!(err, AppError::Validation(_)));

    let err = registry
        .packages
        .publish(
            "foo_bar",
            "1.0.0",
            Bytes::from(vec![0u8; 11 * 1024 * 1024]),
            GZIP,
            &key.key,
        )
        .await
        .expect_err("oversized body");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn archive_without_a_manifest_leaves_no_trace() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    let archive = build_archive(&[("src/main.fr", "fn main() {}\n")]);
    let err = registry
        .packages
        .publish("foo_bar", "1.0.0", archive, GZIP, &key.key)
        .await
        .expect_err("manifest missing");
    assert!(matches!(
        err,
        AppError::ManifestParse(_) | AppError::Extraction(_)
    ));

    let listings = registry
        .packages
        .list_packages(None)
        .await
        .expect("listing");
    assert!(listings.is_empty());
}

#[tokio::test]
async fn manifest_without_optional_fields_is_accepted() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    registry
        .packages
        .publish("bare", "0.1.0", bare_archive(), GZIP, &key.key)
        .await
        .expect("publish");

    let detail = registry
        .packages
        .get_version("bare", "0.1.0")
        .await
        .expect("stored version");
    assert_eq!(detail.description, None);
    assert_eq!(detail.tags, None);
    assert_eq!(detail.readme, None);
}

#[tokio::test]
async fn listing_limit_caps_the_number_of_packages() {
    let registry = TestRegistry::new();
    let key = registry.issue_full_key("7").await;

    for i in 0..4 {
        let name = format!("pkg_{}", i);
        registry
            .packages
            .publish(&name, "1.0.0", archive_for(&name, "1.0.0"), GZIP, &key.key)
            .await
            .expect("publish");
    }

    let listings = registry
        .packages
        .list_packages(Some(2))
        .await
        .expect("listing");
    assert_eq!(listings.len(), 2);

    let listings = registry
        .packages
        .list_packages(None)
        .await
        .expect("listing");
    assert_eq!(listings.len(), 4);
    assert!(listings.iter().all(|l| l.latest.summary.version == "1.0.0"));
}
