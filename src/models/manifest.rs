//! Package manifest (`Forge.toml`) types.

use serde::Deserialize;

/// Filename of the manifest expected at the root of an extracted archive.
pub const MANIFEST_FILE: &str = "Forge.toml";

/// Filename of the optional readme alongside the manifest.
pub const README_FILE: &str = "README.md";

/// Parsed package manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub package: ManifestPackage,
}

/// The `[package]` table of the manifest. All fields are optional; the
/// registry trusts the upload path parameters for name and version.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ManifestPackage {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub package_type: Option<PackageType>,
    pub compiler_version: Option<String>,
    pub authors: Option<Vec<String>>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub documentation: Option<String>,
    pub repository: Option<String>,
}

/// Kind of package a manifest declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Lib,
    Contract,
}
