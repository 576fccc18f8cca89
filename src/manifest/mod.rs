//! The package manifest: one `mod.json` plus what the archive itself
//! reveals (platform payloads, about/changelog texts, logo).
//!
//! A manifest is built once per uploaded archive and never edited in
//! place; a new version of a mod is a new manifest.

mod deps;
mod parse;
mod validate;

pub use deps::{
    DependencyCreate, DependencyImportance, IncompatibilityCreate, IncompatibilityImportance,
};

use deps::DeclarationSet;

use serde::{Deserialize, Serialize};

/// Name of the manifest entry inside a package archive.
pub const MANIFEST_ENTRY: &str = "mod.json";

/// External links a mod may declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ModLinks {
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Parsed and enriched description of one package version.
///
/// Fields not present in `mod.json` itself (`hash`, `download_url`,
/// platform flags derived from payload names, `logo`, `about`,
/// `changelog`) are filled in by [`ModManifest::from_archive`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModManifest {
    /// Loader version this mod was built against.
    #[serde(default)]
    pub loader: String,
    /// Mod version, with any leading `v` already stripped.
    #[serde(default)]
    pub version: String,
    /// Dotted `developer.mod` identifier.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub developers: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub windows: bool,
    #[serde(default)]
    pub ios: bool,
    #[serde(default)]
    pub android32: bool,
    #[serde(default)]
    pub android64: bool,
    #[serde(default)]
    pub mac_intel: bool,
    #[serde(default)]
    pub mac_arm: bool,
    /// Normalized download URL (trailing path separators stripped).
    #[serde(default)]
    pub download_url: String,
    /// Hex-encoded SHA-256 of the exact archive bytes as uploaded.
    #[serde(default)]
    pub hash: String,
    #[serde(default, rename = "early-load")]
    pub early_load: bool,
    /// Opaque API sub-manifest; passed through untouched.
    #[serde(default)]
    pub api: Option<serde_json::Value>,
    /// Engine version block; structured but opaque to this core.
    #[serde(default)]
    pub engine: serde_json::Value,
    /// Normalized PNG bytes of `logo.png`, or empty when the caller
    /// chose not to retain them.
    #[serde(skip)]
    pub logo: Vec<u8>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub changelog: Option<String>,
    /// Dependency declarations as written in `mod.json`, either shape.
    /// Normalized into [`ModManifest::dependencies`] during ingestion;
    /// kept so the manifest serializes back in its original form.
    #[serde(default, rename = "dependencies")]
    raw_dependencies: Option<DeclarationSet<DependencyImportance>>,
    /// Incompatibility declarations as written; see `raw_dependencies`.
    #[serde(default, rename = "incompatibilities")]
    raw_incompatibilities: Option<DeclarationSet<IncompatibilityImportance>>,
    /// Canonical dependency sequence, in declaration order. A bad
    /// constraint rejects the archive before a manifest exists.
    #[serde(skip)]
    pub dependencies: Vec<DependencyCreate>,
    /// Canonical incompatibility sequence, in declaration order.
    #[serde(skip)]
    pub incompatibilities: Vec<IncompatibilityCreate>,
    #[serde(default)]
    pub links: Option<ModLinks>,
}

impl ModManifest {
    /// Normalize the raw declaration blocks into the canonical fields.
    /// Called once at the end of ingestion; fails the whole parse on
    /// an unparseable constraint.
    fn normalize_declarations(&mut self) -> Result<(), crate::error::ApiError> {
        self.dependencies = deps::normalize_dependencies(self.raw_dependencies.as_ref())?;
        self.incompatibilities =
            deps::normalize_incompatibilities(self.raw_incompatibilities.as_ref())?;
        Ok(())
    }
}
