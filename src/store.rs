//! Storage collaborator interface.
//!
//! The relational store itself lives elsewhere; this module defines
//! the read/write contract the core needs, in the same trait-seam
//! style used for other external collaborators, plus an in-memory
//! implementation backing the test suites.

use crate::error::StoreError;
use crate::manifest::{
    DependencyCreate, DependencyImportance, IncompatibilityCreate, IncompatibilityImportance,
};
use crate::version::VersionConstraint;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Target platform of one stored build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    Ios,
    Android32,
    Android64,
    MacIntel,
    MacArm,
}

/// One persisted mod version, as the resolver sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub id: i64,
    pub mod_id: String,
    pub version: Version,
    pub platform: Platform,
    /// Engine version string this build targets.
    pub engine: String,
    /// Loader version this build was made for.
    pub loader: Version,
}

/// Stored dependency row: `dependent_id` requires `dependency_id`
/// under `constraint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRow {
    pub dependent_id: i64,
    pub dependency_id: String,
    pub constraint: VersionConstraint,
    pub importance: DependencyImportance,
}

/// Stored incompatibility row, owned by version `version_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompatibilityRow {
    pub version_id: i64,
    pub incompatibility_id: String,
    pub constraint: VersionConstraint,
    pub importance: IncompatibilityImportance,
}

/// Read/write contract against the version store.
///
/// Reads need no more than read-committed consistency. Row order must
/// be insertion order, which is manifest declaration order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Dependency rows for any of `version_ids`, in declaration order.
    async fn dependencies_for(&self, version_ids: &[i64])
    -> Result<Vec<DependencyRow>, StoreError>;

    /// Incompatibility rows for any of `version_ids`, in declaration
    /// order.
    async fn incompatibilities_for(
        &self,
        version_ids: &[i64],
    ) -> Result<Vec<IncompatibilityRow>, StoreError>;

    /// Incompatibility rows with importance `superseded` whose target
    /// is one of `mod_ids`.
    async fn superseding_rows(
        &self,
        mod_ids: &[String],
    ) -> Result<Vec<IncompatibilityRow>, StoreError>;

    /// Full version history of one mod.
    async fn versions_of(&self, mod_id: &str) -> Result<Vec<VersionRecord>, StoreError>;

    /// Look up a single version record.
    async fn version_record(&self, version_id: i64) -> Result<Option<VersionRecord>, StoreError>;

    /// Replace every dependency and incompatibility row of
    /// `version_id` with the given sets, atomically. A reader never
    /// observes a partial replacement.
    async fn replace_links(
        &self,
        version_id: i64,
        dependencies: &[DependencyCreate],
        incompatibilities: &[IncompatibilityCreate],
    ) -> Result<(), StoreError>;
}

/// In-memory store. A single lock around all tables makes
/// `replace_links` trivially atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    versions: Vec<VersionRecord>,
    dependencies: Vec<DependencyRow>,
    incompatibilities: Vec<IncompatibilityRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_version(&self, record: VersionRecord) {
        self.inner.lock().unwrap().versions.push(record);
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn dependencies_for(
        &self,
        version_ids: &[i64],
    ) -> Result<Vec<DependencyRow>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .dependencies
            .iter()
            .filter(|row| version_ids.contains(&row.dependent_id))
            .cloned()
            .collect())
    }

    async fn incompatibilities_for(
        &self,
        version_ids: &[i64],
    ) -> Result<Vec<IncompatibilityRow>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .incompatibilities
            .iter()
            .filter(|row| version_ids.contains(&row.version_id))
            .cloned()
            .collect())
    }

    async fn superseding_rows(
        &self,
        mod_ids: &[String],
    ) -> Result<Vec<IncompatibilityRow>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .incompatibilities
            .iter()
            .filter(|row| {
                row.importance == IncompatibilityImportance::Superseded
                    && mod_ids.contains(&row.incompatibility_id)
            })
            .cloned()
            .collect())
    }

    async fn versions_of(&self, mod_id: &str) -> Result<Vec<VersionRecord>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .versions
            .iter()
            .filter(|record| record.mod_id == mod_id)
            .cloned()
            .collect())
    }

    async fn version_record(&self, version_id: i64) -> Result<Option<VersionRecord>, StoreError> {
        let tables = self.inner.lock().unwrap();
        Ok(tables
            .versions
            .iter()
            .find(|record| record.id == version_id)
            .cloned())
    }

    async fn replace_links(
        &self,
        version_id: i64,
        dependencies: &[DependencyCreate],
        incompatibilities: &[IncompatibilityCreate],
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().unwrap();
        tables.dependencies.retain(|row| row.dependent_id != version_id);
        tables
            .incompatibilities
            .retain(|row| row.version_id != version_id);
        tables
            .dependencies
            .extend(dependencies.iter().map(|dep| DependencyRow {
                dependent_id: version_id,
                dependency_id: dep.dependency_id.clone(),
                constraint: dep.constraint.clone(),
                importance: dep.importance,
            }));
        tables
            .incompatibilities
            .extend(incompatibilities.iter().map(|inc| IncompatibilityRow {
                version_id,
                incompatibility_id: inc.incompatibility_id.clone(),
                constraint: inc.constraint.clone(),
                importance: inc.importance,
            }));
        Ok(())
    }
}
