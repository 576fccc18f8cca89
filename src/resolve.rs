//! Dependency graph resolution.
//!
//! Given a set of stored version ids, answer which mods each of them
//! depends on or conflicts with, resolved one hop against the version
//! store. Callers build transitive closures by feeding the returned
//! target version ids back in; this module never recurses on its own.

use crate::error::{ApiError, Result};
use crate::manifest::{DependencyImportance, IncompatibilityImportance};
use crate::store::{Platform, VersionRecord, VersionStore};
use crate::version::VersionConstraint;
use log::error;
use semver::Version;
use serde::Serialize;
use std::collections::HashMap;

/// Optional filters narrowing which stored target versions may
/// participate in resolution. Every supplied filter must match; an
/// unset filter matches everything. The filters constrain candidate
/// targets, never the requesting version.
#[derive(Debug, Clone, Default)]
pub struct ResolveFilters {
    pub platform: Option<Platform>,
    pub engine: Option<String>,
    pub loader: Option<Version>,
}

impl ResolveFilters {
    pub fn none() -> Self {
        Self::default()
    }

    fn matches(&self, record: &VersionRecord) -> bool {
        self.platform.is_none_or(|p| p == record.platform)
            && self
                .engine
                .as_deref()
                .is_none_or(|engine| engine == record.engine)
            && self
                .loader
                .as_ref()
                .is_none_or(|loader| *loader == record.loader)
    }
}

/// One resolved dependency edge. `target_version_id` is the best
/// stored version of the target satisfying the declared constraint
/// and the query filters; feed it back in for transitive expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub source_version_id: i64,
    pub target_version_id: i64,
    pub mod_id: String,
    pub constraint: VersionConstraint,
    pub importance: DependencyImportance,
}

/// One resolved incompatibility edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIncompatibility {
    pub source_version_id: i64,
    pub target_version_id: i64,
    pub mod_id: String,
    pub constraint: VersionConstraint,
    pub importance: IncompatibilityImportance,
}

/// Display-ready dependency edge for API consumers: the version field
/// is the rendered requirement (`>=1.2.0`, or a bare `*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseDependency {
    pub mod_id: String,
    pub version: String,
    pub importance: DependencyImportance,
}

/// Display-ready incompatibility edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseIncompatibility {
    pub mod_id: String,
    pub version: String,
    pub importance: IncompatibilityImportance,
}

impl ResolvedDependency {
    pub fn to_response(&self) -> ResponseDependency {
        ResponseDependency {
            mod_id: self.mod_id.clone(),
            version: self.constraint.to_string(),
            importance: self.importance,
        }
    }
}

impl ResolvedIncompatibility {
    pub fn to_response(&self) -> ResponseIncompatibility {
        ResponseIncompatibility {
            mod_id: self.mod_id.clone(),
            version: self.constraint.to_string(),
            importance: self.importance,
        }
    }
}

/// A superseded mod and the version that replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub superseded_id: String,
    pub mod_id: String,
    pub version: Version,
    pub version_id: i64,
}

/// Both edge lists of one resolved version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEdges {
    pub dependencies: Vec<ResolvedDependency>,
    pub incompatibilities: Vec<ResolvedIncompatibility>,
}

/// Resolve dependency and incompatibility edges for every requested
/// version in one call. Each list keeps its manifest declaration
/// order.
pub async fn resolve(
    store: &dyn VersionStore,
    version_ids: &[i64],
    filters: &ResolveFilters,
) -> Result<HashMap<i64, ResolvedEdges>> {
    let mut dependencies = resolve_dependencies(store, version_ids, filters).await?;
    let mut incompatibilities = resolve_incompatibilities(store, version_ids, filters).await?;

    Ok(version_ids
        .iter()
        .map(|id| {
            (
                *id,
                ResolvedEdges {
                    dependencies: dependencies.remove(id).unwrap_or_default(),
                    incompatibilities: incompatibilities.remove(id).unwrap_or_default(),
                },
            )
        })
        .collect())
}

/// Resolve the dependencies of each requested version, one hop deep.
///
/// A version with no stored dependency rows maps to an empty list.
/// Any storage failure aborts the whole batch; callers never receive
/// a partial mapping.
pub async fn resolve_dependencies(
    store: &dyn VersionStore,
    version_ids: &[i64],
    filters: &ResolveFilters,
) -> Result<HashMap<i64, Vec<ResolvedDependency>>> {
    let rows = store.dependencies_for(version_ids).await.map_err(|e| {
        error!("fetching dependency rows failed: {}", e);
        ApiError::from(e)
    })?;

    let mut resolved: HashMap<i64, Vec<ResolvedDependency>> = version_ids
        .iter()
        .map(|id| (*id, Vec::new()))
        .collect();
    let mut candidates = CandidateCache::new(store);

    for row in rows {
        let Some(target) = candidates
            .best_match(&row.dependency_id, &row.constraint, filters)
            .await?
        else {
            continue;
        };
        resolved
            .entry(row.dependent_id)
            .or_default()
            .push(ResolvedDependency {
                source_version_id: row.dependent_id,
                target_version_id: target.id,
                mod_id: row.dependency_id,
                constraint: row.constraint,
                importance: row.importance,
            });
    }
    Ok(resolved)
}

/// Resolve the incompatibilities of each requested version, one hop
/// deep. Same batch and ordering semantics as
/// [`resolve_dependencies`].
pub async fn resolve_incompatibilities(
    store: &dyn VersionStore,
    version_ids: &[i64],
    filters: &ResolveFilters,
) -> Result<HashMap<i64, Vec<ResolvedIncompatibility>>> {
    let rows = store.incompatibilities_for(version_ids).await.map_err(|e| {
        error!("fetching incompatibility rows failed: {}", e);
        ApiError::from(e)
    })?;

    let mut resolved: HashMap<i64, Vec<ResolvedIncompatibility>> = version_ids
        .iter()
        .map(|id| (*id, Vec::new()))
        .collect();
    let mut candidates = CandidateCache::new(store);

    for row in rows {
        let Some(target) = candidates
            .best_match(&row.incompatibility_id, &row.constraint, filters)
            .await?
        else {
            continue;
        };
        resolved
            .entry(row.version_id)
            .or_default()
            .push(ResolvedIncompatibility {
                source_version_id: row.version_id,
                target_version_id: target.id,
                mod_id: row.incompatibility_id,
                constraint: row.constraint,
                importance: row.importance,
            });
    }
    Ok(resolved)
}

/// Map each of `mod_ids` to the version that supersedes it, if any.
///
/// Only incompatibility rows marked `superseded` participate. The
/// replacement is the declaring mod's own version, must be a
/// different mod than the superseded one, and must match the filters.
/// When several versions qualify the highest semver wins; equal
/// versions fall back to the highest version id.
pub async fn resolve_supersedes(
    store: &dyn VersionStore,
    mod_ids: &[String],
    filters: &ResolveFilters,
) -> Result<HashMap<String, Replacement>> {
    let rows = store.superseding_rows(mod_ids).await.map_err(|e| {
        error!("fetching supersede rows failed: {}", e);
        ApiError::from(e)
    })?;

    let mut replacements: HashMap<String, Replacement> = HashMap::new();
    for row in rows {
        let record = store.version_record(row.version_id).await.map_err(|e| {
            error!("fetching version record {} failed: {}", row.version_id, e);
            ApiError::from(e)
        })?;
        let Some(record) = record else { continue };
        if record.mod_id == row.incompatibility_id || !filters.matches(&record) {
            continue;
        }

        let candidate = Replacement {
            superseded_id: row.incompatibility_id.clone(),
            mod_id: record.mod_id,
            version: record.version,
            version_id: record.id,
        };
        match replacements.get(&row.incompatibility_id) {
            Some(current) if !supersede_wins(&candidate, current) => {}
            _ => {
                replacements.insert(row.incompatibility_id, candidate);
            }
        }
    }
    Ok(replacements)
}

/// Deterministic supersede tie-break: higher version, then higher id.
fn supersede_wins(candidate: &Replacement, current: &Replacement) -> bool {
    (&candidate.version, candidate.version_id) > (&current.version, current.version_id)
}

/// Format the canonical download link for one mod version.
pub fn create_download_link(base_url: &str, mod_id: &str, version: &Version) -> String {
    format!(
        "{}/v1/mods/{}/versions/{}/download",
        base_url, mod_id, version
    )
}

/// Per-query cache of target version histories, so a batch that
/// mentions the same mod many times fetches it once.
struct CandidateCache<'a> {
    store: &'a dyn VersionStore,
    histories: HashMap<String, Vec<VersionRecord>>,
}

impl<'a> CandidateCache<'a> {
    fn new(store: &'a dyn VersionStore) -> Self {
        Self {
            store,
            histories: HashMap::new(),
        }
    }

    /// Best stored version of `mod_id` matching constraint + filters:
    /// highest version, then highest id.
    async fn best_match(
        &mut self,
        mod_id: &str,
        constraint: &VersionConstraint,
        filters: &ResolveFilters,
    ) -> Result<Option<VersionRecord>> {
        if !self.histories.contains_key(mod_id) {
            let history = self.store.versions_of(mod_id).await.map_err(|e| {
                error!("fetching versions of {} failed: {}", mod_id, e);
                ApiError::from(e)
            })?;
            self.histories.insert(mod_id.to_string(), history);
        }
        Ok(self.histories[mod_id]
            .iter()
            .filter(|record| filters.matches(record) && constraint.matches(&record.version))
            .max_by(|a, b| (&a.version, a.id).cmp(&(&b.version, b.id)))
            .cloned())
    }
}
