//! Dependency and incompatibility declarations.
//!
//! Two manifest shapes are accepted indefinitely: the legacy ordered
//! list of `{id, version, importance}` objects, and the keyed map from
//! mod id to either a bare version string or a `{version, importance}`
//! object. Both shapes normalize into the same canonical sequences at
//! the parse boundary; the raw shape never leaves this module.

use crate::error::ApiError;
use crate::version::VersionConstraint;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// How strongly a mod wants its dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyImportance {
    Suggested,
    Recommended,
    #[default]
    Required,
}

/// How severe an incompatibility is. `Superseded` marks the target as
/// replaced by the declaring mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IncompatibilityImportance {
    #[default]
    Breaking,
    Conflicting,
    Superseded,
}

/// One entry of the legacy list shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "I: Deserialize<'de> + Default"))]
pub(crate) struct LegacyDeclaration<I> {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub importance: I,
}

/// Raw declaration block as it appears in `mod.json`: either the
/// legacy list or the keyed map. Keyed-map entries keep manifest order
/// (serde_json is built with `preserve_order`). Deserialization-only
/// plumbing; consumers see the canonical sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, bound(deserialize = "I: Deserialize<'de> + Default"))]
pub(crate) enum DeclarationSet<I> {
    Legacy(Vec<LegacyDeclaration<I>>),
    Keyed(serde_json::Map<String, serde_json::Value>),
}

/// Keyed-map value: a bare version string, or an object carrying the
/// version and an optional importance.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, bound(deserialize = "I: Deserialize<'de> + Default"))]
enum KeyedValue<I> {
    Version(String),
    Detailed {
        version: String,
        #[serde(default)]
        importance: I,
    },
}

/// Canonical dependency declaration, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCreate {
    pub dependency_id: String,
    pub constraint: VersionConstraint,
    pub importance: DependencyImportance,
}

/// Canonical incompatibility declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompatibilityCreate {
    pub incompatibility_id: String,
    pub constraint: VersionConstraint,
    pub importance: IncompatibilityImportance,
}

/// A literal `"*"` maps straight to the wildcard constraint without
/// going through the generic parser. Same observable result, but the
/// wildcard is a policy, not a parse.
fn constraint_of(raw: &str) -> Result<VersionConstraint, ApiError> {
    if raw == "*" {
        Ok(VersionConstraint::any())
    } else {
        VersionConstraint::parse(raw)
    }
}

fn normalize<I>(set: &DeclarationSet<I>) -> Result<Vec<(String, VersionConstraint, I)>, ApiError>
where
    I: Copy + Default + DeserializeOwned,
{
    let mut out = Vec::new();
    match set {
        DeclarationSet::Legacy(entries) => {
            for entry in entries {
                out.push((
                    entry.id.clone(),
                    constraint_of(&entry.version)?,
                    entry.importance,
                ));
            }
        }
        DeclarationSet::Keyed(map) => {
            for (id, value) in map {
                let value: KeyedValue<I> = serde_json::from_value(value.clone())
                    .map_err(|e| ApiError::BadRequest(format!("Invalid entry for {}: {}", id, e)))?;
                let (version, importance) = match value {
                    KeyedValue::Version(v) => (v, I::default()),
                    KeyedValue::Detailed {
                        version,
                        importance,
                    } => (version, importance),
                };
                out.push((id.clone(), constraint_of(&version)?, importance));
            }
        }
    }
    Ok(out)
}

/// Normalize a raw dependency block into the canonical sequence,
/// preserving declaration order. Missing importance defaults to
/// `required`.
pub(crate) fn normalize_dependencies(
    set: Option<&DeclarationSet<DependencyImportance>>,
) -> Result<Vec<DependencyCreate>, ApiError> {
    let Some(set) = set else {
        return Ok(Vec::new());
    };
    Ok(normalize(set)?
        .into_iter()
        .map(|(id, constraint, importance)| DependencyCreate {
            dependency_id: id,
            constraint,
            importance,
        })
        .collect())
}

/// Normalize a raw incompatibility block. Missing importance defaults
/// to `breaking`.
pub(crate) fn normalize_incompatibilities(
    set: Option<&DeclarationSet<IncompatibilityImportance>>,
) -> Result<Vec<IncompatibilityCreate>, ApiError> {
    let Some(set) = set else {
        return Ok(Vec::new());
    };
    Ok(normalize(set)?
        .into_iter()
        .map(|(id, constraint, importance)| IncompatibilityCreate {
            incompatibility_id: id,
            constraint,
            importance,
        })
        .collect())
}
