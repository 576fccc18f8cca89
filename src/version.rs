//! Version constraints for dependency and incompatibility declarations.
//!
//! A constraint is a comparison operator plus a semantic version, or
//! the wildcard `*` which accepts any version. Rendering round-trips
//! the parsed form: `">=1.2.0"` renders back as `">=1.2.0"`, and `"*"`
//! renders as a bare `*`.

use crate::error::ApiError;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator for a version constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionCompare {
    #[serde(rename = "=")]
    Exact,
    #[serde(rename = ">")]
    More,
    #[serde(rename = ">=")]
    MoreEq,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessEq,
}

impl fmt::Display for VersionCompare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            VersionCompare::Exact => "=",
            VersionCompare::More => ">",
            VersionCompare::MoreEq => ">=",
            VersionCompare::Less => "<",
            VersionCompare::LessEq => "<=",
        };
        write!(f, "{}", op)
    }
}

/// An operator plus a version, or the wildcard accepting any version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    pub compare: VersionCompare,
    pub version: ConstraintTarget,
}

/// The version side of a constraint. `Any` is the parsed form of the
/// literal `*` and behaves as `>= 0.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintTarget {
    Version(Version),
    Any,
}

impl VersionConstraint {
    /// The wildcard constraint: matches every version.
    pub fn any() -> Self {
        VersionConstraint {
            compare: VersionCompare::MoreEq,
            version: ConstraintTarget::Any,
        }
    }

    /// Parse a constraint string.
    ///
    /// The literal `*` is the wildcard. Otherwise an optional operator
    /// prefix (`<=`, `>=`, `<`, `>`, `=`; two-character operators
    /// checked first) defaults to `>=`, an optional leading `v` is
    /// stripped, and the remainder must be a strict semantic version.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        if raw == "*" {
            return Ok(Self::any());
        }
        let (compare, rest) = split_operator(raw);
        let rest = rest.strip_prefix('v').unwrap_or(rest);
        let version = Version::parse(rest)
            .map_err(|_| ApiError::InvalidVersionString(raw.to_string()))?;
        Ok(VersionConstraint {
            compare,
            version: ConstraintTarget::Version(version),
        })
    }

    /// Whether `candidate` satisfies this constraint.
    pub fn matches(&self, candidate: &Version) -> bool {
        let version = match &self.version {
            ConstraintTarget::Any => return true,
            ConstraintTarget::Version(v) => v,
        };
        match self.compare {
            VersionCompare::Exact => candidate == version,
            VersionCompare::More => candidate > version,
            VersionCompare::MoreEq => candidate >= version,
            VersionCompare::Less => candidate < version,
            VersionCompare::LessEq => candidate <= version,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            ConstraintTarget::Any => write!(f, "*"),
            ConstraintTarget::Version(v) => write!(f, "{}{}", self.compare, v),
        }
    }
}

/// Longest-prefix operator match. `<=`/`>=` must be tried before their
/// one-character counterparts; no prefix means `>=`.
fn split_operator(raw: &str) -> (VersionCompare, &str) {
    if let Some(rest) = raw.strip_prefix("<=") {
        (VersionCompare::LessEq, rest)
    } else if let Some(rest) = raw.strip_prefix(">=") {
        (VersionCompare::MoreEq, rest)
    } else if let Some(rest) = raw.strip_prefix('=') {
        (VersionCompare::Exact, rest)
    } else if let Some(rest) = raw.strip_prefix('<') {
        (VersionCompare::Less, rest)
    } else if let Some(rest) = raw.strip_prefix('>') {
        (VersionCompare::More, rest)
    } else {
        (VersionCompare::MoreEq, raw)
    }
}
