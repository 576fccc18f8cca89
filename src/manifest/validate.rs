//! Structural validation of a parsed manifest. Pure checks, applied
//! in a fixed order, short-circuiting on the first failure.

use crate::error::ApiError;
use crate::manifest::ModManifest;
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;
use url::Url;

static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_\-]+\.[a-z0-9_\-]+$").unwrap());

/// Maximum length of a mod id.
const MAX_ID_LENGTH: usize = 64;

impl ModManifest {
    /// Validate the manifest's structural invariants.
    ///
    /// Order: id format, id length, developer presence, version
    /// semver validity, link URLs. The first failing check wins.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !ID_REGEX.is_match(&self.id) {
            return Err(ApiError::BadRequest(format!(
                "Invalid mod id {} (lowercase and numbers only, needs to look like 'dev.mod')",
                self.id
            )));
        }
        if self.id.len() > MAX_ID_LENGTH {
            return Err(ApiError::BadRequest(
                "Mod id too long (max 64 characters)".to_string(),
            ));
        }
        if !self.has_developer() {
            return Err(ApiError::BadRequest(
                "No developer specified on mod.json".to_string(),
            ));
        }
        if Version::parse(&self.version).is_err() {
            return Err(ApiError::InvalidVersionString(self.version.clone()));
        }
        if let Some(links) = &self.links {
            let entries = [
                ("community", &links.community),
                ("homepage", &links.homepage),
                ("source", &links.source),
            ];
            for (key, value) in entries {
                if let Some(link) = value
                    && let Err(e) = Url::parse(link)
                {
                    return Err(ApiError::BadRequest(format!(
                        "Invalid {} URL: {}. Reason: {}",
                        key, link, e
                    )));
                }
            }
        }
        Ok(())
    }

    fn has_developer(&self) -> bool {
        let single = self.developer.as_deref().is_some_and(|d| !d.is_empty());
        let multiple = self.developers.as_deref().is_some_and(|d| !d.is_empty());
        single || multiple
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ModLinks;

    fn valid_manifest() -> ModManifest {
        ModManifest {
            id: "dev.mod".to_string(),
            name: "Mod".to_string(),
            version: "1.0.0".to_string(),
            developer: Some("dev".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_well_formed_manifest() {
        assert!(valid_manifest().validate().is_ok());
    }

    #[test]
    fn accepts_ids_with_underscore_and_dash() {
        let mut manifest = valid_manifest();
        manifest.id = "some_dev.my-mod_2".to_string();
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn rejects_uppercase_id() {
        let mut manifest = valid_manifest();
        manifest.id = "Dev.Mod".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid mod id"));
    }

    #[test]
    fn rejects_id_without_separator() {
        let mut manifest = valid_manifest();
        manifest.id = "devmod".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn rejects_overlong_id() {
        let mut manifest = valid_manifest();
        manifest.id = format!("dev.{}", "m".repeat(64));
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn rejects_missing_developer() {
        let mut manifest = valid_manifest();
        manifest.developer = None;
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("No developer"));

        // An empty list is as good as none.
        manifest.developers = Some(vec![]);
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn developers_list_satisfies_presence() {
        let mut manifest = valid_manifest();
        manifest.developer = None;
        manifest.developers = Some(vec!["a".to_string(), "b".to_string()]);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn rejects_non_semver_version() {
        let mut manifest = valid_manifest();
        manifest.version = "1.0".to_string();
        let err = manifest.validate().unwrap_err();
        assert_eq!(err.kind(), "InvalidVersionString");
    }

    #[test]
    fn rejects_bad_link_url() {
        let mut manifest = valid_manifest();
        manifest.links = Some(ModLinks {
            homepage: Some("not a url".to_string()),
            ..Default::default()
        });
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid homepage URL"));
    }

    #[test]
    fn unset_links_are_fine() {
        let mut manifest = valid_manifest();
        manifest.links = Some(ModLinks {
            source: Some("https://github.com/dev/mod".to_string()),
            ..Default::default()
        });
        assert!(manifest.validate().is_ok());
    }
}
