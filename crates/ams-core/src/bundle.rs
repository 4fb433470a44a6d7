//! Installed-bundle lookup and admission policy.
//!
//! The bundle manager is an external collaborator; the orchestrator only
//! consumes a `query_ability_info(want)` lookup from it. Both seams are
//! traits so deployments (and tests) inject their own implementations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::want::Want;

/// Result of an installed-bundle lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityInfo {
    /// Owning bundle identifier.
    pub bundle_name: String,
    /// Launch artifact path.
    pub src_path: String,
}

/// Installed-bundle lookup collaborator.
pub trait BundleRegistry: Send + Sync {
    /// Resolves the install info for the want's target bundle.
    fn query_ability_info(&self, want: &Want) -> Option<AbilityInfo>;
}

/// Admission check consulted before an application task is created.
///
/// Only the pass/fail outcome matters to the orchestrator; policy content is
/// out of scope.
pub trait AdmissionPolicy: Send + Sync {
    /// Whether the bundle may be brought to the foreground.
    fn check(&self, bundle_name: &str) -> bool;
}

/// Admission policy accepting every bundle.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AdmissionPolicy for AllowAll {
    fn check(&self, _bundle_name: &str) -> bool {
        true
    }
}

/// Admission policy rejecting an explicit set of bundles.
#[derive(Debug, Default)]
pub struct DenyList {
    denied: Vec<String>,
}

impl DenyList {
    /// Creates a deny list from bundle names.
    #[must_use]
    pub fn new(denied: Vec<String>) -> Self {
        Self { denied }
    }
}

impl AdmissionPolicy for DenyList {
    fn check(&self, bundle_name: &str) -> bool {
        !self.denied.iter().any(|d| d == bundle_name)
    }
}

/// In-memory bundle table mapping bundle name to launch path.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StaticBundleRegistry {
    bundles: HashMap<String, String>,
}

impl StaticBundleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bundle.
    pub fn insert(&mut self, bundle_name: impl Into<String>, src_path: impl Into<String>) {
        self.bundles.insert(bundle_name.into(), src_path.into());
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_bundle(mut self, bundle_name: impl Into<String>, src_path: impl Into<String>) -> Self {
        self.insert(bundle_name, src_path);
        self
    }

    /// Parses a `{"bundle": "path", ...}` JSON table.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let bundles: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { bundles })
    }
}

impl BundleRegistry for StaticBundleRegistry {
    fn query_ability_info(&self, want: &Want) -> Option<AbilityInfo> {
        let bundle_name = want.bundle_name()?;
        self.bundles.get(bundle_name).map(|path| AbilityInfo {
            bundle_name: bundle_name.to_string(),
            src_path: path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::want::ElementName;

    #[test]
    fn test_static_registry_lookup() {
        let registry = StaticBundleRegistry::new().with_bundle("com.example.music", "/apps/music");

        let want = Want::new(ElementName::new("com.example.music", "Main"));
        let info = registry.query_ability_info(&want).unwrap();
        assert_eq!(info.bundle_name, "com.example.music");
        assert_eq!(info.src_path, "/apps/music");

        let missing = Want::new(ElementName::new("com.example.video", ""));
        assert!(registry.query_ability_info(&missing).is_none());
    }

    #[test]
    fn test_registry_from_json() {
        let registry =
            StaticBundleRegistry::from_json(r#"{"com.example.a": "/apps/a"}"#).unwrap();
        let want = Want::new(ElementName::new("com.example.a", ""));
        assert!(registry.query_ability_info(&want).is_some());

        assert!(StaticBundleRegistry::from_json("not json").is_err());
    }

    #[test]
    fn test_deny_list() {
        let policy = DenyList::new(vec!["com.example.blocked".into()]);
        assert!(!policy.check("com.example.blocked"));
        assert!(policy.check("com.example.music"));
        assert!(AllowAll.check("com.example.blocked"));
    }
}
