// src/overrides/mod.rs

//! Forced-version overrides
//!
//! An override pins one `group:artifact` to a fixed version during both
//! manifest resolution and POM patching. Overrides are applied globally;
//! an override naming a coordinate that never appears in the input set is
//! inert (reported, never fatal).

pub mod pom;

use crate::coordinate::ArtifactCoordinate;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single forced pin: `group:artifact` fixed to `version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOverride {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl VersionOverride {
    pub fn module_key(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }
}

impl fmt::Display for VersionOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

impl FromStr for VersionOverride {
    type Err = Error;

    /// Parse `group:artifact:version`, the same shape a fetch tool's
    /// force-version flag takes
    fn from_str(s: &str) -> Result<Self> {
        let coord: ArtifactCoordinate = s.parse().map_err(|_| {
            Error::ParseError(format!(
                "Invalid version override '{}': expected group:artifact:version",
                s
            ))
        })?;
        Ok(Self {
            group: coord.group,
            name: coord.name,
            version: coord.version,
        })
    }
}

/// An override lookup table keyed by `group:artifact`
///
/// Stored in a BTreeMap so iteration (and anything rendered from it) is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct OverrideSet {
    pins: BTreeMap<String, String>,
}

impl OverrideSet {
    pub fn new(overrides: impl IntoIterator<Item = VersionOverride>) -> Self {
        let mut pins = BTreeMap::new();
        // Last declaration wins, matching CLI flag semantics
        for ov in overrides {
            pins.insert(ov.module_key(), ov.version);
        }
        Self { pins }
    }

    /// Look up the forced version for a `group:artifact` key
    pub fn pinned_version(&self, module_key: &str) -> Option<&str> {
        self.pins.get(module_key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Iterate pins as (`group:artifact`, version) in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pins.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Apply this set to a coordinate, returning a repinned copy when a
    /// matching override exists
    pub fn apply(&self, coord: &ArtifactCoordinate) -> ArtifactCoordinate {
        match self.pinned_version(&coord.module_key()) {
            Some(version) if version != coord.version => {
                let mut pinned = coord.clone();
                pinned.version = version.to_string();
                pinned
            }
            _ => coord.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        let ov: VersionOverride = "androidx.collection:collection:1.5.0".parse().unwrap();
        assert_eq!(ov.module_key(), "androidx.collection:collection");
        assert_eq!(ov.version, "1.5.0");
        assert_eq!(ov.to_string(), "androidx.collection:collection:1.5.0");
    }

    #[test]
    fn test_parse_override_rejects_malformed() {
        assert!("androidx.collection:collection".parse::<VersionOverride>().is_err());
        assert!("".parse::<VersionOverride>().is_err());
    }

    #[test]
    fn test_last_declaration_wins() {
        let set = OverrideSet::new([
            "a.b:c:1.0".parse().unwrap(),
            "a.b:c:2.0".parse().unwrap(),
        ]);
        assert_eq!(set.pinned_version("a.b:c"), Some("2.0"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_apply_repins_matching_coordinate() {
        let set = OverrideSet::new(["a.b:c:2.0".parse().unwrap()]);
        let coord = ArtifactCoordinate::new("a.b", "c", "1.0");
        assert_eq!(set.apply(&coord).version, "2.0");

        let untouched = ArtifactCoordinate::new("a.b", "other", "1.0");
        assert_eq!(set.apply(&untouched).version, "1.0");
    }
}
