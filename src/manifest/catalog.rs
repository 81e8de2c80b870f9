// src/manifest/catalog.rs

//! Gradle-style version catalog parsing
//!
//! A catalog is a TOML file with a `[versions]` table of named version
//! strings and a `[libraries]` table whose entries name a module either as
//! `module = "group:artifact"` or as separate `group` / `name` keys, with a
//! version given inline (`version = "1.2"`) or by reference
//! (`version.ref = "kotlin"`). Library entries without any version are
//! catalog-managed elsewhere (BOM imports) and are skipped here, matching
//! the behavior of the build that consumes the same file.

use crate::coordinate::ArtifactCoordinate;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Version of a library entry: inline string or `{ ref = "name" }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum VersionSpec {
    Inline(String),
    Reference {
        #[serde(rename = "ref")]
        reference: String,
    },
}

/// One `[libraries]` entry
#[derive(Debug, Clone, Deserialize)]
struct LibrarySpec {
    module: Option<String>,
    group: Option<String>,
    name: Option<String>,
    version: Option<VersionSpec>,
}

/// Raw TOML shape of the catalog file
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    versions: BTreeMap<String, String>,
    #[serde(default)]
    libraries: toml::map::Map<String, toml::Value>,
}

/// A parsed version catalog
#[derive(Debug)]
pub struct Catalog {
    coordinates: Vec<ArtifactCoordinate>,
    /// Library aliases skipped because they carry no version
    skipped: Vec<String>,
}

impl Catalog {
    /// Load and flatten a catalog from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse catalog content, preserving `[libraries]` declaration order
    pub fn parse(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| Error::ParseError(format!("Invalid version catalog: {}", e)))?;

        let mut coordinates = Vec::new();
        let mut skipped = Vec::new();

        for (alias, value) in &file.libraries {
            let spec: LibrarySpec = value.clone().try_into().map_err(|e| {
                Error::ParseError(format!("Invalid library entry '{}': {}", alias, e))
            })?;

            let (group, name) = match (&spec.module, &spec.group, &spec.name) {
                (Some(module), _, _) => match module.split_once(':') {
                    Some((g, a)) if !g.is_empty() && !a.is_empty() => {
                        (g.to_string(), a.to_string())
                    }
                    _ => {
                        return Err(Error::ParseError(format!(
                            "Invalid module '{}' in library entry '{}'",
                            module, alias
                        )));
                    }
                },
                (None, Some(group), Some(name)) => (group.clone(), name.clone()),
                _ => {
                    return Err(Error::ParseError(format!(
                        "Library entry '{}' needs either 'module' or 'group'+'name'",
                        alias
                    )));
                }
            };

            let version = match &spec.version {
                Some(VersionSpec::Inline(v)) => v.clone(),
                Some(VersionSpec::Reference { reference }) => {
                    file.versions.get(reference).cloned().ok_or_else(|| {
                        Error::ParseError(format!(
                            "Library entry '{}' references unknown version '{}'",
                            alias, reference
                        ))
                    })?
                }
                None => {
                    debug!("Skipping library entry '{}' without a version", alias);
                    skipped.push(alias.clone());
                    continue;
                }
            };

            coordinates.push(ArtifactCoordinate::new(group, name, version));
        }

        Ok(Self {
            coordinates,
            skipped,
        })
    }

    /// Declared coordinates, in catalog order
    pub fn coordinates(&self) -> &[ArtifactCoordinate] {
        &self.coordinates
    }

    /// Library aliases that had no version and were skipped
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[versions]
kotlin = "2.1.0"
lifecycle = "2.9.2"

[libraries]
kotlin-stdlib = { module = "org.jetbrains.kotlin:kotlin-stdlib", version.ref = "kotlin" }
lifecycle-runtime = { module = "androidx.lifecycle:lifecycle-runtime", version.ref = "lifecycle" }
collection = { group = "androidx.collection", name = "collection", version = "1.5.0" }
compose-bom-managed = { module = "androidx.compose.ui:ui" }
"#;

    #[test]
    fn test_parse_flattens_versions() {
        let catalog = Catalog::parse(CATALOG).unwrap();
        let coords = catalog.coordinates();

        assert_eq!(coords.len(), 3);
        let stdlib = coords
            .iter()
            .find(|c| c.name == "kotlin-stdlib")
            .expect("kotlin-stdlib present");
        assert_eq!(stdlib.version, "2.1.0");

        let collection = coords
            .iter()
            .find(|c| c.name == "collection")
            .expect("collection present");
        assert_eq!(collection.group, "androidx.collection");
        assert_eq!(collection.version, "1.5.0");
    }

    #[test]
    fn test_versionless_entries_are_skipped() {
        let catalog = Catalog::parse(CATALOG).unwrap();
        assert_eq!(catalog.skipped(), &["compose-bom-managed".to_string()]);
    }

    #[test]
    fn test_unknown_version_ref_is_an_error() {
        let content = r#"
[libraries]
broken = { module = "a.b:c", version.ref = "nope" }
"#;
        let err = Catalog::parse(content).unwrap_err();
        assert!(err.to_string().contains("nope"), "got: {}", err);
    }

    #[test]
    fn test_malformed_module_is_an_error() {
        let content = r#"
[libraries]
broken = { module = "no-colon-here", version = "1.0" }
"#;
        assert!(Catalog::parse(content).is_err());
    }

    #[test]
    fn test_entry_without_module_or_group_name_is_an_error() {
        let content = r#"
[libraries]
broken = { version = "1.0" }
"#;
        assert!(Catalog::parse(content).is_err());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::parse("").unwrap();
        assert!(catalog.coordinates().is_empty());
    }
}
