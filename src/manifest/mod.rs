// src/manifest/mod.rs

//! Dependency manifest resolution
//!
//! Takes the declared coordinate set (usually flattened from a version
//! catalog), applies forced-version overrides, and produces a deterministic
//! pinned manifest: exactly one version per `group:artifact`. Two different
//! declared versions for the same coordinate without an override resolving
//! the pin is a version-conflict error naming the offending coordinate.
//!
//! This is deliberately not a transitive resolver. The build tool that
//! consumes the manifest does transitive resolution; this layer only
//! validates and pins what is declared.

pub mod catalog;

pub use catalog::Catalog;

use crate::coordinate::ArtifactCoordinate;
use crate::error::{Error, Result};
use crate::overrides::OverrideSet;
use crate::version;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::{debug, warn};

/// A fully pinned, conflict-free dependency manifest
#[derive(Debug)]
pub struct Manifest {
    coordinates: Vec<ArtifactCoordinate>,
    /// Overrides that matched nothing in the declared set
    inert_overrides: Vec<String>,
    /// Coordinates whose declared version was replaced by an override
    repinned: Vec<String>,
}

impl Manifest {
    /// Resolve a declared coordinate set under a set of overrides
    ///
    /// Output order follows first declaration of each `group:artifact`.
    /// Duplicate declarations of the same pin collapse to one entry.
    pub fn resolve(declared: &[ArtifactCoordinate], overrides: &OverrideSet) -> Result<Self> {
        let mut order: Vec<String> = Vec::new();
        let mut pinned: BTreeMap<String, ArtifactCoordinate> = BTreeMap::new();
        let mut declared_versions: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut repinned = Vec::new();

        for coord in declared {
            let key = coord.module_key();
            let versions = declared_versions.entry(key.clone()).or_default();
            if !versions.contains(&coord.version) {
                versions.push(coord.version.clone());
            }

            let effective = overrides.apply(coord);
            if effective.version != coord.version {
                debug!(
                    "Override repins {} from {} to {}",
                    key, coord.version, effective.version
                );
            }

            match pinned.get(&key) {
                None => {
                    order.push(key);
                    pinned.insert(coord.module_key(), effective);
                }
                Some(existing) if existing.version == effective.version => {}
                Some(existing) => {
                    let mut versions = declared_versions.remove(&key).unwrap_or_default();
                    if !versions.contains(&existing.version) {
                        versions.push(existing.version.clone());
                    }
                    let suggested = version::highest(versions.iter().map(|v| v.as_str()))
                        .unwrap_or_else(|| effective.version.clone());
                    return Err(Error::VersionConflict {
                        coordinate: key,
                        versions,
                        suggested,
                    });
                }
            }
        }

        for (key, versions) in &declared_versions {
            if versions.len() > 1 {
                repinned.push(key.clone());
            }
        }

        let mut inert_overrides = Vec::new();
        for (key, version) in overrides.iter() {
            if !declared_versions.contains_key(key) {
                warn!("Override {}:{} matches no declared coordinate", key, version);
                inert_overrides.push(format!("{}:{}", key, version));
            }
        }

        let coordinates = order
            .iter()
            .map(|key| pinned[key].clone())
            .collect();

        Ok(Self {
            coordinates,
            inert_overrides,
            repinned,
        })
    }

    /// Pinned coordinates in first-declaration order
    pub fn coordinates(&self) -> &[ArtifactCoordinate] {
        &self.coordinates
    }

    /// Overrides that matched no declared coordinate
    pub fn inert_overrides(&self) -> &[String] {
        &self.inert_overrides
    }

    /// Module keys whose conflicting declarations an override resolved
    pub fn repinned(&self) -> &[String] {
        &self.repinned
    }

    /// Render as a flat deps file, one `group:artifact:version` per line
    pub fn render_deps(&self) -> String {
        let mut out = String::new();
        for coord in &self.coordinates {
            let _ = writeln!(out, "{}", coord);
        }
        out
    }
}
