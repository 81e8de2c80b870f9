// src/coordinate.rs

//! Artifact coordinates and deps-file parsing
//!
//! A coordinate identifies one distributable library unit by group, name,
//! version, and packaging. The textual form is the one used by Maven-style
//! fetch tools: `group:artifact:version[,type=packaging]`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Packaging type of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    /// Plain Java library (default)
    Jar,

    /// Android archive
    Aar,

    /// Project object model only
    Pom,

    /// Any other packaging string the fetch tool understands
    #[serde(untagged)]
    Other(String),
}

impl Packaging {
    pub fn as_str(&self) -> &str {
        match self {
            Packaging::Jar => "jar",
            Packaging::Aar => "aar",
            Packaging::Pom => "pom",
            Packaging::Other(s) => s,
        }
    }
}

impl FromStr for Packaging {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "" => Err("empty packaging type".to_string()),
            "jar" => Ok(Packaging::Jar),
            "aar" => Ok(Packaging::Aar),
            "pom" => Ok(Packaging::Pom),
            other => Ok(Packaging::Other(other.to_string())),
        }
    }
}

/// A fully pinned artifact coordinate
///
/// Immutable once declared: the warmer and manifest layers only ever read
/// these, never rewrite them in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    pub group: String,
    pub name: String,
    pub version: String,
    pub packaging: Packaging,
}

impl ArtifactCoordinate {
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            packaging: Packaging::Jar,
        }
    }

    /// The unversioned `group:artifact` key used for override and conflict lookups
    pub fn module_key(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }

    /// Relative path of this artifact in a Maven-layout repository
    ///
    /// `com.example:lib:1.2` becomes `com/example/lib/1.2/lib-1.2.jar`.
    pub fn repository_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for part in self.group.split('.') {
            path.push(part);
        }
        path.push(&self.name);
        path.push(&self.version);
        path.push(format!(
            "{}-{}.{}",
            self.name,
            self.version,
            self.packaging.as_str()
        ));
        path
    }

    /// File name of the artifact (last component of `repository_path`)
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.name,
            self.version,
            self.packaging.as_str()
        )
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)?;
        if self.packaging != Packaging::Jar {
            write!(f, ",type={}", self.packaging.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for ArtifactCoordinate {
    type Err = Error;

    /// Parse `group:artifact:version[,type=packaging]`
    fn from_str(s: &str) -> Result<Self> {
        let (coord, attrs) = match s.split_once(',') {
            Some((coord, attrs)) => (coord, Some(attrs)),
            None => (s, None),
        };

        let mut parts = coord.split(':');
        let (group, name, version) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(g), Some(n), Some(v), None) if !g.is_empty() && !n.is_empty() && !v.is_empty() => {
                (g, n, v)
            }
            _ => {
                return Err(Error::ParseError(format!(
                    "Invalid coordinate '{}': expected group:artifact:version",
                    s
                )));
            }
        };

        let mut packaging = Packaging::Jar;
        if let Some(attrs) = attrs {
            for attr in attrs.split(',') {
                match attr.split_once('=') {
                    Some(("type", value)) => {
                        packaging = value.parse().map_err(|e| {
                            Error::ParseError(format!("Invalid coordinate '{}': {}", s, e))
                        })?;
                    }
                    _ => {
                        return Err(Error::ParseError(format!(
                            "Invalid coordinate '{}': unknown attribute '{}'",
                            s, attr
                        )));
                    }
                }
            }
        }

        Ok(Self {
            group: group.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            packaging,
        })
    }
}

/// Parse a flat deps file into coordinates, preserving line order
///
/// Blank lines and lines starting with `#` or `//` are skipped.
pub fn parse_deps_file(path: &Path) -> Result<Vec<ArtifactCoordinate>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!("Failed to read deps file {}: {}", path.display(), e))
    })?;
    parse_deps_lines(&content)
}

/// Parse deps-file content (see `parse_deps_file`)
pub fn parse_deps_lines(content: &str) -> Result<Vec<ArtifactCoordinate>> {
    let mut coords = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        coords.push(line.parse()?);
    }
    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_coordinate() {
        let coord: ArtifactCoordinate = "org.jetbrains.kotlin:kotlin-stdlib:2.1.0"
            .parse()
            .unwrap();
        assert_eq!(coord.group, "org.jetbrains.kotlin");
        assert_eq!(coord.name, "kotlin-stdlib");
        assert_eq!(coord.version, "2.1.0");
        assert_eq!(coord.packaging, Packaging::Jar);
    }

    #[test]
    fn test_parse_coordinate_with_packaging() {
        let coord: ArtifactCoordinate = "androidx.emoji2:emoji2:1.4.0,type=aar".parse().unwrap();
        assert_eq!(coord.packaging, Packaging::Aar);
        assert_eq!(
            coord.to_string(),
            "androidx.emoji2:emoji2:1.4.0,type=aar"
        );
    }

    #[test]
    fn test_display_round_trips() {
        for s in [
            "a.b:c:1.0",
            "a.b:c:1.0,type=aar",
            "a.b:c:1.0,type=klib",
        ] {
            let coord: ArtifactCoordinate = s.parse().unwrap();
            assert_eq!(coord.to_string(), s);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("a.b:c".parse::<ArtifactCoordinate>().is_err());
        assert!("a.b:c:1.0:extra".parse::<ArtifactCoordinate>().is_err());
        assert!("::1.0".parse::<ArtifactCoordinate>().is_err());
        assert!("a.b:c:1.0,flavor=x".parse::<ArtifactCoordinate>().is_err());
        assert!("a.b:c:1.0,type=".parse::<ArtifactCoordinate>().is_err());
    }

    #[test]
    fn test_repository_path_layout() {
        let coord: ArtifactCoordinate = "androidx.collection:collection:1.5.0".parse().unwrap();
        assert_eq!(
            coord.repository_path(),
            PathBuf::from("androidx/collection/collection/1.5.0/collection-1.5.0.jar")
        );
    }

    #[test]
    fn test_module_key() {
        let coord = ArtifactCoordinate::new("a.b", "c", "1.0");
        assert_eq!(coord.module_key(), "a.b:c");
    }

    #[test]
    fn test_parse_deps_lines_skips_comments() {
        let content = "\n# comment\n// also a comment\na.b:c:1.0\n  d.e:f:2.0,type=aar  \n";
        let coords = parse_deps_lines(content).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[0].module_key(), "a.b:c");
        assert_eq!(coords[1].packaging, Packaging::Aar);
    }

    #[test]
    fn test_parse_deps_lines_propagates_errors() {
        assert!(parse_deps_lines("a.b:c:1.0\nnot-a-coordinate\n").is_err());
    }
}
