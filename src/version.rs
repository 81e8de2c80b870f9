// src/version.rs

//! Lenient version ordering for Maven-style version strings
//!
//! Maven versions are not semver: `1.4` and `2.9.2-alpha01` are both common.
//! `LenientVersion` pads missing components and parses through semver where
//! possible, falling back to a plain string comparison for anything semver
//! cannot represent. This is only used to order versions (for conflict
//! suggestions); equality of pins is always exact string equality.

use semver::Version;
use std::cmp::Ordering;

/// A version string with a best-effort semver interpretation attached
#[derive(Debug, Clone)]
pub struct LenientVersion {
    raw: String,
    parsed: Option<Version>,
}

impl LenientVersion {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            parsed: lenient_semver(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for LenientVersion {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for LenientVersion {}

impl PartialOrd for LenientVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LenientVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.parsed, &other.parsed) {
            (Some(a), Some(b)) => a.cmp(b),
            // Parseable versions order above unparseable ones
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

/// Pick the highest of a non-empty set of version strings
pub fn highest<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<String> {
    versions
        .into_iter()
        .map(LenientVersion::parse)
        .max()
        .map(|v| v.raw)
}

/// Parse a Maven-style version through semver, padding missing components
///
/// `1.4` is read as `1.4.0`, `2` as `2.0.0`. A `-suffix` is carried over as a
/// semver pre-release. Returns None for anything else (range syntax, letters
/// in numeric positions).
fn lenient_semver(raw: &str) -> Option<Version> {
    let (core, pre) = match raw.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (raw, None),
    };

    let mut numbers = Vec::with_capacity(3);
    for part in core.split('.') {
        numbers.push(part.parse::<u64>().ok()?);
    }
    if numbers.is_empty() || numbers.len() > 3 {
        return None;
    }
    while numbers.len() < 3 {
        numbers.push(0);
    }

    let padded = match pre {
        Some(pre) => format!("{}.{}.{}-{}", numbers[0], numbers[1], numbers[2], pre),
        None => format!("{}.{}.{}", numbers[0], numbers[1], numbers[2]),
    };

    Version::parse(&padded).ok()
}
