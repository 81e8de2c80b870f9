// src/overrides/pom.rs

//! POM version patching
//!
//! Rewrites `<dependency><version>` texts in cached POM files so that the
//! versions a later offline resolution sees agree with the forced-version
//! overrides. Both `<dependencies>` and `<dependencyManagement>` sections are
//! covered. Bracketed version ranges (`[1.0,2.0)`) are left alone: a range is
//! not a pin and overriding it would change resolution semantics.

use crate::error::{Error, Result};
use crate::overrides::OverrideSet;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One applied (or would-be, in dry-run) version rewrite
#[derive(Debug, Clone)]
pub struct PomChange {
    pub file: PathBuf,
    pub module: String,
    pub from: String,
    pub to: String,
}

/// Outcome of patching a cache directory
#[derive(Debug, Default)]
pub struct PatchReport {
    /// Number of POM files scanned
    pub scanned: usize,
    /// Files that were (or would be) rewritten
    pub modified: Vec<PathBuf>,
    /// Individual version rewrites
    pub changes: Vec<PomChange>,
    /// Files skipped because they could not be parsed
    pub skipped: Vec<PathBuf>,
}

/// Patch every `*.pom` file under `cache_dir` with the given overrides
pub fn patch_cache(cache_dir: &Path, overrides: &OverrideSet, dry_run: bool) -> Result<PatchReport> {
    if !cache_dir.is_dir() {
        return Err(Error::NotFoundError(format!(
            "Cache directory not found: {}",
            cache_dir.display()
        )));
    }

    let mut report = PatchReport::default();
    let mut pom_files = Vec::new();
    collect_pom_files(cache_dir, &mut pom_files)?;
    pom_files.sort();

    info!("Found {} POM files under {}", pom_files.len(), cache_dir.display());

    for pom_path in pom_files {
        report.scanned += 1;

        let content = fs::read_to_string(&pom_path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", pom_path.display(), e))
        })?;

        let (rewritten, changes) = match rewrite_pom(&content, overrides) {
            Ok(result) => result,
            Err(e) => {
                warn!("Skipping unparseable POM {}: {}", pom_path.display(), e);
                report.skipped.push(pom_path);
                continue;
            }
        };

        if changes.is_empty() {
            continue;
        }

        for (module, from, to) in &changes {
            debug!("{}: {} {} -> {}", pom_path.display(), module, from, to);
            report.changes.push(PomChange {
                file: pom_path.clone(),
                module: module.clone(),
                from: from.clone(),
                to: to.clone(),
            });
        }

        if !dry_run {
            write_atomically(&pom_path, rewritten.as_bytes())?;
        }
        report.modified.push(pom_path);
    }

    info!(
        "Patched {} of {} POM files ({} version rewrites{})",
        report.modified.len(),
        report.scanned,
        report.changes.len(),
        if dry_run { ", dry run" } else { "" }
    );

    Ok(report)
}

/// Recursively collect `*.pom` files
fn collect_pom_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_pom_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "pom") {
            out.push(path);
        }
    }
    Ok(())
}

/// Replace the file contents via a temp file in the same directory
fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::IoError(format!("No parent directory for {}", path.display()))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        Error::IoError(format!("Failed to create temp file in {}: {}", parent.display(), e))
    })?;
    temp.write_all(content)
        .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
    temp.persist(path)
        .map_err(|e| Error::IoError(format!("Failed to replace {}: {}", path.display(), e)))?;
    Ok(())
}

/// Rewrite dependency versions in a single POM document
///
/// Returns the rewritten XML and the list of (module, from, to) changes.
/// The document text is passed through untouched except for the replaced
/// version texts, so formatting and comments survive.
pub fn rewrite_pom(
    xml: &str,
    overrides: &OverrideSet,
) -> Result<(String, Vec<(String, String, String)>)> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut changes = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::ParseError(format!("XML error: {}", e)))?;

        match event {
            Event::Start(ref e) if e.local_name().as_ref() == b"dependency" => {
                let dep_events = buffer_dependency(&mut reader, event.clone().into_owned())?;
                let patched = patch_dependency(dep_events, overrides, &mut changes)?;
                for ev in patched {
                    writer
                        .write_event(ev)
                        .map_err(|e| Error::IoError(format!("XML write error: {}", e)))?;
                }
            }
            Event::Eof => break,
            other => {
                writer
                    .write_event(other)
                    .map_err(|e| Error::IoError(format!("XML write error: {}", e)))?;
            }
        }
        buf.clear();
    }

    let output = String::from_utf8(writer.into_inner())
        .map_err(|e| Error::ParseError(format!("Rewritten POM is not UTF-8: {}", e)))?;
    Ok((output, changes))
}

/// Collect all events of one `<dependency>` element, including its end tag
fn buffer_dependency(
    reader: &mut Reader<&[u8]>,
    start: Event<'static>,
) -> Result<Vec<Event<'static>>> {
    let mut events = vec![start];
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::ParseError(format!("XML error: {}", e)))?;

        match &event {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                if depth == 0 {
                    if e.local_name().as_ref() != b"dependency" {
                        return Err(Error::ParseError(format!(
                            "Unbalanced dependency element, closed by </{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        )));
                    }
                    events.push(event.into_owned());
                    return Ok(events);
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(Error::ParseError(
                    "Unexpected end of document inside <dependency>".to_string(),
                ));
            }
            _ => {}
        }
        events.push(event.into_owned());
        buf.clear();
    }
}

/// Apply overrides to one buffered `<dependency>` element
///
/// Works on the buffered form so the groupId / artifactId / version child
/// order does not matter. Only direct children of the dependency element are
/// considered, which keeps `<exclusions>` entries out of the match.
fn patch_dependency(
    mut events: Vec<Event<'static>>,
    overrides: &OverrideSet,
    changes: &mut Vec<(String, String, String)>,
) -> Result<Vec<Event<'static>>> {
    let mut depth = 0usize;
    let mut current_child: Option<Vec<u8>> = None;
    let mut group_id = None;
    let mut artifact_id = None;
    let mut version_text: Option<(usize, String)> = None;

    // First event is the <dependency> start itself
    for (idx, event) in events.iter().enumerate().skip(1) {
        match event {
            Event::Start(e) => {
                if depth == 0 {
                    current_child = Some(e.local_name().as_ref().to_vec());
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    current_child = None;
                }
            }
            Event::Text(t) if depth == 1 => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::ParseError(format!("XML text error: {}", e)))?
                    .to_string();
                match current_child.as_deref() {
                    Some(b"groupId") => group_id = Some(text),
                    Some(b"artifactId") => artifact_id = Some(text),
                    Some(b"version") => version_text = Some((idx, text)),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    if let (Some(group), Some(artifact), Some((idx, current))) =
        (group_id, artifact_id, version_text)
    {
        let module = format!("{}:{}", group, artifact);
        if let Some(forced) = overrides.pinned_version(&module) {
            // Version ranges are not pins; leave them alone
            let is_range = current.starts_with('[') || current.starts_with('(');
            if !is_range && current != forced {
                events[idx] = Event::Text(BytesText::new(forced).into_owned());
                changes.push((module, current, forced.to_string()));
            }
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <dependencies>
    <dependency>
      <groupId>org.jetbrains.kotlin</groupId>
      <artifactId>kotlin-stdlib</artifactId>
      <version>1.9.0</version>
    </dependency>
    <dependency>
      <groupId>androidx.collection</groupId>
      <artifactId>collection</artifactId>
      <version>1.4.0</version>
    </dependency>
  </dependencies>
</project>
"#;

    fn overrides(pins: &[&str]) -> OverrideSet {
        OverrideSet::new(pins.iter().map(|s| s.parse().unwrap()))
    }

    #[test]
    fn test_rewrites_matching_dependency() {
        let set = overrides(&["org.jetbrains.kotlin:kotlin-stdlib:2.1.0"]);
        let (output, changes) = rewrite_pom(POM, &set).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, "org.jetbrains.kotlin:kotlin-stdlib");
        assert_eq!(changes[0].1, "1.9.0");
        assert_eq!(changes[0].2, "2.1.0");
        assert!(output.contains("<version>2.1.0</version>"));
        // The other dependency is untouched
        assert!(output.contains("<version>1.4.0</version>"));
    }

    #[test]
    fn test_no_changes_without_match() {
        let set = overrides(&["some.other:lib:9.9"]);
        let (output, changes) = rewrite_pom(POM, &set).unwrap();
        assert!(changes.is_empty());
        assert!(output.contains("<version>1.9.0</version>"));
    }

    #[test]
    fn test_already_pinned_is_noop() {
        let set = overrides(&["org.jetbrains.kotlin:kotlin-stdlib:1.9.0"]);
        let (_, changes) = rewrite_pom(POM, &set).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_version_ranges_are_skipped() {
        let pom = r#"<project><dependencies><dependency>
            <groupId>a.b</groupId><artifactId>c</artifactId>
            <version>[1.0,2.0)</version>
        </dependency></dependencies></project>"#;
        let set = overrides(&["a.b:c:3.0"]);
        let (output, changes) = rewrite_pom(pom, &set).unwrap();
        assert!(changes.is_empty());
        assert!(output.contains("[1.0,2.0)"));
    }

    #[test]
    fn test_child_order_does_not_matter() {
        let pom = r#"<project><dependencies><dependency>
            <version>1.0</version>
            <artifactId>c</artifactId>
            <groupId>a.b</groupId>
        </dependency></dependencies></project>"#;
        let set = overrides(&["a.b:c:2.0"]);
        let (output, changes) = rewrite_pom(pom, &set).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(output.contains("<version>2.0</version>"));
    }

    #[test]
    fn test_exclusions_do_not_confuse_matching() {
        let pom = r#"<project><dependencies><dependency>
            <groupId>a.b</groupId>
            <artifactId>c</artifactId>
            <version>1.0</version>
            <exclusions><exclusion>
                <groupId>x.y</groupId>
                <artifactId>z</artifactId>
            </exclusion></exclusions>
        </dependency></dependencies></project>"#;
        // An override matching only the exclusion must not fire
        let set = overrides(&["x.y:z:9.0"]);
        let (_, changes) = rewrite_pom(pom, &set).unwrap();
        assert!(changes.is_empty());

        let set = overrides(&["a.b:c:2.0"]);
        let (_, changes) = rewrite_pom(pom, &set).unwrap();
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_dependency_management_is_covered() {
        let pom = r#"<project><dependencyManagement><dependencies><dependency>
            <groupId>a.b</groupId><artifactId>c</artifactId><version>1.0</version>
        </dependency></dependencies></dependencyManagement></project>"#;
        let set = overrides(&["a.b:c:2.0"]);
        let (output, changes) = rewrite_pom(pom, &set).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(output.contains("<version>2.0</version>"));
    }

    #[test]
    fn test_patch_cache_dry_run_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let pom_path = dir.path().join("nested").join("lib-1.0.pom");
        fs::create_dir_all(pom_path.parent().unwrap()).unwrap();
        fs::write(&pom_path, POM).unwrap();

        let set = overrides(&["org.jetbrains.kotlin:kotlin-stdlib:2.1.0"]);
        let report = patch_cache(dir.path(), &set, true).unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.modified.len(), 1);
        assert_eq!(report.changes.len(), 1);

        let on_disk = fs::read_to_string(&pom_path).unwrap();
        assert_eq!(on_disk, POM, "dry run must not modify files");
    }

    #[test]
    fn test_patch_cache_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let pom_path = dir.path().join("lib-1.0.pom");
        fs::write(&pom_path, POM).unwrap();

        let set = overrides(&["org.jetbrains.kotlin:kotlin-stdlib:2.1.0"]);
        let report = patch_cache(dir.path(), &set, false).unwrap();
        assert_eq!(report.modified.len(), 1);

        let on_disk = fs::read_to_string(&pom_path).unwrap();
        assert!(on_disk.contains("<version>2.1.0</version>"));
    }
}
