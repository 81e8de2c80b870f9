// src/buck.rs

//! Buck build-rule generation
//!
//! Turns a flat deps file into `android_library` dependency labels and
//! appends the rule to an existing BUCK file. Labels point at the prebuilt
//! targets laid out under the library directory:
//! `//libs/com/example/lib:lib` for `com.example:lib:1.2`.

use crate::coordinate::{self, ArtifactCoordinate};
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Build the Buck label for one coordinate
///
/// The version is dropped: prebuilt targets are unversioned, the checked-in
/// artifact under the label's directory is whatever the warm cache holds.
pub fn dependency_label(lib_dir: &str, coord: &ArtifactCoordinate) -> String {
    let lib_dir = lib_dir.trim_end_matches('/');
    let group_path = coord.group.replace('.', "/");
    format!("//{}/{}/{}:{}", lib_dir, group_path, coord.name, coord.name)
}

/// Render the `android_library` rule with the given dependency labels
pub fn render_android_library(labels: &[String]) -> String {
    let mut rule = String::from(
        "\nandroid_library(\n    name = \"lib\",\n    srcs = glob([\"src/main/java/**/*.java\", \"src/main/java/**/*.kt\"]),\n    deps = [\n        \":res\",\n",
    );
    for label in labels {
        rule.push_str(&format!("        \"{}\",\n", label));
    }
    rule.push_str("    ],\n)\n");
    rule
}

/// Validate inputs, generate labels from the deps file, and append the rule
///
/// `project_root` is the directory the generated labels are relative to;
/// `lib_dir` must be a relative subdirectory of it. Nothing is written until
/// every precondition holds.
pub fn append_android_library(
    project_root: &Path,
    deps_file: &Path,
    lib_dir: &str,
    buck_file: &Path,
) -> Result<Vec<String>> {
    if !deps_file.is_file() {
        return Err(Error::NotFoundError(format!(
            "Deps file not found: {}",
            deps_file.display()
        )));
    }
    if !buck_file.is_file() {
        return Err(Error::NotFoundError(format!(
            "BUCK file not found: {}",
            buck_file.display()
        )));
    }
    if Path::new(lib_dir).is_absolute() {
        return Err(Error::InvalidInput(format!(
            "'{}' must be a relative path under {}",
            lib_dir,
            project_root.display()
        )));
    }
    if !project_root.join(lib_dir).is_dir() {
        return Err(Error::InvalidInput(format!(
            "'{}' is not a subdirectory of '{}'",
            lib_dir,
            project_root.display()
        )));
    }

    let coords = coordinate::parse_deps_file(deps_file)?;
    let labels: Vec<String> = coords
        .iter()
        .map(|coord| dependency_label(lib_dir, coord))
        .collect();

    let rule = render_android_library(&labels);
    let mut file = OpenOptions::new().append(true).open(buck_file)?;
    file.write_all(rule.as_bytes())?;

    info!(
        "Appended android_library rule with {} deps to {}",
        labels.len(),
        buck_file.display()
    );
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_dependency_label() {
        let coord: ArtifactCoordinate = "androidx.lifecycle:lifecycle-runtime:2.9.2"
            .parse()
            .unwrap();
        assert_eq!(
            dependency_label("app/libs", &coord),
            "//app/libs/androidx/lifecycle/lifecycle-runtime:lifecycle-runtime"
        );
        // Trailing slash is tolerated
        assert_eq!(
            dependency_label("app/libs/", &coord),
            "//app/libs/androidx/lifecycle/lifecycle-runtime:lifecycle-runtime"
        );
    }

    #[test]
    fn test_render_rule_embeds_labels() {
        let rule = render_android_library(&["//libs/a/b:b".to_string()]);
        assert!(rule.contains("android_library("));
        assert!(rule.contains("\":res\","));
        assert!(rule.contains("\"//libs/a/b:b\","));
    }

    #[test]
    fn test_append_android_library() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("libs")).unwrap();
        let deps = root.path().join("libs/external_deps.txt");
        fs::write(&deps, "a.b:c:1.0\nd.e:f:2.0\n").unwrap();
        let buck = root.path().join("BUCK");
        fs::write(&buck, "# existing rules\n").unwrap();

        let labels =
            append_android_library(root.path(), &deps, "libs", &buck).unwrap();
        assert_eq!(labels, vec!["//libs/a/b/c:c", "//libs/d/e/f:f"]);

        let content = fs::read_to_string(&buck).unwrap();
        assert!(content.starts_with("# existing rules\n"));
        assert!(content.contains("\"//libs/a/b/c:c\","));
    }

    #[test]
    fn test_preconditions_block_writes() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("libs")).unwrap();
        let deps = root.path().join("libs/external_deps.txt");
        fs::write(&deps, "a.b:c:1.0\n").unwrap();
        let buck = root.path().join("BUCK");
        fs::write(&buck, "").unwrap();

        // Missing deps file
        let missing = root.path().join("nope.txt");
        assert!(append_android_library(root.path(), &missing, "libs", &buck).is_err());

        // Absolute lib dir
        assert!(append_android_library(root.path(), &deps, "/abs/libs", &buck).is_err());

        // Lib dir not under project root
        assert!(append_android_library(root.path(), &deps, "other", &buck).is_err());

        // Missing BUCK file
        let no_buck = root.path().join("NOBUCK");
        assert!(append_android_library(root.path(), &deps, "libs", &no_buck).is_err());

        // BUCK untouched by the failed attempts
        assert_eq!(fs::read_to_string(&buck).unwrap(), "");
    }
}
