// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use prewarm::coordinate;
use prewarm::db;
use prewarm::db::models::{Run, record_report};
use prewarm::manifest::{Catalog, Manifest};
use prewarm::overrides::{OverrideSet, VersionOverride, pom};
use prewarm::repository::RepositorySource;
use prewarm::warmer::direct::DirectFetcher;
use prewarm::warmer::tool::{FetchConfig, ToolFetcher};
use prewarm::warmer::{CacheWarmer, Fetcher, WarmStatus};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "prewarm")]
#[command(author, version, about = "Artifact cache warmer and dependency manifest tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten a version catalog into a flat deps file
    Deps {
        /// Path to the version catalog (libs.versions.toml)
        catalog: String,
        /// Output deps file; appended to, created if missing (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Validate a version catalog for version conflicts
    Check {
        /// Path to the version catalog (libs.versions.toml)
        catalog: String,
        /// Forced version pin, group:artifact:version (repeatable)
        #[arg(short = 'f', long = "force-version")]
        force_version: Vec<VersionOverride>,
        /// Emit the resolved manifest as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch every artifact in a deps file into the local cache
    Warm {
        /// Path to the flat deps file
        deps: String,
        /// Repository source, local path or URL; order is search order (repeatable)
        #[arg(short, long = "repo")]
        repo: Vec<RepositorySource>,
        /// Forced version pin, group:artifact:version (repeatable)
        #[arg(short = 'f', long = "force-version")]
        force_version: Vec<VersionOverride>,
        /// External fetch tool; built-in resolver is used if omitted
        #[arg(short, long)]
        tool: Option<String>,
        /// Working directory for the external tool
        #[arg(long)]
        working_dir: Option<String>,
        /// Environment variable for the external tool, KEY=VALUE (repeatable)
        #[arg(long = "env", value_parser = parse_env_var)]
        env: Vec<(String, String)>,
        /// Cache directory for the built-in resolver
        #[arg(short, long, default_value = "artifact-cache")]
        cache_dir: String,
        /// Record the run in a ledger database at this path
        #[arg(short, long)]
        ledger: Option<String>,
        /// Emit the warm report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show past warm runs from a ledger
    History {
        /// Ledger database path
        #[arg(short, long, default_value = "prewarm.db")]
        ledger: String,
        /// Number of runs to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
    },
    /// Apply forced version pins to cached POM files
    PatchPoms {
        /// Cache directory to scan for *.pom files
        #[arg(short, long)]
        cache_dir: String,
        /// Forced version pin, group:artifact:version (repeatable, at least one)
        #[arg(short = 'f', long = "force-version", required = true)]
        force_version: Vec<VersionOverride>,
        /// Report changes without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Append an android_library rule for a deps file to a BUCK file
    Targets {
        /// Path to the flat deps file
        deps: String,
        /// Library directory the labels point into, relative to the project root
        #[arg(short = 'd', long)]
        lib_dir: String,
        /// BUCK file to append the rule to
        #[arg(short, long)]
        buck_file: String,
        /// Project root directory
        #[arg(long, default_value = ".")]
        project_root: String,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Parse a KEY=VALUE pair for --env
fn parse_env_var(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid KEY=VALUE pair: '{}'", s)),
    }
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Deps { catalog, output }) => {
            let catalog = Catalog::load(catalog.as_ref())?;
            let mut lines = String::new();
            for coord in catalog.coordinates() {
                lines.push_str(&coord.to_string());
                lines.push('\n');
            }

            match output {
                Some(path) => {
                    let path = PathBuf::from(path);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
                    file.write_all(lines.as_bytes())?;
                    println!(
                        "Wrote {} dependencies to {}",
                        catalog.coordinates().len(),
                        path.display()
                    );
                }
                None => print!("{}", lines),
            }
            if !catalog.skipped().is_empty() {
                info!(
                    "Skipped {} versionless entries: {}",
                    catalog.skipped().len(),
                    catalog.skipped().join(", ")
                );
            }
            Ok(())
        }
        Some(Commands::Check {
            catalog,
            force_version,
            json,
        }) => {
            let catalog = Catalog::load(catalog.as_ref())?;
            let overrides = OverrideSet::new(force_version);
            let manifest = Manifest::resolve(catalog.coordinates(), &overrides)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&manifest.coordinates())?
                );
            } else {
                println!(
                    "OK: {} dependencies, no version conflicts",
                    manifest.coordinates().len()
                );
                for key in manifest.repinned() {
                    println!("  repinned by override: {}", key);
                }
                for inert in manifest.inert_overrides() {
                    println!("  inert override: {}", inert);
                }
            }
            Ok(())
        }
        Some(Commands::Warm {
            deps,
            repo,
            force_version,
            tool,
            working_dir,
            env,
            cache_dir,
            ledger,
            json,
        }) => {
            let declared = coordinate::parse_deps_file(deps.as_ref())?;
            let overrides = OverrideSet::new(force_version);

            // Conflict validation before the first fetch
            let manifest = Manifest::resolve(&declared, &overrides)?;
            let coordinates = manifest.coordinates();

            let fetcher: Box<dyn Fetcher> = match tool {
                Some(tool) => {
                    let mut config = FetchConfig::new(tool);
                    config.repositories = repo;
                    config.overrides = overrides;
                    config.working_dir = working_dir.map(PathBuf::from);
                    config.env = env;
                    Box::new(ToolFetcher::new(config))
                }
                None => Box::new(DirectFetcher::new(repo, cache_dir)?),
            };

            let mut ledger_state = match &ledger {
                Some(path) => {
                    let conn = db::open_or_init(path)?;
                    let mut run = Run::new(coordinates.len() as i64);
                    run.insert(&conn)?;
                    Some((conn, run))
                }
                None => None,
            };

            let report = CacheWarmer::new(fetcher.as_ref()).run(coordinates);

            if let Some((conn, run)) = &mut ledger_state {
                record_report(conn, run, &report)?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for entry in report.fetched() {
                    println!("Fetched {}", entry.coordinate);
                }
                match &report.status {
                    WarmStatus::Completed => {
                        println!("All {} artifacts fetched", report.fetched_count());
                    }
                    WarmStatus::Aborted { coordinate, reason } => {
                        println!("FAILED {}: {}", coordinate, reason);
                    }
                }
            }

            report.into_result()?;
            Ok(())
        }
        Some(Commands::History { ledger, limit }) => {
            let conn = db::open(&ledger)?;
            let runs = Run::list_recent(&conn, limit)?;

            if runs.is_empty() {
                println!("No recorded runs");
                return Ok(());
            }

            for run in runs {
                println!(
                    "#{} {} {} ({}/{} fetched)",
                    run.id.unwrap_or(0),
                    run.started_at,
                    run.status.as_str(),
                    run.fetched,
                    run.total,
                );
            }
            Ok(())
        }
        Some(Commands::PatchPoms {
            cache_dir,
            force_version,
            dry_run,
        }) => {
            let overrides = OverrideSet::new(force_version);
            let report = pom::patch_cache(cache_dir.as_ref(), &overrides, dry_run)?;

            for change in &report.changes {
                println!(
                    "{}: {} {} -> {}",
                    change.file.display(),
                    change.module,
                    change.from,
                    change.to
                );
            }
            println!(
                "{} {} of {} POM files ({} skipped)",
                if dry_run { "Would patch" } else { "Patched" },
                report.modified.len(),
                report.scanned,
                report.skipped.len()
            );
            Ok(())
        }
        Some(Commands::Targets {
            deps,
            lib_dir,
            buck_file,
            project_root,
        }) => {
            let labels = prewarm::buck::append_android_library(
                project_root.as_ref(),
                deps.as_ref(),
                &lib_dir,
                buck_file.as_ref(),
            )?;
            println!(
                "Appended android_library rule with {} deps to {}",
                labels.len(),
                buck_file
            );
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "prewarm", &mut std::io::stdout());
            Ok(())
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_var() {
        assert_eq!(
            parse_env_var("COURSIER_CREDENTIALS=user:pass").unwrap(),
            ("COURSIER_CREDENTIALS".to_string(), "user:pass".to_string())
        );
        // Values may contain '='
        assert_eq!(
            parse_env_var("KEY=a=b").unwrap(),
            ("KEY".to_string(), "a=b".to_string())
        );
        assert!(parse_env_var("NOVALUE").is_err());
        assert!(parse_env_var("=value").is_err());
    }

    #[test]
    fn test_cli_parses_warm_flags() {
        let cli = Cli::parse_from([
            "prewarm",
            "warm",
            "deps.txt",
            "--repo",
            "/local/mirror",
            "--repo",
            "https://maven.google.com",
            "--force-version",
            "a.b:c:1.0",
            "--ledger",
            "ledger.db",
        ]);

        match cli.command {
            Some(Commands::Warm {
                deps,
                repo,
                force_version,
                ledger,
                ..
            }) => {
                assert_eq!(deps, "deps.txt");
                assert_eq!(repo.len(), 2);
                assert!(repo[0].is_local());
                assert_eq!(force_version.len(), 1);
                assert_eq!(ledger.as_deref(), Some("ledger.db"));
            }
            _ => panic!("Expected warm command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_override() {
        assert!(
            Cli::try_parse_from(["prewarm", "check", "cat.toml", "-f", "not-a-pin"]).is_err()
        );
    }
}
