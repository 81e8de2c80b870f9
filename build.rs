// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("prewarm")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Prewarm Contributors")
        .about("Artifact cache warmer and dependency manifest tool")
        .subcommand_required(false)
        .subcommand(
            Command::new("deps")
                .about("Flatten a version catalog into a flat deps file")
                .arg(Arg::new("catalog").required(true).help("Path to the version catalog"))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output deps file (stdout if omitted)"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a version catalog for version conflicts")
                .arg(Arg::new("catalog").required(true).help("Path to the version catalog"))
                .arg(
                    Arg::new("force_version")
                        .short('f')
                        .long("force-version")
                        .action(clap::ArgAction::Append)
                        .help("Forced version pin, group:artifact:version"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(clap::ArgAction::SetTrue)
                        .help("Emit the resolved manifest as JSON"),
                ),
        )
        .subcommand(
            Command::new("warm")
                .about("Fetch every artifact in a deps file into the local cache")
                .arg(Arg::new("deps").required(true).help("Path to the flat deps file"))
                .arg(
                    Arg::new("repo")
                        .short('r')
                        .long("repo")
                        .action(clap::ArgAction::Append)
                        .help("Repository source, local path or URL; order is search order"),
                )
                .arg(
                    Arg::new("force_version")
                        .short('f')
                        .long("force-version")
                        .action(clap::ArgAction::Append)
                        .help("Forced version pin, group:artifact:version"),
                )
                .arg(
                    Arg::new("tool")
                        .short('t')
                        .long("tool")
                        .help("External fetch tool; built-in resolver if omitted"),
                )
                .arg(
                    Arg::new("cache_dir")
                        .short('c')
                        .long("cache-dir")
                        .default_value("artifact-cache")
                        .help("Cache directory for the built-in resolver"),
                )
                .arg(
                    Arg::new("ledger")
                        .short('l')
                        .long("ledger")
                        .help("Record the run in a ledger database at this path"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Show past warm runs from a ledger")
                .arg(
                    Arg::new("ledger")
                        .short('l')
                        .long("ledger")
                        .default_value("prewarm.db")
                        .help("Ledger database path"),
                ),
        )
        .subcommand(
            Command::new("patch-poms")
                .about("Apply forced version pins to cached POM files")
                .arg(
                    Arg::new("cache_dir")
                        .short('c')
                        .long("cache-dir")
                        .required(true)
                        .help("Cache directory to scan for *.pom files"),
                )
                .arg(
                    Arg::new("force_version")
                        .short('f')
                        .long("force-version")
                        .required(true)
                        .action(clap::ArgAction::Append)
                        .help("Forced version pin, group:artifact:version"),
                )
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(clap::ArgAction::SetTrue)
                        .help("Report changes without writing"),
                ),
        )
        .subcommand(
            Command::new("targets")
                .about("Append an android_library rule for a deps file to a BUCK file")
                .arg(Arg::new("deps").required(true).help("Path to the flat deps file"))
                .arg(
                    Arg::new("lib_dir")
                        .short('d')
                        .long("lib-dir")
                        .required(true)
                        .help("Library directory the labels point into"),
                )
                .arg(
                    Arg::new("buck_file")
                        .short('b')
                        .long("buck-file")
                        .required(true)
                        .help("BUCK file to append the rule to"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)
        .expect("Failed to render man page");

    let man_path = man_dir.join("prewarm.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
