// src/lib.rs

//! Prewarm
//!
//! Artifact cache warmer and dependency manifest tool for Maven-style
//! repositories, built for Android projects that vendor their external
//! dependencies.
//!
//! # Architecture
//!
//! - Manifest: version catalogs flatten to pinned coordinates; conflicting
//!   pins fail resolution unless a forced-version override settles them
//! - Warming: strictly sequential fetches, fail-fast on the first error
//! - Fetchers: an external tool (coursier-style) or the built-in resolver
//!   over ordered local/remote repository sources
//! - Ledger: optional SQLite record of every warm run
//! - Patching: cached POMs rewritten so offline resolution agrees with the
//!   overrides

pub mod buck;
pub mod coordinate;
pub mod db;
mod error;
pub mod manifest;
pub mod overrides;
pub mod repository;
pub mod version;
pub mod warmer;

pub use error::{Error, Result};
