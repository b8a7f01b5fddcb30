//! Strata: static route resolution, route caching, asset attribution and
//! manifest assembly for site builds.
//!
//! # Module Structure
//!
//! ```text
//! src/
//! ├── core/        # Output mode, build format, trailing slash policy
//! ├── route/       # Patterns, params, pagination, output paths
//! ├── cache/       # Per-route getStaticPaths results
//! ├── graph/       # Module graph walks
//! ├── asset/       # Page → stylesheet / script attribution
//! ├── manifest/    # Assembly, codec, key, on-disk form
//! ├── pipeline/    # Build orchestration
//! ├── config/      # strata.toml
//! └── cli/         # Subcommands
//! ```

pub mod asset;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod graph;
pub mod logger;
pub mod manifest;
pub mod pipeline;
pub mod route;

pub use error::{BuildError, ErrorClass};
