//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Route resolution, asset attribution and manifest assembly for site builds
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: strata.toml)
    #[arg(short = 'C', long, global = true, default_value = "strata.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a starter strata.toml
    #[command(visible_alias = "i")]
    Init {
        /// Print the config template instead of writing it
        #[arg(long)]
        dry: bool,
    },

    /// Resolve routes, attribute assets and write the manifest
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Load a manifest the way a runtime would and list its routes
    Inspect {
        /// Directory holding manifest.json (default: the build output)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Build plan: routes and static-path data (default: `build.plan`)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub plan: Option<PathBuf>,

    /// Bundler report (default: `build.bundle`)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub bundle: Option<PathBuf>,

    /// Reuse a route cache written by `--cache-out`
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub cache_in: Option<PathBuf>,

    /// Write the route cache after enumeration
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub cache_out: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// No progress line and no page list
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_flags() {
        let cli = Cli::parse_from([
            "strata", "-C", "site/strata.toml", "build", "--plan", "p.json", "--cache-out", "c.json",
            "-v",
        ]);
        assert_eq!(cli.config, PathBuf::from("site/strata.toml"));
        let Commands::Build { args } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.plan, Some(PathBuf::from("p.json")));
        assert_eq!(args.cache_out, Some(PathBuf::from("c.json")));
        assert!(args.verbose && !args.quiet);
    }

    #[test]
    fn test_inspect_dir_is_optional() {
        let cli = Cli::parse_from(["strata", "inspect"]);
        assert!(matches!(cli.command, Commands::Inspect { dir: None }));
        assert_eq!(cli.config, PathBuf::from("strata.toml"));
    }
}
