//! Strata command-line entry point.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use std::process::ExitCode;
use strata::cli::{Cli, Commands, build, init, inspect};
use strata::config::ProjectConfig;
use strata::error::BuildError;
use strata::{ErrorClass, log, logger};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let class = err
                .downcast_ref::<BuildError>()
                .map(BuildError::class)
                .unwrap_or(ErrorClass::Config);
            log!("error"; "{:#}", err);
            match class {
                ErrorClass::Config => ExitCode::FAILURE,
                ErrorClass::Internal => ExitCode::from(2),
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;

    match &cli.command {
        Commands::Init { dry } => init::init_project(&cwd, *dry).map(|_| ()),
        Commands::Build { args } => {
            logger::set_verbose(args.verbose);
            let config = ProjectConfig::load(&cwd, &cli.config).map_err(BuildError::from)?;
            build::build_project(&config, args).map(|_| ())
        }
        Commands::Inspect { dir } => {
            let dir = match dir {
                Some(dir) => dir.clone(),
                None => ProjectConfig::load(&cwd, &cli.config)
                    .map_err(BuildError::from)?
                    .output_dir(),
            };
            inspect::inspect_manifest(&dir).map(|_| ())
        }
    }
}
