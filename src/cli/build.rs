//! `strata build`.
//!
//! Phases:
//! - **Load** - build plan, optional route cache snapshot
//! - **Run** - the pipeline, with the bundler report standing in for a bundler
//! - **Write** - `manifest.json` into the output directory, optional cache snapshot
//! - **Report** - page list

use super::BuildArgs;
use crate::cache::SerializedRouteCacheEntry;
use crate::config::ProjectConfig;
use crate::error::BuildError;
use crate::log;
use crate::manifest::{EncryptionKey, write_manifest};
use crate::pipeline::{BuildArtifacts, BuildPipeline, BuildPlan, ReportBundler};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn build_project(config: &ProjectConfig, args: &BuildArgs) -> Result<BuildArtifacts> {
    let plan_path = args
        .plan
        .clone()
        .unwrap_or_else(|| config.root_join(&config.build.plan));
    let bundle_path = args
        .bundle
        .clone()
        .unwrap_or_else(|| config.root_join(&config.build.bundle));

    let routes = BuildPlan::load(&plan_path)?
        .into_definitions()
        .map_err(BuildError::from)?;
    let pipeline = BuildPipeline::new(config).with_progress(!args.quiet);

    if let Some(path) = &args.cache_in {
        let count = pipeline.hydrate_cache(read_snapshot(path)?)?;
        log!("routes"; "reusing {} cached route{}", count, if count == 1 { "" } else { "s" });
    }

    let key = EncryptionKey::from_env_or_generate().map_err(BuildError::from)?;
    let artifacts = pipeline.run(routes, &ReportBundler::new(bundle_path), key)?;

    if let Some(path) = &args.cache_out {
        write_snapshot(path, &pipeline.export_cache())?;
    }

    let manifest_path =
        write_manifest(&config.output_dir(), &artifacts.manifest).map_err(BuildError::from)?;
    log!("manifest"; "wrote {}", relative(&manifest_path, &config.root).display());

    if !args.quiet {
        for (page, file) in &artifacts.pages {
            println!("  {} -> {}", page.pathname, relative(file, &config.root).display());
        }
    }
    Ok(artifacts)
}

fn read_snapshot(path: &Path) -> Result<Vec<SerializedRouteCacheEntry>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("cannot read route cache `{}`", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid route cache `{}`", path.display()))
}

fn write_snapshot(path: &Path, entries: &[SerializedRouteCacheEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(entries)?)
        .with_context(|| format!("cannot write route cache `{}`", path.display()))?;
    crate::debug!("routes"; "wrote {} cache entries to {}", entries.len(), path.display());
    Ok(())
}

fn relative(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
