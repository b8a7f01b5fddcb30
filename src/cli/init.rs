//! `strata init`.

use crate::config::{CONFIG_FILE, ProjectConfig};
use crate::log;
use anyhow::{Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Write a starter config into `root`, or print it when `dry_run`.
///
/// Refuses to overwrite an existing config.
pub fn init_project(root: &Path, dry_run: bool) -> Result<Option<PathBuf>> {
    let template = ProjectConfig::template();
    if dry_run {
        print!("{template}");
        return Ok(None);
    }

    let path = root.join(CONFIG_FILE);
    if path.exists() {
        bail!("`{}` already exists", path.display());
    }
    fs::create_dir_all(root)?;
    fs::write(&path, template)?;
    log!("init"; "wrote {}", CONFIG_FILE);
    Ok(Some(path))
}
