//! `strata inspect`: load a written manifest and list its routes.

use crate::manifest::{Manifest, load_manifest};
use crate::route::RouteType;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn inspect_manifest(dir: &Path) -> Result<Manifest> {
    let manifest = load_manifest(dir)?;
    let core = &manifest.core;

    println!(
        "{} {} routes, {} assets, base `{}`",
        "manifest".bold(),
        core.routes.len(),
        core.assets.len(),
        core.base
    );
    for info in &core.routes {
        let kind = match info.route.kind {
            RouteType::Page => "page".green().to_string(),
            RouteType::Endpoint => "endpoint".cyan().to_string(),
        };
        let file = if info.file.is_empty() {
            "on demand".dimmed().to_string()
        } else {
            info.file.clone()
        };
        println!("  {:<9} {:<32} {}", kind, info.route.route(), file);
        for style in &info.styles {
            println!("  {:<9} {}", "", format!("{style:?}").dimmed());
        }
    }
    Ok(manifest)
}
