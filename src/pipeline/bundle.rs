//! Bundler seam.
//!
//! The pipeline does not bundle anything itself. A [`Bundler`] receives the
//! pages to build and reports what it emitted: the module graph, output
//! chunks, emitted assets and the entry-module table.

use super::PageBuildRecord;
use crate::asset::ScriptDescriptor;
use crate::graph::{ModuleGraph, ModuleId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

/// One emitted JS chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputChunk {
    pub file_name: String,
    /// Modules rendered into this chunk.
    pub modules: Vec<ModuleId>,
    /// Stylesheets the chunk's modules import.
    pub imported_css: Vec<String>,
}

/// One emitted non-JS file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmittedAsset {
    /// Name before hashing, e.g. `style.css`.
    pub name: Option<String>,
    pub file_name: String,
    /// File text, when the bundler keeps it (CSS only).
    pub source: Option<String>,
}

/// What a bundler run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleOutput {
    pub modules: ModuleGraph,
    pub chunks: Vec<OutputChunk>,
    pub assets: Vec<EmittedAsset>,
    /// Entry specifier → emitted file name.
    pub entry_modules: BTreeMap<String, String>,
    /// Modules in the order they first appear in page markup.
    pub import_order: Vec<ModuleId>,
    /// Page component → its hoisted script.
    pub hoisted_scripts: BTreeMap<String, ScriptDescriptor>,
}

impl BundleOutput {
    /// Every emitted file name.
    pub fn static_files(&self) -> BTreeSet<String> {
        self.chunks
            .iter()
            .map(|c| c.file_name.clone())
            .chain(self.assets.iter().map(|a| a.file_name.clone()))
            .filter(|f| !f.is_empty())
            .collect()
    }

    /// Emitted stylesheet → CSS text.
    pub fn css_sources(&self) -> FxHashMap<String, String> {
        self.assets
            .iter()
            .filter(|a| a.file_name.ends_with(".css"))
            .filter_map(|a| Some((a.file_name.clone(), a.source.clone()?)))
            .collect()
    }
}

pub trait Bundler: Send + Sync {
    fn bundle(&self, pages: &[PageBuildRecord]) -> anyhow::Result<BundleOutput>;
}

/// Bundler whose output was produced ahead of time and saved as JSON.
#[derive(Debug, Clone)]
pub struct ReportBundler {
    path: PathBuf,
}

impl ReportBundler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Bundler for ReportBundler {
    fn bundle(&self, pages: &[PageBuildRecord]) -> anyhow::Result<BundleOutput> {
        use anyhow::Context;

        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read bundler report `{}`", self.path.display()))?;
        let output: BundleOutput = serde_json::from_str(&json)
            .with_context(|| format!("invalid bundler report `{}`", self.path.display()))?;
        crate::debug!(
            "bundle";
            "{} pages, {} modules, {} chunks",
            pages.len(),
            output.modules.len(),
            output.chunks.len()
        );
        Ok(output)
    }
}
