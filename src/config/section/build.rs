//! `[build]` configuration.

use crate::asset::InlineStylesheets;
use crate::config::ConfigDiagnostics;
use crate::core::{BuildFormat, OutputMode};
use macros::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build output and asset handling.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "build")]
pub struct BuildConfig {
    /// Output directory.
    #[config(default = "dist", inline_doc)]
    pub output: PathBuf,

    /// Page file layout: "directory" (a/index.html) or "file" (a.html).
    #[config(default = "directory", inline_doc)]
    pub format: BuildFormat,

    /// "static" prerenders everything; "server" keeps on-demand routes.
    #[config(default = "static", inline_doc)]
    pub mode: OutputMode,

    /// Strip insignificant whitespace from rendered HTML.
    #[config(default = "true", inline_doc)]
    pub compress_html: bool,

    /// Origin or path emitted assets are served from, e.g. a CDN.
    #[config(inline_doc)]
    pub assets_prefix: Option<String>,

    /// Adapter that hosts the runtime.
    #[config(inline_doc)]
    pub adapter: String,

    /// Inline CSS into pages: "auto", "always" or "never".
    #[config(default = "auto", inline_doc)]
    pub inline_stylesheets: InlineStylesheets,

    /// Largest stylesheet in bytes that "auto" inlines.
    #[config(default = "4096", inline_doc)]
    pub inline_limit: usize,

    /// Split CSS per chunk instead of one shared style.css.
    #[config(default = "true", inline_doc)]
    pub css_code_split: bool,

    /// Fail when two prerendered routes write the same path.
    #[config(default = "true", inline_doc)]
    pub fail_on_prerender_conflict: bool,

    /// Build plan: routes and their static path data.
    #[config(default = "strata.plan.json", inline_doc)]
    pub plan: PathBuf,

    /// Bundler report: module graph, chunks and emitted assets.
    #[config(default = "bundle.json", inline_doc)]
    pub bundle: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: "dist".into(),
            format: BuildFormat::Directory,
            mode: OutputMode::Static,
            compress_html: true,
            assets_prefix: None,
            adapter: String::new(),
            inline_stylesheets: InlineStylesheets::Auto,
            inline_limit: 4096,
            css_code_split: true,
            fail_on_prerender_conflict: true,
            plan: "strata.plan.json".into(),
            bundle: "bundle.json".into(),
        }
    }
}

impl BuildConfig {
    /// `assets_prefix` if set to something non-empty.
    pub fn assets_prefix(&self) -> Option<&str> {
        self.assets_prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// Validate build configuration.
    ///
    /// # Checks
    /// - `output` is not empty
    /// - `mode = "server"` names an adapter
    /// - `assets_prefix` is an absolute URL or a path starting with `/`
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.output.as_os_str().is_empty() {
            diag.error(Self::FIELDS.output, "output directory must not be empty");
        }

        if self.mode.is_server() && self.adapter.trim().is_empty() {
            diag.error_with_hint(
                Self::FIELDS.adapter,
                "server output needs an adapter to host on-demand routes",
                format!(
                    "set {} or switch {} to \"static\"",
                    Self::FIELDS.adapter,
                    Self::FIELDS.mode
                ),
            );
        }

        if let Some(prefix) = self.assets_prefix()
            && !prefix.starts_with('/')
            && url::Url::parse(prefix).is_err()
        {
            diag.error_with_hint(
                Self::FIELDS.assets_prefix,
                format!("`{prefix}` is neither a URL nor an absolute path"),
                "use format like https://cdn.example.com or /static",
            );
        }
    }
}
