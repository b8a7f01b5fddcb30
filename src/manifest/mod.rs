//! The build/runtime manifest.
//!
//! A [`Manifest`] is split in two:
//!
//! - [`ManifestCore`]: plain data, serialized by [`codec`]
//! - [`RuntimeExtras`]: handles the hosting runtime attaches after loading
//!
//! | Module     | Purpose                                           |
//! |------------|---------------------------------------------------|
//! | `assemble` | Build a manifest from routes, assets and config   |
//! | `codec`    | `Manifest` ⇄ `SerializedManifest`                  |
//! | `key`      | Per-build encryption key                          |
//! | `load`     | Write/read `manifest.json`                        |

pub mod assemble;
pub mod codec;
pub mod key;
pub mod load;

pub use assemble::{AssemblyInput, ManifestAssembler, PageHead};
pub use codec::{SerializedManifest, SerializedRouteData, SerializedRouteInfo};
pub use key::EncryptionKey;
pub use load::{MANIFEST_FILE, load_manifest, write_manifest};

use crate::asset::{ScriptDescriptor, StylesheetAsset};
use crate::config::{CspAlgorithm, FallbackType, Locale, RoutingStrategy};
use crate::core::{BuildFormat, TrailingSlash};
use crate::graph::Propagation;
use crate::route::{RouteDescriptor, RouteIdentity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Entry specifier of the bundled `page`-stage scripts.
pub const PAGE_SCRIPT_ID: &str = "strata:scripts/page.js";
/// Entry specifier of the bundled `before-hydration`-stage scripts.
pub const BEFORE_HYDRATION_SCRIPT_ID: &str = "strata:scripts/before-hydration.js";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("page `{page}` references `{filename}`, which the build did not emit. \
             This is an internal error, please file an issue.")]
    MissingAsset { filename: String, page: String },

    #[error("no page module `{specifier}` was bundled for route {route}. \
             This is an internal error, please file an issue.")]
    UnresolvedPageModule {
        route: RouteIdentity,
        specifier: String,
    },

    #[error("entry module `{specifier}` is missing from the bundle. \
             This is an internal error, please file an issue.")]
    MissingEntryModule { specifier: String },

    #[error("invalid manifest key: {reason}")]
    InvalidKey { reason: String },

    #[error("manifest is not valid JSON or lacks a required field. \
             This is an internal error, please file an issue.")]
    Decode(#[from] serde_json::Error),

    #[error("manifest route `{route}` is inconsistent: {reason}. \
             This is an internal error, please file an issue.")]
    CorruptRoute { route: String, reason: String },

    #[error("cannot access manifest `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl ManifestError {
    /// Framework-bug class, as opposed to a project or deployment problem.
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::MissingAsset { .. }
                | Self::UnresolvedPageModule { .. }
                | Self::MissingEntryModule { .. }
                | Self::Decode(_)
                | Self::CorruptRoute { .. }
        )
    }
}

// ============================================================================
// Manifest data
// ============================================================================

/// One route as the runtime sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    pub route: RouteDescriptor,
    /// Output file for prerendered routes, empty for on-demand ones.
    pub file: String,
    pub links: Vec<String>,
    pub scripts: Vec<ScriptDescriptor>,
    pub styles: Vec<StylesheetAsset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    pub propagation: Propagation,
    pub contains_head: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct I18nManifest {
    pub fallback: BTreeMap<String, String>,
    pub fallback_type: FallbackType,
    pub strategy: RoutingStrategy,
    pub locales: Vec<Locale>,
    pub default_locale: String,
    /// Origin → normalized locale.
    pub domain_lookup_table: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CspManifest {
    pub algorithm: CspAlgorithm,
    pub directives: Vec<String>,
    pub script_hashes: Vec<String>,
    pub script_resources: Vec<String>,
    pub style_hashes: Vec<String>,
    pub style_resources: Vec<String>,
    pub is_strict_dynamic: bool,
}

/// Serializable part of the manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestCore {
    pub adapter_name: String,
    /// Routes in priority order.
    pub routes: Vec<RouteInfo>,
    pub site: Option<String>,
    pub base: String,
    pub trailing_slash: TrailingSlash,
    pub build_format: BuildFormat,
    pub compress_html: bool,
    pub assets_prefix: Option<String>,
    pub component_metadata: BTreeMap<String, ComponentMetadata>,
    /// Entry specifier → emitted file.
    pub entry_modules: BTreeMap<String, String>,
    /// Every file the runtime may serve, prefixed for URLs.
    pub assets: BTreeSet<String>,
    pub i18n: Option<I18nManifest>,
    pub csp: Option<CspManifest>,
}

// ============================================================================
// Runtime extras
// ============================================================================

/// Request hook supplied by the hosting runtime.
pub trait Middleware: Send + Sync {
    /// Runs before `route` renders `path`; `false` stops the request.
    fn on_request(&self, route: &RouteDescriptor, path: &str) -> bool;
}

/// Handles that never leave the process. Not serialized; the runtime
/// attaches them after loading the manifest.
#[derive(Clone, Default)]
pub struct RuntimeExtras {
    pub middleware: Option<Arc<dyn Middleware>>,
}

impl fmt::Debug for RuntimeExtras {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeExtras")
            .field("middleware", &self.middleware.is_some())
            .finish()
    }
}

// ============================================================================
// Manifest
// ============================================================================

#[derive(Debug, Clone)]
pub struct Manifest {
    pub core: ManifestCore,
    pub key: EncryptionKey,
    pub extras: RuntimeExtras,
}

impl Manifest {
    pub fn new(core: ManifestCore, key: EncryptionKey) -> Self {
        Self {
            core,
            key,
            extras: RuntimeExtras::default(),
        }
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.extras.middleware = Some(middleware);
        self
    }

    pub fn routes(&self) -> &[RouteInfo] {
        &self.core.routes
    }

    /// First route, in priority order, whose pattern matches `path`.
    pub fn match_route(&self, path: &str) -> Option<&RouteInfo> {
        self.core
            .routes
            .iter()
            .find(|r| r.route.pattern.match_path(path).is_some())
    }
}

/// Equality over routing and asset data; runtime extras are ignored.
impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core && self.key == other.key
    }
}
