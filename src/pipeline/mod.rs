//! Build orchestration.
//!
//! # Phases
//!
//! ```text
//! ┌───────────┐   ┌────────────┐   ┌────────┐   ┌───────────┐   ┌──────┐   ┌──────────┐
//! │ routes    │ → │ enumerate  │ → │ bundle │ → │ attribute │ → │ seal │ → │ manifest │
//! │ (sorted)  │   │ (rayon)    │   │        │   │ assets    │   │      │   │          │
//! └───────────┘   └────────────┘   └────────┘   └───────────┘   └──────┘   └──────────┘
//! ```
//!
//! Enumeration fans out across routes and stops at the first error. Pages
//! are then claimed in route priority order, so when two routes generate
//! the same path the more specific route keeps it.

pub mod bundle;
pub mod conflict;
pub mod plan;


pub use bundle::{BundleOutput, Bundler, EmittedAsset, OutputChunk, ReportBundler};
pub use conflict::{Claim, PathClaims, PrerenderConflict, print_conflicts};
pub use plan::BuildPlan;

use crate::asset::{ImportOrder, PageAssetRegistry};
use crate::cache::{GetStaticPaths, ResolveContext, RouteCache, SerializedRouteCacheEntry};
use crate::config::ProjectConfig;
use crate::error::BuildError;
use crate::graph::Propagation;
use crate::logger::ProgressLine;
use crate::manifest::codec::serialize;
use crate::manifest::{
    AssemblyInput, ComponentMetadata, EncryptionKey, ManifestAssembler, PageHead,
    SerializedManifest,
};
use crate::route::{
    ParamKeyCodec, Params, RouteDescriptor, RouteIdentity, RouteType, output_file,
};
use crate::{debug, log};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Original name of the single stylesheet emitted without CSS code splitting.
const SHARED_STYLESHEET: &str = "style.css";

// ============================================================================
// Types
// ============================================================================

/// A discovered route and its enumeration function.
pub struct RouteDefinition {
    pub descriptor: RouteDescriptor,
    pub get_static_paths: Option<Arc<dyn GetStaticPaths>>,
}

impl RouteDefinition {
    pub fn new(descriptor: RouteDescriptor) -> Self {
        Self {
            descriptor,
            get_static_paths: None,
        }
    }

    pub fn with_static_paths(mut self, f: impl GetStaticPaths + 'static) -> Self {
        self.get_static_paths = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("descriptor", &self.descriptor)
            .field("get_static_paths", &self.get_static_paths.is_some())
            .finish()
    }
}

/// One page to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBuildRecord {
    pub route: RouteIdentity,
    #[serde(rename = "type")]
    pub kind: RouteType,
    /// Canonical request path.
    pub pathname: String,
    pub params: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
}

/// What the build hands to packaging.
#[derive(Debug)]
pub struct BuildArtifacts {
    /// Pages with their output file, in route priority order.
    pub pages: Vec<(PageBuildRecord, PathBuf)>,
    pub manifest: SerializedManifest,
    /// Page component → head assets used when rendering it.
    pub page_heads: BTreeMap<String, PageHead>,
    /// Conflicts skipped because conflicts were not fatal.
    pub conflicts: Vec<PrerenderConflict>,
}

// ============================================================================
// BuildPipeline
// ============================================================================

pub struct BuildPipeline<'a> {
    config: &'a ProjectConfig,
    cache: RouteCache,
    registry: PageAssetRegistry,
    progress: bool,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self {
            config,
            cache: RouteCache::new(),
            registry: PageAssetRegistry::new(),
            progress: false,
        }
    }

    /// Show a progress line while enumerating.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    #[inline]
    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    #[inline]
    pub fn registry(&self) -> &PageAssetRegistry {
        &self.registry
    }

    /// Load a previous build's enumeration results.
    pub fn hydrate_cache(&self, entries: Vec<SerializedRouteCacheEntry>) -> Result<usize, BuildError> {
        let count = self.cache.hydrate(entries)?;
        debug!("routes"; "hydrated {count} cache entries");
        Ok(count)
    }

    pub fn export_cache(&self) -> Vec<SerializedRouteCacheEntry> {
        self.cache.serialize()
    }

    fn resolve_context(&self) -> ResolveContext {
        ResolveContext {
            output: self.config.build.mode,
            trailing_slash: self.config.site.trailing_slash,
            base: self.config.base(),
        }
    }

    /// Run every phase.
    pub fn run(
        &self,
        routes: Vec<RouteDefinition>,
        bundler: &dyn Bundler,
        key: EncryptionKey,
    ) -> Result<BuildArtifacts, BuildError> {
        let routes = self.prepare_routes(routes);
        let (pages, conflicts) = self.collect_pages(&routes)?;
        log!("build"; "{} pages from {} routes", pages.len(), routes.len());

        let bundle = bundler.bundle(&pages).map_err(BuildError::Bundle)?;
        self.attribute_assets(&bundle);
        self.cache.seal();

        let descriptors: Vec<RouteDescriptor> =
            routes.iter().map(|r| r.descriptor.clone()).collect();
        let import_order: ImportOrder = bundle.import_order.iter().cloned().collect();
        let css_sources = bundle.css_sources();
        let input = AssemblyInput {
            routes: &descriptors,
            entry_modules: bundle.entry_modules.clone(),
            static_files: bundle.static_files(),
            asset_sources: &css_sources,
            component_metadata: component_metadata(&bundle),
            key,
        };

        let assembler = ManifestAssembler::new(self.config, &self.registry, &import_order);
        let mut page_heads = BTreeMap::new();
        for route in descriptors.iter().filter(|r| r.kind == RouteType::Page) {
            if !page_heads.contains_key(&route.component) {
                let head = assembler.head_for(&route.component, &input)?;
                page_heads.insert(route.component.clone(), head);
            }
        }
        let manifest = serialize(&assembler.assemble(input)?);

        let output_dir = self.config.output_dir();
        let format = self.config.build.format;
        let pages = pages
            .into_iter()
            .map(|page| {
                let file = output_file(&page.pathname, page.kind, format);
                (page, output_dir.join(file))
            })
            .collect();

        Ok(BuildArtifacts {
            pages,
            manifest,
            page_heads,
            conflicts,
        })
    }

    /// Sort routes by priority. Without a server runtime every route is
    /// prerendered.
    fn prepare_routes(&self, mut routes: Vec<RouteDefinition>) -> Vec<RouteDefinition> {
        if !self.config.build.mode.is_server() {
            for route in routes.iter_mut().filter(|r| !r.descriptor.prerender) {
                log!(
                    "warn";
                    "{}: on-demand rendering needs `build.mode = \"server\"`, prerendering instead",
                    route.descriptor
                );
                route.descriptor.prerender = true;
            }
        }
        routes.sort_by(|a, b| a.descriptor.pattern.priority_cmp(&b.descriptor.pattern));
        routes
    }

    /// Enumerate prerendered routes and expand them into pages.
    ///
    /// `routes` must be in priority order. Returns the pages and, when
    /// conflicts are not fatal, the skipped conflicts.
    pub fn collect_pages(
        &self,
        routes: &[RouteDefinition],
    ) -> Result<(Vec<PageBuildRecord>, Vec<PrerenderConflict>), BuildError> {
        let ctx = self.resolve_context();
        let prerendered: Vec<&RouteDefinition> =
            routes.iter().filter(|r| r.descriptor.prerender).collect();

        let progress = self.progress.then(|| {
            ProgressLine::new("routes", &[("routes", Some(prerendered.len())), ("pages", None)])
        });

        let entries = prerendered
            .par_iter()
            .map(|def| -> Result<_, BuildError> {
                let entry = self.cache.resolve(
                    &def.descriptor,
                    def.get_static_paths.as_deref(),
                    &ctx,
                )?;
                if let Some(p) = &progress {
                    p.inc("routes");
                    p.add("pages", entry.len());
                }
                Ok(entry)
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        if let Some(p) = progress {
            p.finish();
        }

        let format = self.config.build.format;
        let mut claims = PathClaims::new();
        let mut pages: Vec<PageBuildRecord> = Vec::new();
        let mut conflicts = Vec::new();

        for (def, entry) in prerendered.iter().zip(&entries) {
            let route = &def.descriptor;
            let identity = route.identity();
            for item in entry.static_paths() {
                let pathname = ParamKeyCodec::encode(&item.params, route, ctx.trailing_slash)?;
                let file = output_file(&pathname, route.kind, format);
                let record = PageBuildRecord {
                    route: identity.clone(),
                    kind: route.kind,
                    pathname: pathname.clone(),
                    params: item.params.clone(),
                    props: item.props.clone(),
                };
                match claims.claim(&pathname, &file, &identity, pages.len()) {
                    Claim::New(_) => pages.push(record),
                    // Same key within one route: the later item wins.
                    Claim::Repeated(slot) => pages[slot] = record,
                    Claim::Conflict(conflict) if self.config.build.fail_on_prerender_conflict => {
                        return Err(conflict.into_error());
                    }
                    Claim::Conflict(conflict) => conflicts.push(conflict),
                }
            }
        }

        print_conflicts(&conflicts);
        Ok((pages, conflicts))
    }

    /// Attribute the bundle's stylesheets and scripts to pages.
    pub fn attribute_assets(&self, bundle: &BundleOutput) {
        let graph = &bundle.modules;
        for module in graph.pages() {
            let Some(component) = &module.meta.page else {
                continue;
            };
            self.registry.register_page(component);
            for client in &module.meta.client_only_components {
                self.registry.track_client_only(client, component);
            }
        }

        for (page, script) in &bundle.hoisted_scripts {
            self.registry.set_hoisted_script(page, script.clone());
        }

        bundle.chunks.par_iter().for_each(|chunk| {
            self.registry
                .attribute_chunk(graph, &chunk.modules, &chunk.imported_css);
        });

        if !self.config.build.css_code_split {
            for asset in &bundle.assets {
                if asset.name.as_deref() == Some(SHARED_STYLESHEET) {
                    self.registry.attribute_to_all(&asset.file_name);
                }
            }
        }
        debug!("assets"; "attributed assets to {} pages", self.registry.pages().len());
    }
}

/// Head propagation data of every module that has any.
fn component_metadata(bundle: &BundleOutput) -> BTreeMap<String, ComponentMetadata> {
    bundle
        .modules
        .iter()
        .filter(|m| m.meta.propagation != Propagation::None || m.meta.contains_head)
        .map(|m| {
            (
                m.id.clone(),
                ComponentMetadata {
                    propagation: m.meta.propagation,
                    contains_head: m.meta.contains_head,
                },
            )
        })
        .collect()
}
