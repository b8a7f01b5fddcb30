//! Attribution of emitted assets to the pages that use them.
//!
//! Walks run without holding any lock; only the resulting insertions are
//! serialized. Attribution is idempotent, so chunks may be processed in
//! parallel and in any order.

use super::order::sort_stylesheets;
use super::{CssOrderInfo, ImportOrder, PageAssetSet, PageStylesheet, ScriptDescriptor};
use crate::graph::{ModuleId, ModuleInfoSource, client_only_boundaries, top_level_pages};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct PageAssetRegistry {
    /// Page component → its assets.
    pages: Mutex<FxHashMap<String, PageAssetSet>>,
    /// Client-only component module → page components rendering it.
    client_only_owners: Mutex<FxHashMap<ModuleId, Vec<String>>>,
    /// Stylesheet file → modules it was built from.
    css_sources: Mutex<FxHashMap<String, Vec<ModuleId>>>,
}

impl PageAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a page has an (possibly empty) asset set.
    pub fn register_page(&self, component: &str) {
        self.pages.lock().entry(component.to_string()).or_default();
    }

    /// Record that `page` renders the client-only component `module`.
    pub fn track_client_only(&self, module: &str, page: &str) {
        let mut owners = self.client_only_owners.lock();
        let pages = owners.entry(module.to_string()).or_default();
        if !pages.iter().any(|p| p == page) {
            pages.push(page.to_string());
        }
    }

    /// Attribute one asset reached from `module_id`.
    pub fn attribute<S>(&self, source: &S, module_id: &str, asset: &str)
    where
        S: ModuleInfoSource + ?Sized,
    {
        self.attribute_many(source, module_id, std::slice::from_ref(&asset));
    }

    /// Attribute several assets reached from `module_id`, walking once.
    ///
    /// Every page above the module gets each asset with its walk depth and
    /// order. Pages owning a client-only component above the module get it
    /// as a client-only sheet.
    pub fn attribute_many<S, A>(&self, source: &S, module_id: &str, assets: &[A])
    where
        S: ModuleInfoSource + ?Sized,
        A: AsRef<str>,
    {
        if assets.is_empty() {
            return;
        }

        let pages: Vec<(String, CssOrderInfo)> = top_level_pages(module_id, source)
            .into_iter()
            .filter_map(|p| {
                let component = p.info.meta.page.clone()?;
                Some((component, CssOrderInfo::new(p.depth, p.order)))
            })
            .collect();

        let owners: Vec<String> = {
            let boundaries = client_only_boundaries(module_id, source);
            let map = self.client_only_owners.lock();
            boundaries
                .iter()
                .filter_map(|b| map.get(&b.info.id))
                .flatten()
                .cloned()
                .collect()
        };

        if pages.is_empty() && owners.is_empty() {
            crate::debug!("assets"; "no page reaches {module_id}");
            return;
        }

        let mut registry = self.pages.lock();
        for asset in assets {
            let asset = asset.as_ref();
            for (component, info) in &pages {
                registry
                    .entry(component.clone())
                    .or_default()
                    .add_css(asset, *info);
            }
            for component in &owners {
                registry
                    .entry(component.clone())
                    .or_default()
                    .add_client_only_css(asset);
            }
        }
    }

    /// Attribute the stylesheets of a chunk built from `modules`.
    pub fn attribute_chunk<S, A>(&self, source: &S, modules: &[ModuleId], css: &[A])
    where
        S: ModuleInfoSource + ?Sized,
        A: AsRef<str>,
    {
        if css.is_empty() {
            return;
        }
        {
            let mut sources = self.css_sources.lock();
            for file in css {
                let list = sources.entry(file.as_ref().to_string()).or_default();
                for module in modules {
                    if !list.contains(module) {
                        list.push(module.clone());
                    }
                }
            }
        }
        for module in modules {
            self.attribute_many(source, module, css);
        }
    }

    /// Attribute an asset to every registered page.
    pub fn attribute_to_all(&self, asset: &str) {
        let mut registry = self.pages.lock();
        for set in registry.values_mut() {
            set.add_css(asset, CssOrderInfo::new(0, 0));
        }
    }

    pub fn set_hoisted_script(&self, page: &str, script: ScriptDescriptor) {
        self.pages
            .lock()
            .entry(page.to_string())
            .or_default()
            .hoisted_script = Some(script);
    }

    /// Snapshot of one page's assets.
    pub fn page(&self, component: &str) -> Option<PageAssetSet> {
        self.pages.lock().get(component).cloned()
    }

    /// Registered page components, sorted.
    pub fn pages(&self) -> Vec<String> {
        let mut pages: Vec<String> = self.pages.lock().keys().cloned().collect();
        pages.sort_unstable();
        pages
    }

    /// Modules a stylesheet was built from.
    pub fn css_sources(&self, file: &str) -> Vec<ModuleId> {
        self.css_sources.lock().get(file).cloned().unwrap_or_default()
    }

    /// A page's stylesheets in final head order.
    pub fn stylesheets_for(&self, component: &str, order: &ImportOrder) -> Vec<PageStylesheet> {
        let Some(set) = self.page(component) else {
            return Vec::new();
        };
        let mut sheets = set.css().to_vec();
        sort_stylesheets(&mut sheets, order, |file| self.css_sources(file));
        sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ModuleGraph, ModuleInfo};
    use rayon::prelude::*;

    fn module(id: &str, imports: &[&str]) -> ModuleInfo {
        let mut m = ModuleInfo::new(id);
        m.imported_ids = imports.iter().map(|s| s.to_string()).collect();
        m
    }

    fn page(id: &str, imports: &[&str]) -> ModuleInfo {
        let mut m = module(id, imports);
        m.meta.page = Some(id.to_string());
        m
    }

    fn shared_graph() -> ModuleGraph {
        ModuleGraph::from_modules(vec![
            page("src/pages/a.astro", &["src/components/X.astro"]),
            page("src/pages/b.astro", &["src/components/X.astro"]),
            module("src/components/X.astro", &[]),
        ])
    }

    #[test]
    fn test_shared_module_attributes_both_pages_once() {
        let graph = shared_graph();
        let registry = PageAssetRegistry::new();

        registry.attribute(&graph, "src/components/X.astro", "_assets/x.css");
        registry.attribute(&graph, "src/components/X.astro", "_assets/x.css");

        for component in ["src/pages/a.astro", "src/pages/b.astro"] {
            let set = registry.page(component).unwrap();
            let files: Vec<&str> = set.css().iter().map(|s| s.file.as_str()).collect();
            assert_eq!(files, ["_assets/x.css"], "{component}");
        }
    }

    #[test]
    fn test_parallel_attribution_is_idempotent() {
        let graph = shared_graph();
        let registry = PageAssetRegistry::new();

        (0..64).into_par_iter().for_each(|i| {
            let asset = format!("_assets/{}.css", i % 4);
            registry.attribute(&graph, "src/components/X.astro", &asset);
        });

        let set = registry.page("src/pages/a.astro").unwrap();
        assert_eq!(set.css().len(), 4);
    }

    #[test]
    fn test_client_only_owner_gets_sheet() {
        let mut island = module("src/components/Island.jsx", &[]);
        island.meta.client_only = true;
        let graph = ModuleGraph::from_modules(vec![
            page("src/pages/index.astro", &[]),
            island,
        ]);
        let registry = PageAssetRegistry::new();
        registry.track_client_only("src/components/Island.jsx", "src/pages/index.astro");
        registry.track_client_only("src/components/Island.jsx", "src/pages/index.astro");

        registry.attribute(&graph, "src/components/Island.jsx", "_assets/island.css");

        let set = registry.page("src/pages/index.astro").unwrap();
        assert_eq!(set.css_info("_assets/island.css"), Some(CssOrderInfo::CLIENT_ONLY));
    }

    #[test]
    fn test_attribute_chunk_records_sources_and_orders() {
        let graph = ModuleGraph::from_modules(vec![
            page("src/pages/a.astro", &["src/styles/late.css", "src/styles/early.css"]),
            module("src/styles/late.css", &[]),
            module("src/styles/early.css", &[]),
        ]);
        let registry = PageAssetRegistry::new();
        registry.attribute_chunk(&graph, &["src/styles/late.css".to_string()], &["_assets/late.css"]);
        registry.attribute_chunk(&graph, &["src/styles/early.css".to_string()], &["_assets/early.css"]);

        assert_eq!(registry.css_sources("_assets/early.css"), ["src/styles/early.css"]);

        let order: ImportOrder = ["src/styles/early.css", "src/styles/late.css"].into_iter().collect();
        let sheets = registry.stylesheets_for("src/pages/a.astro", &order);
        let files: Vec<&str> = sheets.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(files, ["_assets/early.css", "_assets/late.css"]);
    }

    #[test]
    fn test_attribute_to_all() {
        let registry = PageAssetRegistry::new();
        registry.register_page("src/pages/a.astro");
        registry.register_page("src/pages/b.astro");
        registry.attribute_to_all("_assets/style.css");
        for page in registry.pages() {
            assert!(registry.page(&page).unwrap().contains_css("_assets/style.css"));
        }
    }
}
