//! Manifest assembly.
//!
//! Merges the final route list, each page's attributed assets, the
//! bundler's entry-module table and the project configuration into one
//! [`Manifest`].
//!
//! # Invariants
//!
//! - Every external stylesheet and hoisted script file referenced by a
//!   page is in the static file set, and therefore in `assets`
//! - Every on-demand route has a bundled page module
//!
//! Either violation aborts the build with an internal error naming the
//! offending file or route.

use super::{
    BEFORE_HYDRATION_SCRIPT_ID, ComponentMetadata, CspManifest, I18nManifest, Manifest,
    ManifestCore, ManifestError, PAGE_SCRIPT_ID, RouteInfo,
};
use crate::asset::{
    ImportOrder, InlineStylesheets, PageAssetRegistry, ScriptDescriptor, ScriptKind, ScriptStage,
    StylesheetAsset, merge_inline_css,
};
use crate::config::ProjectConfig;
use crate::core::path::prefix_asset_path;
use crate::log;
use crate::manifest::key::EncryptionKey;
use crate::route::{RouteDescriptor, output_file};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Everything the build produced that the manifest refers to.
#[derive(Debug)]
pub struct AssemblyInput<'a> {
    /// Routes in priority order, conflicts already resolved.
    pub routes: &'a [RouteDescriptor],
    /// Entry specifier → emitted file name.
    pub entry_modules: BTreeMap<String, String>,
    /// Every emitted file name, unprefixed.
    pub static_files: BTreeSet<String>,
    /// Emitted stylesheet → its CSS text, when the bundler reported it.
    pub asset_sources: &'a FxHashMap<String, String>,
    pub component_metadata: BTreeMap<String, ComponentMetadata>,
    pub key: EncryptionKey,
}

/// Styles and scripts rendered into one page's head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHead {
    pub styles: Vec<StylesheetAsset>,
    pub scripts: Vec<ScriptDescriptor>,
}

pub struct ManifestAssembler<'a> {
    config: &'a ProjectConfig,
    registry: &'a PageAssetRegistry,
    import_order: &'a ImportOrder,
    base: String,
}

impl<'a> ManifestAssembler<'a> {
    pub fn new(
        config: &'a ProjectConfig,
        registry: &'a PageAssetRegistry,
        import_order: &'a ImportOrder,
    ) -> Self {
        Self {
            config,
            registry,
            import_order,
            base: config.base(),
        }
    }

    fn prefix(&self, file: &str) -> String {
        prefix_asset_path(file, &self.base, self.config.build.assets_prefix())
    }

    /// CSS text to inline for a sheet, or `None` to link it.
    fn inline_source<'s>(&self, source: Option<&'s String>) -> Option<&'s str> {
        let source = source?;
        match self.config.build.inline_stylesheets {
            InlineStylesheets::Always => Some(source),
            InlineStylesheets::Auto if source.len() <= self.config.build.inline_limit => {
                Some(source)
            }
            InlineStylesheets::Auto | InlineStylesheets::Never => None,
        }
    }

    /// Head assets of one page component.
    ///
    /// Styles follow the registry's head order, with adjacent inline sheets
    /// merged. Scripts are the hoisted script, then the page-script entry,
    /// then `head-inline` injected scripts.
    pub fn head_for(
        &self,
        component: &str,
        input: &AssemblyInput<'_>,
    ) -> Result<PageHead, ManifestError> {
        let mut styles = Vec::new();
        for sheet in self.registry.stylesheets_for(component, self.import_order) {
            match self.inline_source(input.asset_sources.get(&sheet.file)) {
                Some(content) => styles.push(StylesheetAsset::Inline {
                    content: content.to_string(),
                }),
                None => {
                    ensure_emitted(&input.static_files, &sheet.file, component)?;
                    styles.push(StylesheetAsset::External {
                        src: self.prefix(&sheet.file),
                    });
                }
            }
        }

        let mut scripts = Vec::new();
        if let Some(hoisted) = self.registry.page(component).and_then(|p| p.hoisted_script) {
            scripts.push(match hoisted {
                ScriptDescriptor::Hoisted {
                    kind: ScriptKind::External,
                    value,
                } if value.ends_with(".js") => {
                    ensure_emitted(&input.static_files, &value, component)?;
                    ScriptDescriptor::external(self.prefix(&value))
                }
                other => other,
            });
        }
        if self.config.has_script_stage(ScriptStage::Page) {
            let file = input.entry_modules.get(PAGE_SCRIPT_ID).ok_or_else(|| {
                ManifestError::MissingEntryModule {
                    specifier: PAGE_SCRIPT_ID.to_string(),
                }
            })?;
            scripts.push(ScriptDescriptor::external(self.prefix(file)));
        }
        scripts.extend(
            self.config
                .scripts
                .iter()
                .filter(|s| s.stage == ScriptStage::HeadInline)
                .map(|s| ScriptDescriptor::Injected {
                    stage: ScriptStage::HeadInline,
                    children: s.content.clone(),
                }),
        );

        Ok(PageHead {
            styles: merge_inline_css(styles),
            scripts,
        })
    }

    /// Build the manifest.
    ///
    /// Prerendered routes with a fixed path carry their output file and no
    /// head assets; prerendered dynamic routes are left out, their pages
    /// are plain files. On-demand routes carry their head and an empty
    /// `file`.
    pub fn assemble(&self, input: AssemblyInput<'_>) -> Result<Manifest, ManifestError> {
        let build = &self.config.build;
        let mut static_files = input.static_files.clone();
        let mut routes = Vec::with_capacity(input.routes.len());

        for route in input.routes {
            if route.prerender {
                let Some(pathname) = route.pathname() else {
                    continue;
                };
                let file = output_file(&pathname, route.kind, build.format);
                static_files.insert(file.clone());
                routes.push(RouteInfo {
                    route: route.clone(),
                    file,
                    links: Vec::new(),
                    scripts: Vec::new(),
                    styles: Vec::new(),
                });
                continue;
            }

            let specifier = route.page_module_specifier();
            if !input.entry_modules.contains_key(&specifier) {
                return Err(ManifestError::UnresolvedPageModule {
                    route: route.identity(),
                    specifier,
                });
            }
            let head = self.head_for(&route.component, &input)?;
            routes.push(RouteInfo {
                route: route.clone(),
                file: String::new(),
                links: Vec::new(),
                scripts: head.scripts,
                styles: head.styles,
            });
        }

        let mut entry_modules = input.entry_modules;
        if self.config.has_script_stage(ScriptStage::Page)
            && let Some(file) = entry_modules.get(PAGE_SCRIPT_ID)
        {
            static_files.insert(file.clone());
        }
        entry_modules
            .entry(BEFORE_HYDRATION_SCRIPT_ID.to_string())
            .or_default();

        let assets: BTreeSet<String> = static_files.iter().map(|f| self.prefix(f)).collect();
        log!("manifest"; "{} routes, {} assets", routes.len(), assets.len());

        let core = ManifestCore {
            adapter_name: build.adapter.clone(),
            routes,
            site: self.config.site.url.clone(),
            base: self.base.clone(),
            trailing_slash: self.config.site.trailing_slash,
            build_format: build.format,
            compress_html: build.compress_html,
            assets_prefix: build.assets_prefix().map(str::to_string),
            component_metadata: input.component_metadata,
            entry_modules,
            assets,
            i18n: self.i18n(),
            csp: self.csp(),
        };
        Ok(Manifest::new(core, input.key))
    }

    fn i18n(&self) -> Option<I18nManifest> {
        let i18n = self.config.i18n.as_ref()?;
        Some(I18nManifest {
            fallback: i18n.fallback.clone(),
            fallback_type: i18n.fallback_type,
            strategy: i18n.strategy,
            locales: i18n.locales.clone(),
            default_locale: i18n.default_locale.clone(),
            domain_lookup_table: i18n.domain_lookup_table(),
        })
    }

    fn csp(&self) -> Option<CspManifest> {
        let csp = self.config.security.csp.as_ref()?;
        Some(CspManifest {
            algorithm: csp.algorithm,
            directives: csp.directives.clone(),
            script_hashes: csp.script_hashes.clone(),
            script_resources: csp.script_resources.clone(),
            style_hashes: csp.style_hashes.clone(),
            style_resources: csp.style_resources.clone(),
            is_strict_dynamic: csp.strict_dynamic,
        })
    }
}

fn ensure_emitted(
    static_files: &BTreeSet<String>,
    file: &str,
    page: &str,
) -> Result<(), ManifestError> {
    if static_files.contains(file) {
        Ok(())
    } else {
        Err(ManifestError::MissingAsset {
            filename: file.to_string(),
            page: page.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CspConfig, I18nConfig, InjectedScript, Locale};
    use crate::core::{BuildFormat, OutputMode};
    use crate::graph::{ModuleGraph, ModuleInfo};
    use crate::route::RouteType;

    const BLOG: &str = "src/pages/blog/[slug].astro";
    const ABOUT: &str = "src/pages/about.astro";

    fn page(id: &str, imports: &[&str]) -> ModuleInfo {
        let mut m = ModuleInfo::new(id);
        m.imported_ids = imports.iter().map(|s| s.to_string()).collect();
        m.meta.page = Some(id.to_string());
        m
    }

    fn config() -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.build.mode = OutputMode::Server;
        config.build.adapter = "node".into();
        config.build.inline_stylesheets = InlineStylesheets::Never;
        config
    }

    fn routes() -> Vec<RouteDescriptor> {
        vec![
            RouteDescriptor::new("/about", ABOUT, RouteType::Page, true).unwrap(),
            RouteDescriptor::new("/blog/[slug]", BLOG, RouteType::Page, false).unwrap(),
            RouteDescriptor::new("/tags/[tag]", "src/pages/tags/[tag].astro", RouteType::Page, true)
                .unwrap(),
        ]
    }

    /// Registry where the blog page owns `_assets/blog.css` and a hoisted script.
    fn registry() -> PageAssetRegistry {
        let graph = ModuleGraph::from_modules(vec![
            page(BLOG, &["src/styles/blog.css"]),
            ModuleInfo::new("src/styles/blog.css"),
        ]);
        let registry = PageAssetRegistry::new();
        registry.attribute_chunk(&graph, &["src/styles/blog.css".to_string()], &["_assets/blog.css"]);
        registry.set_hoisted_script(BLOG, ScriptDescriptor::external("_assets/hoisted.js"));
        registry
    }

    fn input<'a>(
        routes: &'a [RouteDescriptor],
        sources: &'a FxHashMap<String, String>,
    ) -> AssemblyInput<'a> {
        AssemblyInput {
            routes,
            entry_modules: BTreeMap::from([(format!("@page:{BLOG}"), "pages/blog.mjs".to_string())]),
            static_files: ["_assets/blog.css", "_assets/hoisted.js"]
                .into_iter()
                .map(String::from)
                .collect(),
            asset_sources: sources,
            component_metadata: BTreeMap::new(),
            key: EncryptionKey::derive(b"assemble"),
        }
    }

    #[test]
    fn test_assemble_routes_and_assets() {
        let config = config();
        let registry = registry();
        let order = ImportOrder::new();
        let routes = routes();
        let sources = FxHashMap::default();

        let manifest = ManifestAssembler::new(&config, &registry, &order)
            .assemble(input(&routes, &sources))
            .unwrap();

        // Prerendered dynamic route is left out.
        let listed: Vec<&str> = manifest.routes().iter().map(|r| r.route.route()).collect();
        assert_eq!(listed, ["/about", "/blog/[slug]"]);

        let about = &manifest.routes()[0];
        assert_eq!(about.file, "about/index.html");
        assert!(about.styles.is_empty() && about.scripts.is_empty());

        let blog = &manifest.routes()[1];
        assert_eq!(blog.file, "");
        assert_eq!(
            blog.styles,
            vec![StylesheetAsset::External { src: "/_assets/blog.css".into() }]
        );
        assert_eq!(blog.scripts, vec![ScriptDescriptor::external("/_assets/hoisted.js")]);

        let core = &manifest.core;
        assert_eq!(core.adapter_name, "node");
        assert!(core.assets.contains("/_assets/blog.css"));
        assert!(core.assets.contains("/about/index.html"));
        assert_eq!(core.entry_modules[BEFORE_HYDRATION_SCRIPT_ID], "");
    }

    #[test]
    fn test_every_page_asset_is_a_manifest_asset() {
        let config = config();
        let registry = registry();
        let order = ImportOrder::new();
        let routes = routes();
        let sources = FxHashMap::default();

        let manifest = ManifestAssembler::new(&config, &registry, &order)
            .assemble(input(&routes, &sources))
            .unwrap();

        for route in manifest.routes() {
            for style in &route.styles {
                if let StylesheetAsset::External { src } = style {
                    assert!(manifest.core.assets.contains(src), "{src}");
                }
            }
            for src in route.scripts.iter().filter_map(ScriptDescriptor::external_src) {
                assert!(manifest.core.assets.contains(src), "{src}");
            }
        }
    }

    #[test]
    fn test_missing_asset_names_file_and_page() {
        let config = config();
        let registry = registry();
        let order = ImportOrder::new();
        let routes = routes();
        let sources = FxHashMap::default();
        let mut input = input(&routes, &sources);
        input.static_files.remove("_assets/blog.css");

        let err = ManifestAssembler::new(&config, &registry, &order)
            .assemble(input)
            .unwrap_err();
        match &err {
            ManifestError::MissingAsset { filename, page } => {
                assert_eq!(filename, "_assets/blog.css");
                assert_eq!(page, BLOG);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_internal());
    }

    #[test]
    fn test_unresolved_page_module() {
        let config = config();
        let registry = registry();
        let order = ImportOrder::new();
        let routes = routes();
        let sources = FxHashMap::default();
        let mut input = input(&routes, &sources);
        input.entry_modules.clear();

        let err = ManifestAssembler::new(&config, &registry, &order)
            .assemble(input)
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::UnresolvedPageModule { ref route, .. } if route.component == BLOG
        ));
    }

    #[test]
    fn test_inline_and_prefixed_styles() {
        let mut config = config();
        config.build.inline_stylesheets = InlineStylesheets::Auto;
        config.build.inline_limit = 8;
        config.build.assets_prefix = Some("https://cdn.example.com".into());

        let graph = ModuleGraph::from_modules(vec![
            page(BLOG, &["src/a.css", "src/b.css", "src/c.css"]),
            ModuleInfo::new("src/a.css"),
            ModuleInfo::new("src/b.css"),
            ModuleInfo::new("src/c.css"),
        ]);
        let registry = PageAssetRegistry::new();
        for (module, file) in [("src/a.css", "a.css"), ("src/b.css", "b.css"), ("src/c.css", "c.css")] {
            registry.attribute_chunk(&graph, &[module.to_string()], &[file]);
        }
        let order: ImportOrder = ["src/a.css", "src/b.css", "src/c.css"].into_iter().collect();
        let sources: FxHashMap<String, String> = [
            ("a.css", "a{}"),
            ("b.css", "b{}"),
            ("c.css", "c{color:red}"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let routes = routes();
        let mut input = input(&routes, &sources);
        input.static_files.insert("c.css".into());

        let head = ManifestAssembler::new(&config, &registry, &order)
            .head_for(BLOG, &input)
            .unwrap();
        assert_eq!(
            head.styles,
            vec![
                StylesheetAsset::Inline { content: "a{}b{}".into() },
                StylesheetAsset::External { src: "https://cdn.example.com/c.css".into() },
            ]
        );
    }

    #[test]
    fn test_injected_scripts() {
        let mut config = config();
        config.scripts = vec![
            InjectedScript {
                stage: ScriptStage::Page,
                content: "import 'x';".into(),
            },
            InjectedScript {
                stage: ScriptStage::HeadInline,
                content: "window.a = 1;".into(),
            },
        ];
        let registry = PageAssetRegistry::new();
        let order = ImportOrder::new();
        let routes = routes();
        let sources = FxHashMap::default();
        let assembler = ManifestAssembler::new(&config, &registry, &order);

        let mut input = input(&routes, &sources);
        assert!(matches!(
            assembler.head_for(BLOG, &input),
            Err(ManifestError::MissingEntryModule { .. })
        ));

        input
            .entry_modules
            .insert(PAGE_SCRIPT_ID.into(), "_assets/page.js".into());
        let manifest = assembler.assemble(input).unwrap();
        assert_eq!(
            manifest.routes()[1].scripts,
            vec![
                ScriptDescriptor::external("/_assets/page.js"),
                ScriptDescriptor::Injected {
                    stage: ScriptStage::HeadInline,
                    children: "window.a = 1;".into(),
                },
            ]
        );
        assert!(manifest.core.assets.contains("/_assets/page.js"));
    }

    #[test]
    fn test_global_config_fields() {
        let mut config = config();
        config.site.url = Some("https://example.com".into());
        config.site.base = "/docs".into();
        config.build.format = BuildFormat::File;
        config.i18n = Some(I18nConfig {
            default_locale: "en".into(),
            locales: vec![Locale::Code("en".into()), Locale::Code("pt_BR".into())],
            domains: BTreeMap::from([("pt_BR".into(), "https://example.com.br".into())]),
            ..Default::default()
        });
        config.security.csp = Some(CspConfig {
            strict_dynamic: true,
            ..Default::default()
        });
        let registry = registry();
        let order = ImportOrder::new();
        let routes = routes();
        let sources = FxHashMap::default();

        let manifest = ManifestAssembler::new(&config, &registry, &order)
            .assemble(input(&routes, &sources))
            .unwrap();
        let core = &manifest.core;
        assert_eq!(core.site.as_deref(), Some("https://example.com"));
        assert_eq!(core.routes[0].file, "about.html");
        assert!(core.assets.contains("/docs/about.html"));
        assert_eq!(
            core.i18n.as_ref().unwrap().domain_lookup_table["https://example.com.br"],
            "pt-br"
        );
        assert!(core.csp.as_ref().unwrap().is_strict_dynamic);
    }
}
