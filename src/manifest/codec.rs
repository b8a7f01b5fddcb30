//! Transport form of the manifest.
//!
//! Maps become arrays of pairs or sorted arrays, the key becomes hex, and
//! runtime extras are dropped. Every route field is required on the way
//! back in; a missing one fails decoding instead of taking a default.

use super::{
    ComponentMetadata, CspManifest, EncryptionKey, I18nManifest, Manifest, ManifestCore,
    ManifestError, RouteInfo,
};
use crate::asset::{ScriptDescriptor, StylesheetAsset};
use crate::core::{BuildFormat, TrailingSlash};
use crate::route::{RouteDescriptor, RouteType, Segment};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Route data with the matcher precomputed for the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRouteData {
    pub route: String,
    #[serde(rename = "type")]
    pub kind: RouteType,
    /// Regex source of the request matcher.
    pub pattern: String,
    pub params: Vec<String>,
    pub component: String,
    /// `null` for dynamic routes, but never absent.
    #[serde(deserialize_with = "present")]
    pub pathname: Option<String>,
    pub prerender: bool,
    pub segments: Vec<Segment>,
}

/// An optional field that must still be spelled out. `deserialize_with`
/// turns off serde's implicit `None` for a missing `Option`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRouteInfo {
    pub file: String,
    pub links: Vec<String>,
    pub scripts: Vec<ScriptDescriptor>,
    pub styles: Vec<StylesheetAsset>,
    pub route_data: SerializedRouteData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedManifest {
    pub adapter_name: String,
    pub routes: Vec<SerializedRouteInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub base: String,
    pub trailing_slash: TrailingSlash,
    pub build_format: BuildFormat,
    #[serde(rename = "compressHTML")]
    pub compress_html: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_prefix: Option<String>,
    pub component_metadata: Vec<(String, ComponentMetadata)>,
    pub entry_modules: BTreeMap<String, String>,
    pub assets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i18n: Option<I18nManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csp: Option<CspManifest>,
    pub key: String,
}

// ============================================================================
// serialize
// ============================================================================

pub fn serialize(manifest: &Manifest) -> SerializedManifest {
    let core = &manifest.core;
    SerializedManifest {
        adapter_name: core.adapter_name.clone(),
        routes: core
            .routes
            .iter()
            .map(|r| serialize_route(r, core.trailing_slash))
            .collect(),
        site: core.site.clone(),
        base: core.base.clone(),
        trailing_slash: core.trailing_slash,
        build_format: core.build_format,
        compress_html: core.compress_html,
        assets_prefix: core.assets_prefix.clone(),
        component_metadata: core
            .component_metadata
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect(),
        entry_modules: core.entry_modules.clone(),
        assets: core.assets.iter().cloned().collect(),
        i18n: core.i18n.clone(),
        csp: core.csp.clone(),
        key: manifest.key.export(),
    }
}

fn serialize_route(info: &RouteInfo, trailing: TrailingSlash) -> SerializedRouteInfo {
    let route = &info.route;
    SerializedRouteInfo {
        file: info.file.clone(),
        links: info.links.clone(),
        scripts: info.scripts.clone(),
        styles: info.styles.clone(),
        route_data: SerializedRouteData {
            route: route.route().to_string(),
            kind: route.kind,
            pattern: route.pattern.pattern_source(trailing),
            params: route.params().to_vec(),
            component: route.component.clone(),
            pathname: route.pathname(),
            prerender: route.prerender,
            segments: route.segments().to_vec(),
        },
    }
}

// ============================================================================
// deserialize
// ============================================================================

/// Rebuild a manifest. Runtime extras start empty.
pub fn deserialize(serialized: SerializedManifest) -> Result<Manifest, ManifestError> {
    let key = EncryptionKey::import(&serialized.key)?;
    let trailing = serialized.trailing_slash;

    let routes = serialized
        .routes
        .into_iter()
        .map(|r| deserialize_route(r, trailing))
        .collect::<Result<Vec<_>, _>>()?;

    let core = ManifestCore {
        adapter_name: serialized.adapter_name,
        routes,
        site: serialized.site,
        base: serialized.base,
        trailing_slash: trailing,
        build_format: serialized.build_format,
        compress_html: serialized.compress_html,
        assets_prefix: serialized.assets_prefix,
        component_metadata: serialized.component_metadata.into_iter().collect(),
        entry_modules: serialized.entry_modules,
        assets: serialized.assets.into_iter().collect(),
        i18n: serialized.i18n,
        csp: serialized.csp,
    };
    Ok(Manifest::new(core, key))
}

/// Re-parse the route and check the derived fields agree with it.
fn deserialize_route(
    info: SerializedRouteInfo,
    trailing: TrailingSlash,
) -> Result<RouteInfo, ManifestError> {
    let data = info.route_data;
    let corrupt = |reason: String| ManifestError::CorruptRoute {
        route: data.route.clone(),
        reason,
    };

    let route = RouteDescriptor::new(&data.route, data.component.clone(), data.kind, data.prerender)
        .map_err(|e| corrupt(e.to_string()))?;

    if route.segments() != data.segments.as_slice() {
        return Err(corrupt("segments do not match the route".into()));
    }
    if route.params() != data.params.as_slice() {
        return Err(corrupt("params do not match the route".into()));
    }
    if route.pathname() != data.pathname {
        return Err(corrupt("pathname does not match the route".into()));
    }
    if route.pattern.pattern_source(trailing) != data.pattern {
        return Err(corrupt("pattern does not match the route".into()));
    }

    Ok(RouteInfo {
        route,
        file: info.file,
        links: info.links,
        scripts: info.scripts,
        styles: info.styles,
    })
}

impl SerializedManifest {
    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Propagation;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn core(routes: Vec<RouteInfo>) -> ManifestCore {
        ManifestCore {
            adapter_name: "node".into(),
            routes,
            site: Some("https://example.com".into()),
            base: "/".into(),
            trailing_slash: TrailingSlash::Ignore,
            build_format: BuildFormat::Directory,
            compress_html: true,
            assets_prefix: None,
            component_metadata: BTreeMap::new(),
            entry_modules: BTreeMap::new(),
            assets: BTreeSet::new(),
            i18n: None,
            csp: None,
        }
    }

    fn route(pattern: &str, component: &str, prerender: bool) -> RouteInfo {
        RouteInfo {
            route: RouteDescriptor::new(pattern, component, RouteType::Page, prerender).unwrap(),
            file: String::new(),
            links: Vec::new(),
            scripts: Vec::new(),
            styles: Vec::new(),
        }
    }

    fn round_trip(manifest: &Manifest) -> Manifest {
        let json = serialize(manifest).to_json().unwrap();
        deserialize(SerializedManifest::from_json(&json).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trip_zero_routes() {
        let manifest = Manifest::new(core(Vec::new()), EncryptionKey::derive(b"empty"));
        assert_eq!(round_trip(&manifest), manifest);
    }

    #[test]
    fn test_round_trip_route_without_assets() {
        let mut about = route("/about", "src/pages/about.astro", true);
        about.file = "about/index.html".into();
        let mut c = core(vec![about]);
        c.assets.insert("/about/index.html".into());
        let manifest = Manifest::new(c, EncryptionKey::derive(b"one"));
        assert_eq!(round_trip(&manifest), manifest);
    }

    #[test]
    fn test_round_trip_shared_assets() {
        let shared = StylesheetAsset::External {
            src: "/_assets/shared.css".into(),
        };
        let mut a = route("/a/[id]", "src/pages/a/[id].astro", false);
        a.styles = vec![shared.clone()];
        a.scripts = vec![ScriptDescriptor::external("/_assets/hoisted.js")];
        let mut b = route("/b/[...rest]", "src/pages/b/[...rest].astro", false);
        b.styles = vec![
            shared,
            StylesheetAsset::Inline {
                content: "b{}".into(),
            },
        ];

        let mut c = core(vec![a, b]);
        c.trailing_slash = TrailingSlash::Always;
        c.assets = ["/_assets/shared.css", "/_assets/hoisted.js"]
            .into_iter()
            .map(String::from)
            .collect();
        c.component_metadata.insert(
            "src/pages/a/[id].astro".into(),
            ComponentMetadata {
                propagation: Propagation::InTree,
                contains_head: true,
            },
        );
        c.entry_modules
            .insert("@page:src/pages/a/[id].astro".into(), "pages/a.mjs".into());

        let manifest = Manifest::new(c, EncryptionKey::derive(b"shared"));
        let back = round_trip(&manifest);
        assert_eq!(back, manifest);
        assert!(back.match_route("/b/x/y/").is_some());
    }

    #[test]
    fn test_key_survives_and_extras_are_dropped() {
        struct Allow;
        impl crate::manifest::Middleware for Allow {
            fn on_request(&self, _: &RouteDescriptor, _: &str) -> bool {
                true
            }
        }

        let key = EncryptionKey::generate();
        let manifest = Manifest::new(core(Vec::new()), key.clone()).with_middleware(Arc::new(Allow));
        let serialized = serialize(&manifest);
        assert_eq!(serialized.key, key.export());

        let back = deserialize(serialized).unwrap();
        assert_eq!(back.key, key);
        assert!(back.extras.middleware.is_none());
        assert_eq!(back, manifest);
    }

    #[test]
    fn test_wire_field_names() {
        let manifest = Manifest::new(
            core(vec![route("/[slug]", "src/pages/[slug].astro", false)]),
            EncryptionKey::derive(b"names"),
        );
        let value = serde_json::to_value(serialize(&manifest)).unwrap();
        for field in [
            "adapterName",
            "routes",
            "site",
            "base",
            "trailingSlash",
            "compressHTML",
            "entryModules",
            "assets",
            "key",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        let data = &value["routes"][0]["routeData"];
        assert_eq!(data["type"], "page");
        assert_eq!(data["pattern"], "^\\/([^/]+?)\\/?$");
    }

    #[test]
    fn test_missing_route_field_is_rejected() {
        let manifest = Manifest::new(
            core(vec![route("/about", "src/pages/about.astro", true)]),
            EncryptionKey::derive(b"strict"),
        );
        let mut value = serde_json::to_value(serialize(&manifest)).unwrap();
        value["routes"][0]["routeData"]
            .as_object_mut()
            .unwrap()
            .remove("segments");
        let err = SerializedManifest::from_json(&value.to_string()).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_missing_pathname_is_rejected() {
        let manifest = Manifest::new(
            core(vec![route("/[slug]", "src/pages/[slug].astro", false)]),
            EncryptionKey::derive(b"pathname"),
        );
        let mut value = serde_json::to_value(serialize(&manifest)).unwrap();
        assert!(value["routes"][0]["routeData"]["pathname"].is_null());
        assert!(SerializedManifest::from_json(&value.to_string()).is_ok());

        value["routes"][0]["routeData"]
            .as_object_mut()
            .unwrap()
            .remove("pathname");
        let err = SerializedManifest::from_json(&value.to_string()).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_tampered_pattern_is_rejected() {
        let manifest = Manifest::new(
            core(vec![route("/about", "src/pages/about.astro", true)]),
            EncryptionKey::derive(b"tamper"),
        );
        let mut serialized = serialize(&manifest);
        serialized.routes[0].route_data.pattern = "^.*$".into();
        assert!(matches!(
            deserialize(serialized),
            Err(ManifestError::CorruptRoute { .. })
        ));
    }

    #[test]
    fn test_bad_key_is_a_hard_failure() {
        let mut serialized = serialize(&Manifest::new(core(Vec::new()), EncryptionKey::derive(b"k")));
        serialized.key = "zz".into();
        assert!(matches!(
            deserialize(serialized),
            Err(ManifestError::InvalidKey { .. })
        ));
    }
}
