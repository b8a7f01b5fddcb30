//! Build plan: the route list and static-path data for one build.
//!
//! ```json
//! {
//!   "routes": [
//!     { "route": "/about", "component": "src/pages/about.astro" },
//!     {
//!       "route": "/blog/[slug]",
//!       "component": "src/pages/blog/[slug].astro",
//!       "staticPaths": [{ "params": { "slug": "hello" } }]
//!     },
//!     {
//!       "route": "/posts/[...page]",
//!       "component": "src/pages/posts/[...page].astro",
//!       "paginate": { "data": [1, 2, 3], "pageSize": 2 }
//!     },
//!     { "route": "/api/[id]", "component": "src/pages/api/[id].ts", "type": "endpoint", "prerender": false }
//!   ]
//! }
//! ```

use super::RouteDefinition;
use crate::cache::{GetStaticPaths, StaticPathsContext};
use crate::error::BuildError;
use crate::route::{PaginateOptions, RouteDescriptor, RouteError, RouteType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildPlan {
    pub routes: Vec<PlannedRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRoute {
    pub route: String,
    pub component: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: RouteType,
    #[serde(default = "default_prerender")]
    pub prerender: bool,
    /// Literal `getStaticPaths()` result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_paths: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paginate: Option<PlannedPagination>,
}

fn default_kind() -> RouteType {
    RouteType::Page
}

fn default_prerender() -> bool {
    true
}

/// `getStaticPaths()` that paginates a fixed data list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannedPagination {
    pub data: Vec<Value>,
    pub page_size: Option<usize>,
    pub params: Map<String, Value>,
    pub props: Map<String, Value>,
}

impl GetStaticPaths for PlannedPagination {
    fn get_static_paths(&self, ctx: &StaticPathsContext<'_>) -> anyhow::Result<Value> {
        let options = PaginateOptions {
            page_size: self.page_size,
            params: self.params.clone(),
            props: self.props.clone(),
        };
        Ok(ctx.paginate(&self.data, &options)?)
    }
}

/// `getStaticPaths()` returning a fixed value.
struct LiteralPaths(Value);

impl GetStaticPaths for LiteralPaths {
    fn get_static_paths(&self, _ctx: &StaticPathsContext<'_>) -> anyhow::Result<Value> {
        Ok(self.0.clone())
    }
}

impl BuildPlan {
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let json =
            fs::read_to_string(path).map_err(|e| BuildError::Io(path.to_path_buf(), e))?;
        serde_json::from_str(&json).map_err(|e| BuildError::Json(path.to_path_buf(), e))
    }

    /// Parse every route, in plan order.
    pub fn into_definitions(self) -> Result<Vec<RouteDefinition>, RouteError> {
        self.routes
            .into_iter()
            .map(|planned| {
                let descriptor = RouteDescriptor::new(
                    &planned.route,
                    planned.component,
                    planned.kind,
                    planned.prerender,
                )?;
                let get_static_paths: Option<Arc<dyn GetStaticPaths>> =
                    match (planned.static_paths, planned.paginate) {
                        (Some(value), _) => Some(Arc::new(LiteralPaths(value))),
                        (None, Some(pagination)) => Some(Arc::new(pagination)),
                        (None, None) => None,
                    };
                Ok(RouteDefinition {
                    descriptor,
                    get_static_paths,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TrailingSlash;
    use serde_json::json;

    fn plan() -> BuildPlan {
        serde_json::from_value(json!({
            "routes": [
                { "route": "/about", "component": "src/pages/about.astro" },
                {
                    "route": "/blog/[slug]",
                    "component": "src/pages/blog/[slug].astro",
                    "staticPaths": [{ "params": { "slug": "hello" } }]
                },
                {
                    "route": "/posts/[...page]",
                    "component": "src/pages/posts/[...page].astro",
                    "paginate": { "data": [1, 2, 3], "pageSize": 2 }
                },
                {
                    "route": "/api/[id]",
                    "component": "src/pages/api/[id].ts",
                    "type": "endpoint",
                    "prerender": false
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_definitions() {
        let defs = plan().into_definitions().unwrap();
        assert_eq!(defs.len(), 4);
        assert!(defs[0].get_static_paths.is_none());
        assert!(defs[0].descriptor.prerender);
        assert_eq!(defs[3].descriptor.kind, RouteType::Endpoint);
        assert!(!defs[3].descriptor.prerender);

        let ctx = StaticPathsContext {
            route: &defs[1].descriptor,
            trailing_slash: TrailingSlash::Ignore,
            base: "/",
        };
        let paths = defs[1].get_static_paths.as_ref().unwrap();
        assert_eq!(
            paths.get_static_paths(&ctx).unwrap(),
            json!([{ "params": { "slug": "hello" } }])
        );
    }

    #[test]
    fn test_paginated_route() {
        let defs = plan().into_definitions().unwrap();
        let ctx = StaticPathsContext {
            route: &defs[2].descriptor,
            trailing_slash: TrailingSlash::Ignore,
            base: "/",
        };
        let value = defs[2]
            .get_static_paths
            .as_ref()
            .unwrap()
            .get_static_paths(&ctx)
            .unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_route_is_rejected() {
        let plan: BuildPlan = serde_json::from_value(json!({
            "routes": [{ "route": "/[a][b]", "component": "src/pages/x.astro" }]
        }))
        .unwrap();
        assert!(matches!(
            plan.into_definitions(),
            Err(RouteError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strata.plan.json");
        fs::write(&path, "{ routes: ").unwrap();
        let err = BuildPlan::load(&path).unwrap_err();
        assert!(matches!(err, BuildError::Json(ref p, _) if p == &path));
    }
}
