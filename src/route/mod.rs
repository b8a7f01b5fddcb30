//! Routes: descriptors, patterns, parameters and pagination.
//!
//! | Module     | Purpose                                          |
//! |------------|--------------------------------------------------|
//! | `pattern`  | Parse, generate, match and rank route patterns   |
//! | `params`   | Typed param values and the canonical key codec   |
//! | `paginate` | Expand a data list into numbered page entries    |
//! | `output`   | Output file of a generated path                  |

pub mod output;
pub mod paginate;
pub mod params;
pub mod pattern;

pub use output::output_file;
pub use paginate::{PaginateOptions, paginate};
pub use params::{ParamKeyCodec, ParamValue, Params, StaticPathItem};
pub use pattern::{RoutePart, RoutePattern, Segment};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Prefix of the virtual module that resolves to a page's compiled entry.
pub const PAGE_MODULE_PREFIX: &str = "@page:";

// ============================================================================
// RouteError
// ============================================================================

/// Route-level errors. All of these trace back to project files.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route `{route}`: {reason}")]
    InvalidPattern { route: String, reason: String },

    #[error(
        "invalid path param `{key}` in `{component}`: expected a string, a number or undefined, \
         got `{value}` ({kind})"
    )]
    InvalidParamType {
        component: String,
        key: String,
        value: String,
        kind: &'static str,
    },

    #[error("missing parameter `{param}` when generating a path for `{route}`")]
    MissingParam { route: String, param: String },

    #[error(
        "parameter `{param}` of `{route}` contains a slash (`{value}`); \
         use a rest parameter such as `[...{param}]` to match several segments"
    )]
    SlashInParam {
        route: String,
        param: String,
        value: String,
    },

    #[error("route `{route}` has no `[page]` or `[...page]` parameter to paginate with")]
    PageParamNotFound { route: String },
}

// ============================================================================
// RouteType / RouteIdentity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    /// Renders HTML.
    Page,
    /// Produces an arbitrary response body (`/feed.xml`, `/api/data.json`).
    Endpoint,
}

/// Route pattern plus component: unique per route, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteIdentity {
    pub route: String,
    pub component: String,
}

impl fmt::Display for RouteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.route, self.component)
    }
}

// ============================================================================
// RouteDescriptor
// ============================================================================

/// A route as discovered from the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub pattern: RoutePattern,
    /// Project-relative source file, e.g. `src/pages/blog/[slug].astro`.
    pub component: String,
    pub kind: RouteType,
    pub prerender: bool,
}

impl RouteDescriptor {
    pub fn new(
        route: &str,
        component: impl Into<String>,
        kind: RouteType,
        prerender: bool,
    ) -> Result<Self, RouteError> {
        let pattern = RoutePattern::parse(route)?;
        if kind == RouteType::Page && pattern.has_embedded_spread() {
            return Err(RouteError::InvalidPattern {
                route: route.to_string(),
                reason: "rest parameter must be a standalone segment".to_string(),
            });
        }
        Ok(Self {
            pattern,
            component: component.into(),
            kind,
            prerender,
        })
    }

    #[inline]
    pub fn route(&self) -> &str {
        self.pattern.route()
    }

    #[inline]
    pub fn params(&self) -> &[String] {
        self.pattern.params()
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        self.pattern.segments()
    }

    /// Fixed request path of a route without parameters.
    pub fn pathname(&self) -> Option<String> {
        self.pattern.pathname()
    }

    pub fn identity(&self) -> RouteIdentity {
        RouteIdentity {
            route: self.route().to_string(),
            component: self.component.clone(),
        }
    }

    /// Virtual module id the bundler uses for this route's page entry.
    pub fn page_module_specifier(&self) -> String {
        format!("{PAGE_MODULE_PREFIX}{}", self.component)
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.route(), self.component)
    }
}
