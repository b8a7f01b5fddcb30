//! Build-level errors.
//!
//! Every phase has its own typed error; [`BuildError`] wraps them for the
//! pipeline and classifies each as a project problem or a framework bug.

use crate::cache::RouteCacheError;
use crate::config::ConfigError;
use crate::manifest::ManifestError;
use crate::route::{RouteError, RouteIdentity};
use std::path::PathBuf;
use thiserror::Error;

/// Who has to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Fixable in the project: config, routes, enumeration data.
    Config,
    /// A framework bug.
    Internal,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    RouteCache(#[from] RouteCacheError),

    #[error(
        "could not render `{path}` from route {loser}: \
         it conflicts with higher priority route {winner}"
    )]
    PrerenderRouteConflict {
        path: String,
        winner: RouteIdentity,
        loser: RouteIdentity,
    },

    #[error("bundler failed")]
    Bundle(#[source] anyhow::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("cannot access `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid JSON in `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),
}

impl BuildError {
    pub fn class(&self) -> ErrorClass {
        let internal = match self {
            Self::RouteCache(e) => e.is_internal(),
            Self::Manifest(e) => e.is_internal(),
            _ => false,
        };
        if internal {
            ErrorClass::Internal
        } else {
            ErrorClass::Config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(route: &str) -> RouteIdentity {
        RouteIdentity {
            route: route.into(),
            component: format!("src/pages{route}.astro"),
        }
    }

    #[test]
    fn test_conflict_names_both_routes() {
        let err = BuildError::PrerenderRouteConflict {
            path: "/blog".into(),
            winner: identity("/blog"),
            loser: identity("/[section]"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/blog"));
        assert!(msg.contains("/[section]"));
        assert_eq!(err.class(), ErrorClass::Config);
    }

    #[test]
    fn test_class() {
        let sealed = BuildError::from(RouteCacheError::Sealed {
            route: identity("/a"),
        });
        assert_eq!(sealed.class(), ErrorClass::Internal);
        assert!(sealed.to_string().contains("internal error"));

        let missing = BuildError::from(RouteCacheError::MissingGetStaticPaths {
            route: identity("/[a]"),
        });
        assert_eq!(missing.class(), ErrorClass::Config);

        let asset = BuildError::from(ManifestError::MissingAsset {
            filename: "a.css".into(),
            page: "src/pages/a.astro".into(),
        });
        assert_eq!(asset.class(), ErrorClass::Internal);

        let key = BuildError::from(ManifestError::InvalidKey {
            reason: "bad".into(),
        });
        assert_eq!(key.class(), ErrorClass::Config);
    }
}
