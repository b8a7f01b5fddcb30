//! Output path conflicts between prerendered routes.
//!
//! Routes claim paths in priority order, so the first claim on a path
//! belongs to the more specific route. A claim covers both the request
//! path, compared without its trailing slash, and the output file: page
//! `/a` and endpoint `/a.html` both write `a.html` in `file` format.

use crate::core::path::remove_trailing_forward_slash;
use crate::error::BuildError;
use crate::log;
use crate::route::RouteIdentity;
use rustc_hash::FxHashMap;

/// Two routes generating the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerenderConflict {
    pub path: String,
    /// Higher priority route, whose page is kept.
    pub winner: RouteIdentity,
    /// Route whose page is dropped.
    pub loser: RouteIdentity,
}

impl PrerenderConflict {
    pub fn into_error(self) -> BuildError {
        BuildError::PrerenderRouteConflict {
            path: self.path,
            winner: self.winner,
            loser: self.loser,
        }
    }
}

/// Result of claiming a path.
#[derive(Debug, PartialEq, Eq)]
pub enum Claim {
    /// First claim; the page gets this slot.
    New(usize),
    /// The same route claimed the path before, at this slot.
    Repeated(usize),
    Conflict(PrerenderConflict),
}

/// Path and output file → claiming route and the page slot it was given.
#[derive(Debug, Default)]
pub struct PathClaims {
    paths: FxHashMap<String, (RouteIdentity, usize)>,
    files: FxHashMap<String, (RouteIdentity, usize)>,
}

impl PathClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path`, written to `file`, for `route`; `slot` is the page
    /// index it would get.
    pub fn claim(&mut self, path: &str, file: &str, route: &RouteIdentity, slot: usize) -> Claim {
        let key = conflict_key(path);
        let owner = self.paths.get(&key).or_else(|| self.files.get(file));
        match owner {
            Some((owner, prev)) if owner == route => Claim::Repeated(*prev),
            Some((owner, _)) => Claim::Conflict(PrerenderConflict {
                path: path.to_string(),
                winner: owner.clone(),
                loser: route.clone(),
            }),
            None => {
                self.paths.insert(key, (route.clone(), slot));
                self.files.insert(file.to_string(), (route.clone(), slot));
                Claim::New(slot)
            }
        }
    }

    /// Number of claimed paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn conflict_key(path: &str) -> String {
    match remove_trailing_forward_slash(path) {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Print skipped conflicts.
///
/// ```text
/// [warn] 2 conflicting paths skipped
///   /blog/index
///     kept:    /blog/index (src/pages/blog/index.astro)
///     skipped: /blog/[slug] (src/pages/blog/[slug].astro)
/// ```
pub fn print_conflicts(conflicts: &[PrerenderConflict]) {
    if conflicts.is_empty() {
        return;
    }
    let s = if conflicts.len() == 1 { "" } else { "s" };
    log!("warn"; "{} conflicting path{s} skipped", conflicts.len());
    for conflict in conflicts {
        eprintln!("  {}", conflict.path);
        eprintln!("    kept:    {}", conflict.winner);
        eprintln!("    skipped: {}", conflict.loser);
    }
}
