//! Route cache: enumerate each route's static paths once per build.
//!
//! Each route owns a slot that moves `Empty -> Resolved`. Resolving holds the
//! slot's lock while the enumeration function runs, so concurrent callers
//! for the same route wait for the first result instead of enumerating
//! again. Once the cache is sealed, an `Empty` slot can no longer be filled.
//!
//! ```text
//! resolve(route) ─┬─ Resolved ─────────────────────────► cached entry
//!                 ├─ sealed ───────────────────────────► Sealed error
//!                 ├─ on-demand route, server build ────► empty entry (no call)
//!                 └─ otherwise: enumerate, validate, key ► new entry
//! ```

mod validate;


use crate::core::{OutputMode, TrailingSlash};
use crate::route::{
    PaginateOptions, ParamKeyCodec, Params, RouteDescriptor, RouteError, RouteIdentity,
    StaticPathItem, paginate,
};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use validate::validate_static_paths;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum RouteCacheError {
    #[error(
        "`getStaticPaths()` is required for dynamic route {route}; \
         export it from the component or mark the route as not prerendered"
    )]
    MissingGetStaticPaths { route: RouteIdentity },

    #[error(
        "invalid `getStaticPaths()` return value in `{component}`: \
         expected an array of path objects, got `{received}` ({kind})"
    )]
    InvalidReturn {
        component: String,
        received: String,
        kind: &'static str,
    },

    #[error(
        "invalid entry #{index} returned by `getStaticPaths()` in `{component}`: \
         expected an object, got `{received}` ({kind})"
    )]
    InvalidEntry {
        component: String,
        index: usize,
        received: String,
        kind: &'static str,
    },

    #[error(
        "entry #{index} returned by `getStaticPaths()` in `{component}` has no `params` object \
         (got `{received}`)"
    )]
    MissingParams {
        component: String,
        index: usize,
        received: String,
    },

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("`getStaticPaths()` failed in `{component}`")]
    Enumeration {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "route cache was sealed, but `getStaticPaths()` was required for {route} after sealing. \
         This is an internal error, please file an issue."
    )]
    Sealed { route: RouteIdentity },

    #[error(
        "route cache snapshot entry `{key}` is corrupt: {reason}. \
         This is an internal error, please file an issue."
    )]
    CorruptSnapshot { key: String, reason: String },
}

impl RouteCacheError {
    /// Whether the framework, not the project, is at fault.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Sealed { .. } | Self::CorruptSnapshot { .. })
    }
}

// ============================================================================
// Enumeration interface
// ============================================================================

/// Helpers and route information handed to an enumeration function.
pub struct StaticPathsContext<'a> {
    pub route: &'a RouteDescriptor,
    pub trailing_slash: TrailingSlash,
    pub base: &'a str,
}

impl StaticPathsContext<'_> {
    /// Paginate `data` over this route's `[page]` parameter.
    pub fn paginate(&self, data: &[Value], options: &PaginateOptions) -> Result<Value, RouteError> {
        paginate(self.route, self.trailing_slash, self.base, data, options)
    }
}

/// A route's `getStaticPaths()`: returns the JSON array of path objects.
pub trait GetStaticPaths: Send + Sync {
    fn get_static_paths(&self, ctx: &StaticPathsContext<'_>) -> anyhow::Result<Value>;
}

impl<F> GetStaticPaths for F
where
    F: Fn(&StaticPathsContext<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    fn get_static_paths(&self, ctx: &StaticPathsContext<'_>) -> anyhow::Result<Value> {
        self(ctx)
    }
}

/// Build-wide settings that affect resolution.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub output: OutputMode,
    pub trailing_slash: TrailingSlash,
    pub base: String,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self {
            output: OutputMode::Static,
            trailing_slash: TrailingSlash::Ignore,
            base: "/".to_string(),
        }
    }
}

// ============================================================================
// RouteCacheEntry
// ============================================================================

/// Enumerated paths of one route plus the key index for reverse lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCacheEntry {
    route: RouteIdentity,
    trailing_slash: TrailingSlash,
    static_paths: Vec<StaticPathItem>,
    keyed: FxHashMap<String, usize>,
}

/// Shared handle to a resolved entry.
pub type KeyedStaticPaths = Arc<RouteCacheEntry>;

impl RouteCacheEntry {
    /// Key every item with the codec. A later item with the same key
    /// replaces an earlier one in the index.
    pub fn build(
        route: &RouteDescriptor,
        static_paths: Vec<StaticPathItem>,
        trailing_slash: TrailingSlash,
    ) -> Result<Self, RouteError> {
        let mut keyed = FxHashMap::default();
        for (i, item) in static_paths.iter().enumerate() {
            let key = ParamKeyCodec::encode(&item.params, route, trailing_slash)?;
            if let Some(prev) = keyed.insert(key.clone(), i) {
                crate::log!(
                    "warn";
                    "{route}: entries #{prev} and #{i} both produce `{key}`, keeping #{i}"
                );
            }
        }
        Ok(Self {
            route: route.identity(),
            trailing_slash,
            static_paths,
            keyed,
        })
    }

    pub fn empty(route: &RouteDescriptor, trailing_slash: TrailingSlash) -> Self {
        Self {
            route: route.identity(),
            trailing_slash,
            static_paths: Vec::new(),
            keyed: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn route(&self) -> &RouteIdentity {
        &self.route
    }

    /// Items in enumeration order.
    #[inline]
    pub fn static_paths(&self) -> &[StaticPathItem] {
        &self.static_paths
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.static_paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.static_paths.is_empty()
    }

    /// Item stored under a canonical key.
    pub fn get(&self, key: &str) -> Option<&StaticPathItem> {
        self.keyed.get(key).map(|&i| &self.static_paths[i])
    }

    /// Find the item for `params`; `Ok(None)` when nothing matches.
    pub fn lookup(
        &self,
        params: &Params,
        route: &RouteDescriptor,
    ) -> Result<Option<&StaticPathItem>, RouteError> {
        let key = ParamKeyCodec::encode(params, route, self.trailing_slash)?;
        Ok(self.get(&key))
    }

    /// Keys sorted for stable output.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keyed.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// One exported cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRouteCacheEntry {
    pub key: String,
    pub route: RouteIdentity,
    pub trailing_slash: TrailingSlash,
    pub static_paths: Vec<StaticPathItem>,
    /// `(key, index into static_paths)` pairs.
    pub keyed: Vec<(String, usize)>,
}

fn cache_key(route: &RouteIdentity) -> String {
    format!("{}::{}", route.route, route.component)
}

// ============================================================================
// RouteCache
// ============================================================================

enum Slot {
    Empty,
    Resolved(KeyedStaticPaths),
}

/// Per-build cache of enumerated static paths.
#[derive(Default)]
pub struct RouteCache {
    slots: Mutex<FxHashMap<RouteIdentity, Arc<Mutex<Slot>>>>,
    sealed: AtomicBool,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, route: &RouteIdentity) -> Arc<Mutex<Slot>> {
        self.slots
            .lock()
            .entry(route.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Slot::Empty)))
            .clone()
    }

    /// Return the route's entry, enumerating its paths on first use.
    pub fn resolve(
        &self,
        route: &RouteDescriptor,
        get_static_paths: Option<&dyn GetStaticPaths>,
        ctx: &ResolveContext,
    ) -> Result<KeyedStaticPaths, RouteCacheError> {
        let identity = route.identity();
        let slot = self.slot(&identity);
        let mut slot = slot.lock();

        if let Slot::Resolved(entry) = &*slot {
            crate::debug!("routes"; "cache hit for {identity}");
            return Ok(Arc::clone(entry));
        }
        if self.is_sealed() {
            return Err(RouteCacheError::Sealed { route: identity });
        }

        let entry = if ctx.output.is_server() && !route.prerender {
            RouteCacheEntry::empty(route, ctx.trailing_slash)
        } else {
            Self::enumerate(route, get_static_paths, ctx)?
        };

        let entry = Arc::new(entry);
        *slot = Slot::Resolved(Arc::clone(&entry));
        Ok(entry)
    }

    fn enumerate(
        route: &RouteDescriptor,
        get_static_paths: Option<&dyn GetStaticPaths>,
        ctx: &ResolveContext,
    ) -> Result<RouteCacheEntry, RouteCacheError> {
        if route.pattern.is_static() {
            if get_static_paths.is_some() {
                crate::log!(
                    "warn";
                    "{route}: `getStaticPaths()` is ignored on a route without parameters"
                );
            }
            let single = vec![StaticPathItem::new(Params::new())];
            return Ok(RouteCacheEntry::build(route, single, ctx.trailing_slash)?);
        }

        let get_static_paths = get_static_paths.ok_or_else(|| {
            RouteCacheError::MissingGetStaticPaths {
                route: route.identity(),
            }
        })?;

        let paths_ctx = StaticPathsContext {
            route,
            trailing_slash: ctx.trailing_slash,
            base: &ctx.base,
        };
        let value = get_static_paths
            .get_static_paths(&paths_ctx)
            .map_err(|source| RouteCacheError::Enumeration {
                component: route.component.clone(),
                source,
            })?;

        let items = validate_static_paths(route, value)?;
        crate::debug!("routes"; "{route}: {} static paths", items.len());
        Ok(RouteCacheEntry::build(route, items, ctx.trailing_slash)?)
    }

    /// Find the item for `params` in a resolved entry.
    pub fn lookup<'a>(
        &self,
        keyed: &'a RouteCacheEntry,
        params: &Params,
        route: &RouteDescriptor,
    ) -> Result<Option<&'a StaticPathItem>, RouteError> {
        keyed.lookup(params, route)
    }

    /// Store an entry directly. Overwriting a non-empty entry is allowed
    /// before sealing and logged; after sealing every `set` fails.
    pub fn set(
        &self,
        route: &RouteDescriptor,
        entry: RouteCacheEntry,
    ) -> Result<KeyedStaticPaths, RouteCacheError> {
        let identity = route.identity();
        if self.is_sealed() {
            return Err(RouteCacheError::Sealed { route: identity });
        }

        let slot = self.slot(&identity);
        let mut slot = slot.lock();
        // `seal` may have run while waiting for the slot.
        if self.is_sealed() {
            return Err(RouteCacheError::Sealed { route: identity });
        }
        if let Slot::Resolved(existing) = &*slot
            && !existing.is_empty()
        {
            crate::log!("warn"; "internal warning: route cache overwritten for {identity}");
        }

        let entry = Arc::new(entry);
        *slot = Slot::Resolved(Arc::clone(&entry));
        Ok(entry)
    }

    /// Cached entry without resolving.
    pub fn get(&self, route: &RouteDescriptor) -> Option<KeyedStaticPaths> {
        let slot = self.slots.lock().get(&route.identity()).cloned()?;
        let slot = slot.lock();
        match &*slot {
            Slot::Resolved(entry) => Some(Arc::clone(entry)),
            Slot::Empty => None,
        }
    }

    /// Make the cache read-only for routes not yet resolved.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// Number of resolved routes.
    pub fn len(&self) -> usize {
        self.resolved().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolved(&self) -> Vec<KeyedStaticPaths> {
        let slots: Vec<_> = self.slots.lock().values().cloned().collect();
        slots
            .iter()
            .filter_map(|slot| match &*slot.lock() {
                Slot::Resolved(entry) => Some(Arc::clone(entry)),
                Slot::Empty => None,
            })
            .collect()
    }

    /// Export every resolved entry, sorted by key.
    pub fn serialize(&self) -> Vec<SerializedRouteCacheEntry> {
        let mut out: Vec<SerializedRouteCacheEntry> = self
            .resolved()
            .iter()
            .map(|entry| {
                let mut keyed: Vec<(String, usize)> =
                    entry.keyed.iter().map(|(k, &i)| (k.clone(), i)).collect();
                keyed.sort_unstable();
                SerializedRouteCacheEntry {
                    key: cache_key(&entry.route),
                    route: entry.route.clone(),
                    trailing_slash: entry.trailing_slash,
                    static_paths: entry.static_paths.clone(),
                    keyed,
                }
            })
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// Import exported entries without running any enumeration.
    ///
    /// Every record is checked before any is installed, so a corrupt
    /// snapshot leaves the cache untouched.
    pub fn hydrate(&self, entries: Vec<SerializedRouteCacheEntry>) -> Result<usize, RouteCacheError> {
        if self.is_sealed()
            && let Some(first) = entries.first()
        {
            return Err(RouteCacheError::Sealed {
                route: first.route.clone(),
            });
        }

        for record in &entries {
            check_snapshot_record(record)?;
        }

        let count = entries.len();
        for record in entries {
            let entry = RouteCacheEntry {
                route: record.route,
                trailing_slash: record.trailing_slash,
                static_paths: record.static_paths,
                keyed: record.keyed.into_iter().collect(),
            };
            let slot = self.slot(&entry.route);
            *slot.lock() = Slot::Resolved(Arc::new(entry));
        }

        crate::debug!("routes"; "hydrated {count} route cache entries");
        Ok(count)
    }
}

fn check_snapshot_record(record: &SerializedRouteCacheEntry) -> Result<(), RouteCacheError> {
    let expected = cache_key(&record.route);
    if record.key != expected {
        return Err(RouteCacheError::CorruptSnapshot {
            key: record.key.clone(),
            reason: format!("key does not match route identity `{expected}`"),
        });
    }
    let len = record.static_paths.len();
    if let Some((key, i)) = record.keyed.iter().find(|(_, i)| *i >= len) {
        return Err(RouteCacheError::CorruptSnapshot {
            key: record.key.clone(),
            reason: format!("`{key}` points at item #{i} of {len}"),
        });
    }
    Ok(())
}
