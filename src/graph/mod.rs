//! Post-bundle module graph, as reported by the bundler.
//!
//! The graph is read-only and may contain cycles. Walks over it live in
//! [`walk`] and only need a [`ModuleInfoSource`], so any bundler can plug
//! in its own accessor.

pub mod walk;

pub use walk::{ParentInfo, client_only_boundaries, top_level_pages, walk_parent_infos};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub type ModuleId = String;

// ============================================================================
// Node data
// ============================================================================

/// How a component's head content propagates to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Propagation {
    #[default]
    None,
    #[serde(rename = "self")]
    SelfOnly,
    InTree,
}

/// Framework metadata attached to a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleMeta {
    /// Component path when this module is a page entry.
    pub page: Option<String>,
    /// The module is rendered only in the browser.
    pub client_only: bool,
    /// For page entries: client-only components the page renders.
    pub client_only_components: Vec<ModuleId>,
    /// Asset walks stop here; styles below are injected where the
    /// content is rendered.
    pub propagated: bool,
    pub propagation: Propagation,
    pub contains_head: bool,
}

/// One module with its edges in both directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub id: ModuleId,
    #[serde(default)]
    pub imported_ids: Vec<ModuleId>,
    #[serde(default)]
    pub dynamically_imported_ids: Vec<ModuleId>,
    #[serde(default)]
    pub importer_ids: Vec<ModuleId>,
    #[serde(default)]
    pub dynamic_importer_ids: Vec<ModuleId>,
    #[serde(default)]
    pub meta: ModuleMeta,
}

impl ModuleInfo {
    pub fn new(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_page(&self) -> bool {
        self.meta.page.is_some()
    }

    /// Position of `child` among this module's imports.
    ///
    /// Dynamic imports rank after every static import.
    pub fn import_index(&self, child: &str) -> Option<usize> {
        if let Some(i) = self.imported_ids.iter().position(|c| c == child) {
            return Some(i);
        }
        self.dynamically_imported_ids
            .iter()
            .position(|c| c == child)
            .map(|i| self.imported_ids.len() + i)
    }
}

// ============================================================================
// Accessor
// ============================================================================

/// Read access to module nodes by id.
pub trait ModuleInfoSource {
    fn module_info(&self, id: &str) -> Option<&ModuleInfo>;
}

impl ModuleInfoSource for FxHashMap<ModuleId, ModuleInfo> {
    fn module_info(&self, id: &str) -> Option<&ModuleInfo> {
        self.get(id)
    }
}

// ============================================================================
// ModuleGraph
// ============================================================================

/// Bidirectional module graph.
///
/// # Invariants
/// - Every `imported_ids` edge has a matching `importer_ids` edge and the
///   same for dynamic edges
/// - Edge lists keep first-seen order and hold no duplicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ModuleInfo>", into = "Vec<ModuleInfo>")]
pub struct ModuleGraph {
    order: Vec<ModuleId>,
    modules: FxHashMap<ModuleId, ModuleInfo>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph, completing whichever edge direction the input omits.
    pub fn from_modules(modules: Vec<ModuleInfo>) -> Self {
        let mut graph = Self::default();
        for module in modules {
            graph.insert(module);
        }
        graph.link();
        graph
    }

    fn insert(&mut self, module: ModuleInfo) {
        if !self.modules.contains_key(&module.id) {
            self.order.push(module.id.clone());
        }
        self.modules.insert(module.id.clone(), module);
    }

    /// Mirror edges so both directions agree.
    fn link(&mut self) {
        let mut forward: Vec<(ModuleId, ModuleId, bool)> = Vec::new();
        let mut reverse: Vec<(ModuleId, ModuleId, bool)> = Vec::new();

        for id in &self.order {
            let Some(m) = self.modules.get(id) else { continue };
            for child in &m.imported_ids {
                reverse.push((child.clone(), id.clone(), false));
            }
            for child in &m.dynamically_imported_ids {
                reverse.push((child.clone(), id.clone(), true));
            }
            for parent in &m.importer_ids {
                forward.push((parent.clone(), id.clone(), false));
            }
            for parent in &m.dynamic_importer_ids {
                forward.push((parent.clone(), id.clone(), true));
            }
        }

        for (child, parent, dynamic) in reverse {
            let node = self.entry(&child);
            let list = if dynamic {
                &mut node.dynamic_importer_ids
            } else {
                &mut node.importer_ids
            };
            push_unique(list, parent);
        }
        for (parent, child, dynamic) in forward {
            let node = self.entry(&parent);
            let list = if dynamic {
                &mut node.dynamically_imported_ids
            } else {
                &mut node.imported_ids
            };
            push_unique(list, child);
        }
    }

    fn entry(&mut self, id: &str) -> &mut ModuleInfo {
        if !self.modules.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.modules
            .entry(id.to_string())
            .or_insert_with(|| ModuleInfo::new(id))
    }

    pub fn get(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.get(id)
    }

    /// Modules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.order.iter().filter_map(|id| self.modules.get(id))
    }

    /// Page entry modules in insertion order.
    pub fn pages(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.iter().filter(|m| m.is_page())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn push_unique(list: &mut Vec<ModuleId>, id: ModuleId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

impl ModuleInfoSource for ModuleGraph {
    fn module_info(&self, id: &str) -> Option<&ModuleInfo> {
        self.get(id)
    }
}

impl From<Vec<ModuleInfo>> for ModuleGraph {
    fn from(modules: Vec<ModuleInfo>) -> Self {
        Self::from_modules(modules)
    }
}

impl From<ModuleGraph> for Vec<ModuleInfo> {
    fn from(mut graph: ModuleGraph) -> Self {
        graph
            .order
            .iter()
            .filter_map(|id| graph.modules.remove(id))
            .collect()
    }
}
