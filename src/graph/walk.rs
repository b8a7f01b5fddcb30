//! Importer walks over the module graph.
//!
//! Starting at a module, follow importer edges upward. Every reachable
//! module is yielded once with:
//!
//! - `depth`: distance from the start module (0 for the start itself)
//! - `order`: accumulated import position along the path, so a stylesheet
//!   imported first by a page ranks before one imported later
//!
//! A work stack replaces recursion and a visited set guards against import
//! cycles. The walks hold no state between calls.

use super::{ModuleInfo, ModuleInfoSource};
use rustc_hash::FxHashSet;

/// A module reached by an importer walk.
#[derive(Debug, Clone, Copy)]
pub struct ParentInfo<'a> {
    pub info: &'a ModuleInfo,
    pub depth: i32,
    pub order: i32,
}

struct Frame<'s> {
    id: &'s str,
    depth: i32,
    order: i32,
    child: Option<&'s str>,
}

/// Depth-first importer walk from `id`.
///
/// `until` stops the walk from going above a module; the module itself is
/// still yielded.
pub fn walk_parent_infos<'a, S>(
    id: &str,
    source: &'a S,
    until: impl Fn(&ModuleInfo) -> bool,
) -> Vec<ParentInfo<'a>>
where
    S: ModuleInfoSource + ?Sized,
{
    let mut seen = FxHashSet::default();
    walk_parent_infos_with(id, source, &until, &mut seen)
}

/// Same as [`walk_parent_infos`] with a caller-owned visited set.
pub fn walk_parent_infos_with<'a, S>(
    id: &str,
    source: &'a S,
    until: &dyn Fn(&ModuleInfo) -> bool,
    seen: &mut FxHashSet<String>,
) -> Vec<ParentInfo<'a>>
where
    S: ModuleInfoSource + ?Sized,
{
    let mut out = Vec::new();

    let Some(start) = source.module_info(id) else {
        return out;
    };
    let mut stack: Vec<Frame<'a>> = vec![Frame {
        id: start.id.as_str(),
        depth: 0,
        order: 0,
        child: None,
    }];

    while let Some(frame) = stack.pop() {
        if !seen.insert(frame.id.to_string()) {
            continue;
        }
        let Some(info) = source.module_info(frame.id) else {
            continue;
        };

        let order = match frame.child {
            Some(child) => {
                let idx = info.import_index(child).unwrap_or(info.imported_ids.len());
                frame.order.saturating_add(i32::try_from(idx).unwrap_or(i32::MAX))
            }
            None => frame.order,
        };
        out.push(ParentInfo {
            info,
            depth: frame.depth,
            order,
        });

        if until(info) {
            continue;
        }

        // Reverse push keeps importer order on pop.
        let importers = info.importer_ids.iter().chain(&info.dynamic_importer_ids);
        let pending: Vec<&'a String> = importers.filter(|imp| !seen.contains(*imp)).collect();
        for importer in pending.into_iter().rev() {
            stack.push(Frame {
                id: importer.as_str(),
                depth: frame.depth + 1,
                order,
                child: Some(info.id.as_str()),
            });
        }
    }

    out
}

/// Every page entry that (transitively) imports `id`.
///
/// Walks stop at propagated-asset boundaries.
pub fn top_level_pages<'a, S>(id: &str, source: &'a S) -> Vec<ParentInfo<'a>>
where
    S: ModuleInfoSource + ?Sized,
{
    walk_parent_infos(id, source, |info| info.meta.propagated)
        .into_iter()
        .filter(|p| p.info.is_page())
        .collect()
}

/// Client-only components that (transitively) import `id`.
///
/// Walks stop at, and yield, the first client-only module on each path.
pub fn client_only_boundaries<'a, S>(id: &str, source: &'a S) -> Vec<ParentInfo<'a>>
where
    S: ModuleInfoSource + ?Sized,
{
    walk_parent_infos(id, source, |info| info.meta.client_only)
        .into_iter()
        .filter(|p| p.info.meta.client_only)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ModuleGraph, ModuleInfo};

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

    fn ids(infos: &[ParentInfo<'_>]) -> Vec<String> {
        infos.iter().map(|p| p.info.id.clone()).collect()
    }

    #[test]
    fn test_shared_module_reaches_every_page() {
        let graph = ModuleGraph::from_modules(vec![
            page("pages/a", &["components/x"]),
            page("pages/b", &["components/y"]),
            module("components/y", &["components/x"]),
            module("components/x", &["styles/x.css"]),
            module("styles/x.css", &[]),
        ]);

        let mut pages = ids(&top_level_pages("styles/x.css", &graph));
        pages.sort();
        assert_eq!(pages, ["pages/a", "pages/b"]);
    }

    #[test]
    fn test_cycles_terminate() {
        let graph = ModuleGraph::from_modules(vec![
            page("pages/a", &["m1"]),
            module("m1", &["m2"]),
            module("m2", &["m1", "s.css"]),
            module("s.css", &[]),
        ]);
        let all = walk_parent_infos("s.css", &graph, |_| false);
        assert_eq!(ids(&all), ["s.css", "m2", "m1", "pages/a"]);
    }

    #[test]
    fn test_depth_and_order() {
        let graph = ModuleGraph::from_modules(vec![
            page("pages/a", &["first.css", "comp"]),
            module("comp", &["other", "second.css"]),
            module("first.css", &[]),
            module("second.css", &[]),
            module("other", &[]),
        ]);

        let first = top_level_pages("first.css", &graph);
        assert_eq!((first[0].depth, first[0].order), (1, 0));

        let second = top_level_pages("second.css", &graph);
        // comp imports second.css at 1, page imports comp at 1.
        assert_eq!((second[0].depth, second[0].order), (2, 2));
    }

    #[test]
    fn test_start_module_can_be_the_page() {
        let graph = ModuleGraph::from_modules(vec![page("pages/a", &[])]);
        let pages = top_level_pages("pages/a", &graph);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].depth, 0);
    }

    #[test]
    fn test_propagated_boundary_stops_walk() {
        let mut boundary = module("content/entry", &["content.css"]);
        boundary.meta.propagated = true;
        let graph = ModuleGraph::from_modules(vec![
            page("pages/a", &["content/entry"]),
            boundary,
            module("content.css", &[]),
        ]);
        assert!(top_level_pages("content.css", &graph).is_empty());
    }

    #[test]
    fn test_client_only_boundary_stops_and_yields() {
        let mut island = module("components/Island", &["island.css"]);
        island.meta.client_only = true;
        let mut outer = module("components/Outer", &["components/Island"]);
        outer.meta.client_only = true;
        let graph = ModuleGraph::from_modules(vec![outer, island, module("island.css", &[])]);

        let found = client_only_boundaries("island.css", &graph);
        assert_eq!(ids(&found), ["components/Island"]);
    }

    #[test]
    fn test_unknown_start_yields_nothing() {
        let graph = ModuleGraph::new();
        assert!(walk_parent_infos("missing", &graph, |_| false).is_empty());
    }
}
