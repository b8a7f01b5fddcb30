//! Stylesheet ordering.
//!
//! Links in a page head follow the order in which their source modules
//! first appear in the project's markup. That order is recorded once per
//! build as an [`ImportOrder`] and passed to whoever sorts stylesheets, so
//! two builds in one process never share it.
//!
//! Sort keys, in order:
//!
//! 1. rank of the earliest source module in the import order (unknown last)
//! 2. [`css_order`] on depth/order info
//! 3. file name

use super::{CssOrderInfo, PageStylesheet, StylesheetAsset};
use crate::graph::ModuleId;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

// ============================================================================
// ImportOrder
// ============================================================================

/// First-appearance index of every imported module.
#[derive(Debug, Clone, Default)]
pub struct ImportOrder {
    index: FxHashMap<ModuleId, usize>,
}

impl ImportOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module; repeated ids keep their first position.
    pub fn record(&mut self, id: impl Into<ModuleId>) {
        let next = self.index.len();
        self.index.entry(id.into()).or_insert(next);
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Best (lowest) position among `ids`.
    pub fn rank<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Option<usize> {
        ids.into_iter().filter_map(|id| self.position(id)).min()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<S: Into<ModuleId>> FromIterator<S> for ImportOrder {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut order = Self::new();
        for id in iter {
            order.record(id);
        }
        order
    }
}

// ============================================================================
// Comparators
// ============================================================================

/// Compare two sheets by walk info.
///
/// Sheets without an order (`-1`) go last. Otherwise lower order first;
/// on ties client-only sheets (`depth == -1`) come first, then deeper
/// (more shared) sheets before shallower ones.
pub fn css_order(a: &CssOrderInfo, b: &CssOrderInfo) -> Ordering {
    match (a.order == -1, b.order == -1) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    a.order.cmp(&b.order).then_with(|| match (a.depth == -1, b.depth == -1) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.depth.cmp(&a.depth),
    })
}

/// Sort sheets for one page. `sources` maps a sheet file to the modules
/// that produced it.
pub fn sort_stylesheets(
    sheets: &mut [PageStylesheet],
    order: &ImportOrder,
    sources: impl Fn(&str) -> Vec<ModuleId>,
) {
    let ranks: FxHashMap<String, usize> = sheets
        .iter()
        .map(|s| {
            let ids = sources(&s.file);
            let rank = order
                .rank(ids.iter().map(String::as_str))
                .unwrap_or(usize::MAX);
            (s.file.clone(), rank)
        })
        .collect();

    sheets.sort_by(|a, b| {
        ranks[&a.file]
            .cmp(&ranks[&b.file])
            .then_with(|| css_order(&a.info, &b.info))
            .then_with(|| a.file.cmp(&b.file))
    });
}

/// Merge runs of adjacent inline sheets into one.
pub fn merge_inline_css(sheets: Vec<StylesheetAsset>) -> Vec<StylesheetAsset> {
    let mut out: Vec<StylesheetAsset> = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        if let StylesheetAsset::Inline { content } = &sheet
            && let Some(StylesheetAsset::Inline { content: last }) = out.last_mut()
        {
            last.push_str(content);
            continue;
        }
        out.push(sheet);
    }
    out
}
