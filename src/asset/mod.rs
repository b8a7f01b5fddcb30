//! Page assets: stylesheets and scripts attributed to each page.
//!
//! | Module     | Purpose                                             |
//! |------------|-----------------------------------------------------|
//! | `registry` | Thread-safe page → asset set attribution            |
//! | `order`    | Stylesheet ordering and inline-sheet merging        |

pub mod order;
pub mod registry;

pub use order::{ImportOrder, css_order, merge_inline_css};
pub use registry::PageAssetRegistry;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Descriptors
// ============================================================================

/// A stylesheet as it appears in a page head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StylesheetAsset {
    Inline { content: String },
    External { src: String },
}

/// Lifecycle stage of an integration-injected script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptStage {
    /// Inlined into every page head.
    HeadInline,
    /// Bundled into the page-script entry.
    Page,
    /// Imported on the server before each page renders.
    PageSsr,
    /// Runs before any island hydrates.
    BeforeHydration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    Inline,
    External,
}

/// A script as it appears in a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptDescriptor {
    /// Integration-injected script.
    Injected { stage: ScriptStage, children: String },
    /// Inline children or an external `src`.
    Hoisted {
        #[serde(rename = "type")]
        kind: ScriptKind,
        value: String,
    },
}

impl ScriptDescriptor {
    pub fn inline(children: impl Into<String>) -> Self {
        Self::Hoisted {
            kind: ScriptKind::Inline,
            value: children.into(),
        }
    }

    pub fn external(src: impl Into<String>) -> Self {
        Self::Hoisted {
            kind: ScriptKind::External,
            value: src.into(),
        }
    }

    /// External file this script loads, if any.
    pub fn external_src(&self) -> Option<&str> {
        match self {
            Self::Hoisted {
                kind: ScriptKind::External,
                value,
            } => Some(value.as_str()),
            _ => None,
        }
    }
}

/// When CSS is inlined into the page instead of linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineStylesheets {
    Always,
    /// Inline sheets no larger than the inline limit.
    #[default]
    Auto,
    Never,
}

// ============================================================================
// PageAssetSet
// ============================================================================

/// Where a stylesheet sits relative to its page.
///
/// `depth` is the import distance from the page, `order` the accumulated
/// import position. Client-only sheets use `-1` for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssOrderInfo {
    pub depth: i32,
    pub order: i32,
}

impl CssOrderInfo {
    pub const CLIENT_ONLY: Self = Self {
        depth: -1,
        order: -1,
    };

    pub const fn new(depth: i32, order: i32) -> Self {
        Self { depth, order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStylesheet {
    pub file: String,
    pub info: CssOrderInfo,
}

/// Assets of one page; stylesheets keep discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageAssetSet {
    css: Vec<PageStylesheet>,
    index: FxHashMap<String, usize>,
    pub hoisted_script: Option<ScriptDescriptor>,
}

impl PageAssetSet {
    /// Record a stylesheet reached by a page walk.
    ///
    /// A known sheet keeps its smallest depth and smallest non-negative
    /// order. Returns `true` if the sheet was new.
    pub fn add_css(&mut self, file: &str, info: CssOrderInfo) -> bool {
        if let Some(&i) = self.index.get(file) {
            let current = &mut self.css[i].info;
            if info.depth < current.depth {
                current.depth = info.depth;
            }
            if current.order == -1 || (info.order > -1 && info.order < current.order) {
                current.order = info.order;
            }
            return false;
        }
        self.push(file, info);
        true
    }

    /// Record a stylesheet owned by a client-only component of this page.
    pub fn add_client_only_css(&mut self, file: &str) {
        match self.index.get(file) {
            Some(&i) => self.css[i].info = CssOrderInfo::CLIENT_ONLY,
            None => self.push(file, CssOrderInfo::CLIENT_ONLY),
        }
    }

    fn push(&mut self, file: &str, info: CssOrderInfo) {
        self.index.insert(file.to_string(), self.css.len());
        self.css.push(PageStylesheet {
            file: file.to_string(),
            info,
        });
    }

    #[inline]
    pub fn css(&self) -> &[PageStylesheet] {
        &self.css
    }

    pub fn contains_css(&self, file: &str) -> bool {
        self.index.contains_key(file)
    }

    pub fn css_info(&self, file: &str) -> Option<CssOrderInfo> {
        self.index.get(file).map(|&i| self.css[i].info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_css_is_idempotent() {
        let mut set = PageAssetSet::default();
        assert!(set.add_css("a.css", CssOrderInfo::new(1, 0)));
        assert!(!set.add_css("a.css", CssOrderInfo::new(1, 0)));
        assert_eq!(set.css().len(), 1);
    }

    #[test]
    fn test_add_css_keeps_min_depth_and_order() {
        let mut set = PageAssetSet::default();
        set.add_css("a.css", CssOrderInfo::new(3, 5));
        set.add_css("a.css", CssOrderInfo::new(1, 7));
        set.add_css("a.css", CssOrderInfo::new(2, 2));
        set.add_css("a.css", CssOrderInfo::new(4, -1));
        assert_eq!(set.css_info("a.css"), Some(CssOrderInfo::new(1, 2)));
    }

    #[test]
    fn test_client_only_css_overrides() {
        let mut set = PageAssetSet::default();
        set.add_css("a.css", CssOrderInfo::new(1, 0));
        set.add_client_only_css("a.css");
        set.add_client_only_css("b.css");
        assert_eq!(set.css_info("a.css"), Some(CssOrderInfo::CLIENT_ONLY));
        assert_eq!(set.css().len(), 2);

        // A later page walk restores a real order.
        set.add_css("b.css", CssOrderInfo::new(2, 3));
        assert_eq!(set.css_info("b.css"), Some(CssOrderInfo::new(-1, 3)));
    }

    #[test]
    fn test_descriptor_wire_shapes() {
        assert_eq!(
            serde_json::to_value(StylesheetAsset::External { src: "/a.css".into() }).unwrap(),
            json!({ "type": "external", "src": "/a.css" })
        );
        assert_eq!(
            serde_json::to_value(ScriptDescriptor::external("/a.js")).unwrap(),
            json!({ "type": "external", "value": "/a.js" })
        );
        let injected: ScriptDescriptor =
            serde_json::from_value(json!({ "stage": "head-inline", "children": "x()" })).unwrap();
        assert_eq!(
            injected,
            ScriptDescriptor::Injected {
                stage: ScriptStage::HeadInline,
                children: "x()".into()
            }
        );
    }
}
