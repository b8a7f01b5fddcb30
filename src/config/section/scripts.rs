//! `[[scripts]]`: integration-injected scripts.
//!
//! ```toml
//! [[scripts]]
//! stage = "head-inline"
//! content = "window.dataLayer = [];"
//! ```

use crate::asset::ScriptStage;
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedScript {
    pub stage: ScriptStage,
    pub content: String,
}

const SCRIPTS: FieldPath = FieldPath::new("scripts");

/// Validate injected scripts.
///
/// # Checks
/// - `content` is not blank
pub fn validate_scripts(scripts: &[InjectedScript], diag: &mut ConfigDiagnostics) {
    for (i, script) in scripts.iter().enumerate() {
        if script.content.trim().is_empty() {
            diag.error(SCRIPTS, format!("script #{i} has empty content"));
        }
    }
}

/// Whether any script of `stage` is configured.
pub fn has_stage(scripts: &[InjectedScript], stage: ScriptStage) -> bool {
    scripts.iter().any(|s| s.stage == stage)
}
