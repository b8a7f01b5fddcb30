//! `[security]` configuration.

use crate::config::ConfigDiagnostics;
use macros::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Content security policy; absent disables the CSP header.
    pub csp: Option<CspConfig>,
}

/// Hash function for CSP source hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CspAlgorithm {
    #[default]
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl CspAlgorithm {
    /// Prefix of a source hash, e.g. `sha256-`.
    pub const fn hash_prefix(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256-",
            Self::Sha384 => "sha384-",
            Self::Sha512 => "sha512-",
        }
    }
}

/// Content security policy emitted by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "security.csp", status = experimental)]
pub struct CspConfig {
    /// Hash function: "SHA-256", "SHA-384" or "SHA-512".
    #[config(default = "SHA-256", inline_doc)]
    pub algorithm: CspAlgorithm,

    /// Extra directives, e.g. "img-src 'self'".
    pub directives: Vec<String>,

    /// Hashes of allowed inline scripts.
    pub script_hashes: Vec<String>,

    /// Hashes of allowed inline styles.
    pub style_hashes: Vec<String>,

    /// Allowed script origins.
    pub script_resources: Vec<String>,

    /// Allowed style origins.
    pub style_resources: Vec<String>,

    /// Add 'strict-dynamic' to script-src.
    #[config(inline_doc)]
    pub strict_dynamic: bool,
}

impl CspConfig {
    /// Validate CSP configuration.
    ///
    /// # Checks
    /// - hashes carry a `sha256-`, `sha384-` or `sha512-` prefix
    /// - directives are not `script-src`/`style-src`, which are generated
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let known = [
            CspAlgorithm::Sha256,
            CspAlgorithm::Sha384,
            CspAlgorithm::Sha512,
        ];
        for (field, hashes) in [
            (Self::FIELDS.script_hashes, &self.script_hashes),
            (Self::FIELDS.style_hashes, &self.style_hashes),
        ] {
            for hash in hashes {
                if !known.iter().any(|a| hash.starts_with(a.hash_prefix())) {
                    diag.error_with_hint(
                        field,
                        format!("`{hash}` has no hash algorithm prefix"),
                        format!("use format like {}<base64>", self.algorithm.hash_prefix()),
                    );
                }
            }
        }

        for directive in &self.directives {
            let name = directive.split_whitespace().next().unwrap_or_default();
            if matches!(name, "script-src" | "style-src") {
                diag.error_with_hint(
                    Self::FIELDS.directives,
                    format!("`{name}` is generated from hashes and resources"),
                    format!(
                        "use {} or {} instead",
                        Self::FIELDS.script_resources,
                        Self::FIELDS.style_resources
                    ),
                );
            }
        }
    }
}
