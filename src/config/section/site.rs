//! `[site]` configuration.

use crate::config::ConfigDiagnostics;
use crate::core::TrailingSlash;
use crate::core::path::{prepend_forward_slash, remove_trailing_forward_slash};
use macros::Config;
use serde::{Deserialize, Serialize};

/// Where the site is deployed and how its URLs look.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "site")]
pub struct SiteConfig {
    /// Deployed origin, e.g. "https://example.com".
    #[config(inline_doc)]
    pub url: Option<String>,

    /// Path the site is served under.
    #[config(default = "/", inline_doc)]
    pub base: String,

    /// Trailing slash policy for page URLs: "always", "never" or "ignore".
    #[config(default = "ignore", inline_doc)]
    pub trailing_slash: TrailingSlash,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: None,
            base: "/".into(),
            trailing_slash: TrailingSlash::Ignore,
        }
    }
}

impl SiteConfig {
    /// `base` with a leading slash and a trailing slash matching the policy.
    pub fn normalized_base(&self) -> String {
        let base = remove_trailing_forward_slash(&self.base);
        match self.trailing_slash {
            TrailingSlash::Always => prepend_forward_slash(&format!("{base}/")),
            _ if base.is_empty() => "/".into(),
            TrailingSlash::Never => prepend_forward_slash(base),
            TrailingSlash::Ignore => prepend_forward_slash(&self.base),
        }
    }

    /// Validate site configuration.
    ///
    /// # Checks
    /// - `url` is an http(s) URL with a host
    /// - `base` is a path, not a URL
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Some(url_str) = &self.url {
            match url::Url::parse(url_str) {
                Ok(parsed) => {
                    if !matches!(parsed.scheme(), "http" | "https") {
                        diag.error_with_hint(
                            Self::FIELDS.url,
                            format!(
                                "scheme '{}' not supported, must be http or https",
                                parsed.scheme()
                            ),
                            "use format like https://example.com",
                        );
                    }
                    if parsed.host_str().is_none() {
                        diag.error_with_hint(
                            Self::FIELDS.url,
                            "URL must have a valid host",
                            "use format like https://example.com",
                        );
                    }
                }
                Err(e) => {
                    diag.error_with_hint(
                        Self::FIELDS.url,
                        format!("invalid URL: {e}"),
                        "use format like https://example.com",
                    );
                }
            }
        }

        if self.base.contains("://") {
            diag.error_with_hint(
                Self::FIELDS.base,
                format!("`{}` is a URL, expected a path", self.base),
                format!(
                    "put the origin in {} and keep only the path here",
                    Self::FIELDS.url
                ),
            );
        }
    }
}
