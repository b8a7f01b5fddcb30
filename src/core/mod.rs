//! Core policy types shared by every build phase.
//!
//! | Type            | Purpose                                        |
//! |-----------------|------------------------------------------------|
//! | `TrailingSlash` | How request paths end (`always/never/ignore`)  |
//! | `BuildFormat`   | Page output layout (`directory/file`)          |
//! | `OutputMode`    | Whether the site also ships a server runtime   |
//! | `path`          | Slash-aware helpers for URL paths              |

pub mod path;

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TrailingSlash
// ============================================================================

/// Trailing-slash policy for request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingSlash {
    /// Every page path ends with `/` (file-like paths excepted).
    Always,
    /// No page path ends with `/`.
    Never,
    /// Accept both forms; canonical form has no trailing slash.
    #[default]
    Ignore,
}

impl TrailingSlash {
    /// Canonicalize a generated pathname under this policy.
    ///
    /// The root path is always `/`. Under `Always`, paths whose last segment
    /// carries a file extension (`/feed.xml`) keep their exact form.
    pub fn normalize(self, pathname: &str) -> String {
        let trimmed = pathname.trim_end_matches('/');
        if trimmed.is_empty() {
            return "/".to_string();
        }

        let mut out = path::prepend_forward_slash(trimmed);
        if self == Self::Always && !path::has_file_extension(&out) {
            out.push('/');
        }
        out
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for TrailingSlash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// BuildFormat
// ============================================================================

/// Output layout for prerendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildFormat {
    /// `/about` is written to `about/index.html`.
    #[default]
    Directory,
    /// `/about` is written to `about.html`.
    File,
}

// ============================================================================
// OutputMode
// ============================================================================

/// Whether the build also targets an on-demand server runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Every route is prerendered.
    #[default]
    Static,
    /// Routes may opt out of prerendering and render per request.
    Server,
}

impl OutputMode {
    #[inline]
    pub const fn is_server(self) -> bool {
        matches!(self, Self::Server)
    }
}
