//! Project configuration for `strata.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # One module per TOML section
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── util.rs        # Config file lookup, URL helpers
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                      |
//! |--------------------|----------------------------------------------|
//! | `[site]`           | Origin, base path, trailing slash policy     |
//! | `[build]`          | Output layout, CSS handling, input files     |
//! | `[i18n]`           | Locales, routing strategy, fallbacks         |
//! | `[security.csp]`   | Content security policy (experimental)       |
//! | `[[scripts]]`      | Integration-injected scripts                 |

pub mod section;
pub mod types;
mod util;

pub use section::{
    BuildConfig, CspAlgorithm, CspConfig, FallbackType, I18nConfig, InjectedScript, Locale,
    RoutingStrategy, SecurityConfig, SiteConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};
pub use util::find_config_file;

use crate::asset::ScriptStage;
use crate::log;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "strata.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `strata.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Absolute path of the loaded file (internal use only).
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory holding the config file (internal use only).
    #[serde(skip)]
    pub root: PathBuf,

    pub site: SiteConfig,
    pub build: BuildConfig,
    pub i18n: Option<I18nConfig>,
    pub security: SecurityConfig,
    pub scripts: Vec<InjectedScript>,
}

impl ProjectConfig {
    /// Find `config_name` from `start` upward, then load and validate it.
    pub fn load(start: &Path, config_name: &Path) -> Result<Self, ConfigError> {
        let path = find_config_file(start, config_name).ok_or_else(|| ConfigError::NotFound {
            name: config_name.to_path_buf(),
            start: start.to_path_buf(),
        })?;
        Self::from_path(&path)
    }

    /// Load and validate the config file at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warn"; "unknown fields in {}, ignoring:", name);
            for field in &ignored {
                eprintln!("- {field}");
            }
        }

        config.config_path = path.to_path_buf();
        config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content without validation.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse TOML content, collecting unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Join a path with the project root.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root_join(&self.build.output)
    }

    /// Base path with the policy's trailing slash.
    pub fn base(&self) -> String {
        self.site.normalized_base()
    }

    /// Whether any injected script has this stage.
    pub fn has_script_stage(&self, stage: ScriptStage) -> bool {
        section::has_stage(&self.scripts, stage)
    }

    /// Starter `strata.toml` content.
    pub fn template() -> String {
        format!(
            "{}\n\n{}\n",
            SiteConfig::template_with_header(),
            BuildConfig::template_with_header()
        )
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if let Some(i18n) = &self.i18n {
            i18n.validate_field_status(&mut diag);
        }
        if let Some(csp) = &self.security.csp {
            csp.validate_field_status(&mut diag);
        }

        self.site.validate(&mut diag);
        self.build.validate(&mut diag);
        if let Some(i18n) = &self.i18n {
            i18n.validate(&self.site, self.build.mode, &mut diag);
        }
        if let Some(csp) = &self.security.csp {
            csp.validate(&mut diag);
        }
        section::validate_scripts(&self.scripts, &mut diag);

        diag.print_hints_and_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// tests
// ============================================================================
