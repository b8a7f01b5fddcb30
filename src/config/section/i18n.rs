//! `[i18n]` configuration.
//!
//! # Example
//!
//! ```toml
//! [i18n]
//! default_locale = "en"
//! locales = ["en", "fr", { path = "spanish", codes = ["es", "es-AR"] }]
//! strategy = "pathname-prefix-other-locales"
//! fallback = { fr = "en" }
//! ```

use crate::config::{ConfigDiagnostics, SiteConfig};
use crate::core::OutputMode;
use crate::config::util::extract_url_path;
use macros::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A locale: a bare code, or a URL path shared by several codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locale {
    Code(String),
    Group { path: String, codes: Vec<String> },
}

impl Locale {
    /// URL path segment of this locale.
    pub fn path(&self) -> &str {
        match self {
            Self::Code(code) => code,
            Self::Group { path, .. } => path,
        }
    }

    pub fn codes(&self) -> Vec<&str> {
        match self {
            Self::Code(code) => vec![code.as_str()],
            Self::Group { codes, .. } => codes.iter().map(String::as_str).collect(),
        }
    }
}

/// How locales map onto URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStrategy {
    /// `/about`, `/fr/about`.
    #[default]
    PathnamePrefixOtherLocales,
    /// `/en/about`, `/fr/about`; `/` redirects to the default locale.
    PathnamePrefixAlways,
    PathnamePrefixAlwaysNoRedirect,
    DomainsPrefixOtherLocales,
    DomainsPrefixAlways,
    DomainsPrefixAlwaysNoRedirect,
    /// The project routes locales itself.
    Manual,
}

impl RoutingStrategy {
    pub const fn uses_domains(self) -> bool {
        matches!(
            self,
            Self::DomainsPrefixOtherLocales
                | Self::DomainsPrefixAlways
                | Self::DomainsPrefixAlwaysNoRedirect
        )
    }
}

/// What a missing page in a fallback locale does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackType {
    #[default]
    Redirect,
    Rewrite,
}

/// Locales, routing strategy and fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "i18n")]
pub struct I18nConfig {
    /// Locale served without a prefix by default.
    #[config(inline_doc)]
    pub default_locale: String,

    /// Supported locales.
    pub locales: Vec<Locale>,

    /// URL routing strategy.
    #[config(default = "pathname-prefix-other-locales", inline_doc)]
    pub strategy: RoutingStrategy,

    /// Locale to fall back to when a page is missing, keyed by locale.
    #[config(status = hidden)]
    pub fallback: BTreeMap<String, String>,

    /// "redirect" or "rewrite".
    #[config(default = "redirect", inline_doc)]
    pub fallback_type: FallbackType,

    /// Origin serving each locale.
    #[config(status = experimental)]
    pub domains: BTreeMap<String, String>,
}

impl I18nConfig {
    /// Every locale code, in declaration order.
    pub fn codes(&self) -> Vec<&str> {
        self.locales.iter().flat_map(Locale::codes).collect()
    }

    /// Origin → normalized locale code.
    pub fn domain_lookup_table(&self) -> BTreeMap<String, String> {
        self.domains
            .iter()
            .map(|(locale, origin)| (origin.clone(), normalize_locale(locale)))
            .collect()
    }

    /// Validate i18n configuration.
    ///
    /// # Checks
    /// - `locales` is not empty and contains `default_locale`
    /// - `fallback` maps known locales, never away from `default_locale`
    /// - `domains` keys are locales and values are bare origins
    /// - `domains` needs a domain strategy, `site.url` and server output
    pub fn validate(&self, site: &SiteConfig, mode: OutputMode, diag: &mut ConfigDiagnostics) {
        let codes = self.codes();

        if codes.is_empty() {
            diag.error(Self::FIELDS.locales, "at least one locale is required");
        } else if !codes.contains(&self.default_locale.as_str()) {
            diag.error_with_hint(
                Self::FIELDS.default_locale,
                format!("`{}` is not one of the configured locales", self.default_locale),
                format!("add it to {}", Self::FIELDS.locales),
            );
        }

        for (from, to) in &self.fallback {
            if *from == self.default_locale {
                diag.error(
                    Self::FIELDS.fallback,
                    format!("the default locale `{from}` cannot fall back to another locale"),
                );
            }
            for code in [from, to] {
                if !codes.contains(&code.as_str()) {
                    diag.error(
                        Self::FIELDS.fallback,
                        format!("`{code}` is not one of the configured locales"),
                    );
                }
            }
        }

        if self.domains.is_empty() {
            if self.strategy.uses_domains() {
                diag.error_with_hint(
                    Self::FIELDS.strategy,
                    "domain strategies need at least one entry in domains",
                    format!("configure {} or use a pathname strategy", Self::FIELDS.domains),
                );
            }
            return;
        }

        for (locale, origin) in &self.domains {
            if !codes.contains(&locale.as_str()) {
                diag.error(
                    Self::FIELDS.domains,
                    format!("`{locale}` is not one of the configured locales"),
                );
            }
            if !extract_url_path(origin).is_some_and(|path| path.is_empty()) {
                diag.error_with_hint(
                    Self::FIELDS.domains,
                    format!("`{origin}` is not a bare origin"),
                    "use format like https://fr.example.com",
                );
            }
        }
        if !self.strategy.uses_domains() {
            diag.error(
                Self::FIELDS.strategy,
                "domains are configured but the strategy does not use them",
            );
        }
        if site.url.is_none() {
            diag.error(SiteConfig::FIELDS.url, "domain routing needs the site URL");
        }
        if !mode.is_server() {
            diag.error(
                crate::config::BuildConfig::FIELDS.mode,
                "domain routing needs server output",
            );
        }
    }
}

/// `en_US` → `en-us`.
pub fn normalize_locale(locale: &str) -> String {
    locale.replace('_', "-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> I18nConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_locale_shapes() {
        let config = parse(
            r#"
default_locale = "en"
locales = ["en", { path = "spanish", codes = ["es", "es-AR"] }]
"#,
        );
        assert_eq!(config.codes(), ["en", "es", "es-AR"]);
        assert_eq!(config.locales[1].path(), "spanish");
    }

    #[test]
    fn test_default_locale_must_be_listed() {
        let config = parse("default_locale = \"de\"\nlocales = [\"en\"]");
        let mut diag = ConfigDiagnostics::new();
        config.validate(&SiteConfig::default(), OutputMode::Static, &mut diag);
        assert_eq!(diag.errors()[0].field, I18nConfig::FIELDS.default_locale);
    }

    #[test]
    fn test_fallback_checks() {
        let config = parse(
            r#"
default_locale = "en"
locales = ["en", "fr"]
fallback = { en = "fr", fr = "it" }
"#,
        );
        let mut diag = ConfigDiagnostics::new();
        config.validate(&SiteConfig::default(), OutputMode::Static, &mut diag);
        assert_eq!(diag.errors().len(), 2);
    }

    #[test]
    fn test_domains() {
        let config = parse(
            r#"
default_locale = "en"
locales = ["en", "pt_BR"]
strategy = "domains-prefix-other-locales"
domains = { pt_BR = "https://example.com.br" }
"#,
        );
        let site = SiteConfig {
            url: Some("https://example.com".into()),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&site, OutputMode::Server, &mut diag);
        assert!(diag.is_empty(), "{diag}");

        assert_eq!(
            config.domain_lookup_table().get("https://example.com.br"),
            Some(&"pt-br".to_string())
        );

        let mut diag = ConfigDiagnostics::new();
        config.validate(&SiteConfig::default(), OutputMode::Static, &mut diag);
        assert_eq!(diag.errors().len(), 2);
    }

    #[test]
    fn test_domain_must_be_origin() {
        let config = parse(
            r#"
default_locale = "en"
locales = ["en", "fr"]
strategy = "domains-prefix-always"
domains = { fr = "https://example.com/fr" }
"#,
        );
        let site = SiteConfig {
            url: Some("https://example.com".into()),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&site, OutputMode::Server, &mut diag);
        assert_eq!(diag.errors()[0].field, I18nConfig::FIELDS.domains);
    }
}
