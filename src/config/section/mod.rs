//! Configuration section definitions.
//!
//! Each module corresponds to a section in `strata.toml`:
//!
//! | Module     | TOML Section        | Purpose                              |
//! |------------|---------------------|--------------------------------------|
//! | `site`     | `[site]`            | Origin, base path, trailing slash    |
//! | `build`    | `[build]`           | Output layout, assets, inputs        |
//! | `i18n`     | `[i18n]`            | Locales and routing strategy         |
//! | `security` | `[security.csp]`    | Content security policy              |
//! | `scripts`  | `[[scripts]]`       | Integration-injected scripts         |

mod build;
pub mod i18n;
mod scripts;
mod security;
mod site;

pub use build::BuildConfig;
pub use i18n::{FallbackType, I18nConfig, Locale, RoutingStrategy};
pub use scripts::{InjectedScript, has_stage, validate_scripts};
pub use security::{CspAlgorithm, CspConfig, SecurityConfig};
pub use site::SiteConfig;
