//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Path component of a URL, without surrounding slashes.
///
/// Returns `None` if the URL is invalid.
///
/// # Examples
/// ```ignore
/// extract_url_path("https://example.com")          -> Some("")
/// extract_url_path("https://example.com:8080/fr/") -> Some("fr")
/// extract_url_path("invalid")                      -> None
/// ```
pub fn extract_url_path(url_str: &str) -> Option<String> {
    let parsed = url::Url::parse(url_str).ok()?;
    Some(parsed.path().trim_matches('/').to_string())
}

/// Find `config_name` in `start` or the nearest parent that has it.
///
/// ```text
/// /home/user/site/src/pages/   ← start
/// /home/user/site/strata.toml  ← found
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}
