//! Slash-aware helpers for URL paths.
//!
//! All helpers operate on `/`-separated strings, never on filesystem paths.

/// Ensure the path starts with `/`.
pub fn prepend_forward_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[inline]
pub fn remove_trailing_forward_slash(path: &str) -> &str {
    path.trim_end_matches('/')
}

#[inline]
pub fn remove_leading_forward_slash(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[inline]
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// Join URL path pieces with exactly one `/` between them.
///
/// Empty pieces are skipped. The first piece keeps its leading slash and the
/// last piece keeps its trailing slash.
pub fn join_paths(parts: &[&str]) -> String {
    let parts: Vec<&str> = parts.iter().copied().filter(|p| !p.is_empty()).collect();
    let last = parts.len().saturating_sub(1);
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| match i {
            0 => remove_trailing_forward_slash(part),
            i if i == last => remove_leading_forward_slash(part),
            _ => trim_slashes(part),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether the last path segment looks like a file name (`feed.xml`).
pub fn has_file_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rfind('.') {
        Some(0) | None => false,
        Some(idx) => {
            let ext = &last[idx + 1..];
            !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
    }
}

/// Prefix an emitted asset file name for use in a URL.
///
/// With an assets prefix (e.g. a CDN origin) the prefix replaces the base.
pub fn prefix_asset_path(file: &str, base: &str, assets_prefix: Option<&str>) -> String {
    match assets_prefix {
        Some(prefix) if !prefix.is_empty() => join_paths(&[prefix, file]),
        _ => prepend_forward_slash(&join_paths(&[base, file])),
    }
}

/// Prefix a generated route path with the site base.
pub fn add_route_base(path: &str, base: &str) -> String {
    if base.is_empty() || base == "/" {
        return path.to_string();
    }
    let joined = join_paths(&[base, path]);
    // `join_paths` drops a lone trailing slash coming from `path == "/"`.
    if path == "/" && !joined.ends_with('/') {
        format!("{joined}/")
    } else {
        joined
    }
}
