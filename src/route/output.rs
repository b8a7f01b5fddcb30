//! Output file locations for generated pages.

use super::RouteType;
use crate::core::BuildFormat;
use crate::core::path::trim_slashes;

/// Error pages that always get a flat file, whatever the format.
const STATUS_PAGES: [&str; 2] = ["404", "500"];

/// File a generated path is written to, relative to the output directory.
///
/// | kind     | format      | `/`          | `/blog/a`            |
/// |----------|-------------|--------------|----------------------|
/// | page     | `directory` | `index.html` | `blog/a/index.html`  |
/// | page     | `file`      | `index.html` | `blog/a.html`        |
/// | endpoint | any         | `index`      | `blog/a`             |
pub fn output_file(pathname: &str, kind: RouteType, format: BuildFormat) -> String {
    let path = trim_slashes(pathname);
    match kind {
        RouteType::Endpoint if path.is_empty() => "index".to_string(),
        RouteType::Endpoint => path.to_string(),
        RouteType::Page if path.is_empty() => "index.html".to_string(),
        RouteType::Page if STATUS_PAGES.contains(&path) => format!("{path}.html"),
        RouteType::Page => match format {
            BuildFormat::Directory => format!("{path}/index.html"),
            BuildFormat::File => format!("{path}.html"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_formats() {
        let page = RouteType::Page;
        assert_eq!(output_file("/", page, BuildFormat::Directory), "index.html");
        assert_eq!(output_file("/", page, BuildFormat::File), "index.html");
        assert_eq!(output_file("/blog/a", page, BuildFormat::Directory), "blog/a/index.html");
        assert_eq!(output_file("/blog/a/", page, BuildFormat::Directory), "blog/a/index.html");
        assert_eq!(output_file("/blog/a", page, BuildFormat::File), "blog/a.html");
        assert_eq!(output_file("/404", page, BuildFormat::Directory), "404.html");
    }

    #[test]
    fn test_endpoints_are_verbatim() {
        let endpoint = RouteType::Endpoint;
        assert_eq!(output_file("/feed.xml", endpoint, BuildFormat::Directory), "feed.xml");
        assert_eq!(output_file("/api/data.json", endpoint, BuildFormat::File), "api/data.json");
    }
}
