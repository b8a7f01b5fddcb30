//! Pagination helper handed to enumeration functions.
//!
//! Splits a data list into pages for a route with a `[page]` or
//! `[...page]` parameter. With `[...page]` the first page has no number
//! (`/blog`, `/blog/2`); with `[page]` every page is numbered.

use super::params::{ParamValue, Params, params_from_json};
use super::{ParamKeyCodec, RouteDescriptor, RouteError};
use crate::core::TrailingSlash;
use crate::core::path::add_route_base;
use serde_json::{Map, Value, json};

const PAGE_PARAM: &str = "page";
const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct PaginateOptions {
    /// Items per page; `None` or `0` means 10.
    pub page_size: Option<usize>,
    /// Extra params merged into every entry.
    pub params: Map<String, Value>,
    /// Extra props merged into every entry.
    pub props: Map<String, Value>,
}

/// Build enumeration entries for every page of `data`.
///
/// Returns a JSON array in the same shape an enumeration function returns,
/// so the result can be passed back unchanged.
pub fn paginate(
    route: &RouteDescriptor,
    trailing: TrailingSlash,
    base: &str,
    data: &[Value],
    options: &PaginateOptions,
) -> Result<Value, RouteError> {
    let numbered_first = if route.pattern.is_spread(PAGE_PARAM) {
        false
    } else if route.params().iter().any(|p| p == PAGE_PARAM) {
        true
    } else {
        return Err(RouteError::PageParamNotFound {
            route: route.route().to_string(),
        });
    };

    let page_size = options
        .page_size
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let last_page = data.len().div_ceil(page_size).max(1);
    let extra = params_from_json(&route.component, &options.params)?;

    let url_for = |page: usize| -> Result<String, RouteError> {
        let mut params: Params = extra.clone();
        let value = if numbered_first || page > 1 {
            ParamValue::String(page.to_string())
        } else {
            ParamValue::Undefined
        };
        params.insert(PAGE_PARAM.to_string(), value);
        let path = ParamKeyCodec::encode(&params, route, trailing)?;
        Ok(add_route_base(&path, base))
    };

    let mut entries = Vec::with_capacity(last_page);
    for page in 1..=last_page {
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(data.len());

        let mut params = options.params.clone();
        if numbered_first || page > 1 {
            params.insert(PAGE_PARAM.to_string(), Value::String(page.to_string()));
        }

        let next = (page < last_page).then(|| url_for(page + 1)).transpose()?;
        let prev = (page > 1).then(|| url_for(page - 1)).transpose()?;
        let first = (page > 1).then(|| url_for(1)).transpose()?;
        let last = (page < last_page).then(|| url_for(last_page)).transpose()?;

        let mut props = options.props.clone();
        props.insert(
            PAGE_PARAM.to_string(),
            json!({
                "data": data.get(start..end).unwrap_or_default(),
                "start": start,
                // Index of the last item; -1 when the page is empty.
                "end": end as i64 - 1,
                "size": page_size,
                "total": data.len(),
                "currentPage": page,
                "lastPage": last_page,
                "url": {
                    "current": url_for(page)?,
                    "next": next,
                    "prev": prev,
                    "first": first,
                    "last": last,
                },
            }),
        );

        entries.push(json!({ "params": params, "props": props }));
    }

    Ok(Value::Array(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteType;

    fn items(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!(i)).collect()
    }

    #[test]
    fn test_spread_page_first_is_unnumbered() {
        let route =
            RouteDescriptor::new("/blog/[...page]", "src/pages/blog.astro", RouteType::Page, true)
                .unwrap();
        let opts = PaginateOptions {
            page_size: Some(2),
            ..Default::default()
        };
        let out = paginate(&route, TrailingSlash::Never, "/", &items(5), &opts).unwrap();
        let pages = out.as_array().unwrap();
        assert_eq!(pages.len(), 3);

        assert!(pages[0]["params"].get("page").is_none());
        assert_eq!(pages[1]["params"]["page"], "2");

        let first = &pages[0]["props"]["page"];
        assert_eq!(first["url"]["current"], "/blog");
        assert_eq!(first["url"]["next"], "/blog/2");
        assert!(first["url"]["prev"].is_null());
        assert_eq!(first["data"], json!([0, 1]));

        let last = &pages[2]["props"]["page"];
        assert_eq!(last["url"]["prev"], "/blog/2");
        assert_eq!(last["url"]["first"], "/blog");
        assert_eq!(last["data"], json!([4]));
        assert_eq!(last["end"], 4);
    }

    #[test]
    fn test_numbered_page_with_base() {
        let route =
            RouteDescriptor::new("/tags/[tag]/[page]", "src/pages/tag.astro", RouteType::Page, true)
                .unwrap();
        let mut params = Map::new();
        params.insert("tag".into(), json!("rust"));
        let opts = PaginateOptions {
            page_size: None,
            params,
            props: Map::new(),
        };
        let out = paginate(&route, TrailingSlash::Always, "/docs", &items(11), &opts).unwrap();
        let pages = out.as_array().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0]["params"]["page"], "1");
        assert_eq!(pages[0]["props"]["page"]["url"]["current"], "/docs/tags/rust/1/");
        assert_eq!(pages[0]["props"]["page"]["url"]["last"], "/docs/tags/rust/2/");
    }

    #[test]
    fn test_empty_data_yields_one_page() {
        let route =
            RouteDescriptor::new("/list/[page]", "src/pages/list.astro", RouteType::Page, true)
                .unwrap();
        let out = paginate(&route, TrailingSlash::Ignore, "/", &[], &Default::default()).unwrap();
        let pages = out.as_array().unwrap();
        assert_eq!(pages.len(), 1);

        let page = &pages[0]["props"]["page"];
        assert_eq!(page["start"], 0);
        assert_eq!(page["end"], -1);
        assert_eq!(page["data"], json!([]));
        assert_eq!(page["total"], 0);
    }

    #[test]
    fn test_requires_page_param() {
        let route =
            RouteDescriptor::new("/list/[slug]", "src/pages/list.astro", RouteType::Page, true)
                .unwrap();
        let err = paginate(&route, TrailingSlash::Ignore, "/", &[], &Default::default());
        assert!(matches!(err, Err(RouteError::PageParamNotFound { .. })));
    }
}
