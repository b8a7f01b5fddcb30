//! Route pattern parsing, path generation and request matching.
//!
//! A route like `/blog/[slug]` or `/docs/[...path]` is split into segments,
//! each made of static and dynamic parts:
//!
//! ```text
//! /blog/[lang]-[slug].html
//!  ^^^^  ^^^^^^^^^^^^^^^^^
//!  [static "blog"] [dynamic "lang", static "-", dynamic "slug", static ".html"]
//! ```

use super::RouteError;
use super::params::{ParamValue, Params};
use crate::core::TrailingSlash;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Valid dynamic part content: optional `...` followed by an identifier.
static RE_PARAM_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\.\.\.)?[a-zA-Z0-9_$]+$").unwrap());

// ============================================================================
// Parts and segments
// ============================================================================

/// One static or dynamic piece of a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePart {
    /// Static text, or the parameter name (without `...`) for dynamic parts.
    pub content: String,
    pub dynamic: bool,
    pub spread: bool,
}

impl RoutePart {
    fn literal(content: &str) -> Self {
        Self {
            content: content.to_string(),
            dynamic: false,
            spread: false,
        }
    }
}

pub type Segment = Vec<RoutePart>;

/// Coarse specificity class of a segment, lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SegmentClass {
    Static,
    Dynamic,
    Spread,
}

fn classify(segment: &Segment) -> SegmentClass {
    if segment.iter().any(|p| p.spread) {
        SegmentClass::Spread
    } else if segment.iter().any(|p| p.dynamic) {
        SegmentClass::Dynamic
    } else {
        SegmentClass::Static
    }
}

fn is_lone_spread(segment: &Segment) -> bool {
    segment.len() == 1 && segment[0].spread
}

// ============================================================================
// RoutePattern
// ============================================================================

/// A parsed route with a compiled request matcher.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    route: String,
    segments: Vec<Segment>,
    params: Vec<String>,
    matcher: Regex,
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.route == other.route && self.segments == other.segments
    }
}

impl Eq for RoutePattern {}

impl RoutePattern {
    /// Parse a route string such as `/blog/[slug]`.
    pub fn parse(route: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            route: route.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        for raw in route.split('/').filter(|s| !s.is_empty()) {
            if raw.contains("][") {
                return Err(invalid("parameters must be separated"));
            }
            if raw.matches('[').count() != raw.matches(']').count() {
                return Err(invalid("brackets are unbalanced"));
            }
            segments.push(parse_segment(raw).map_err(|reason| invalid(&reason))?);
        }

        let params: Vec<String> = segments
            .iter()
            .flatten()
            .filter(|p| p.dynamic)
            .map(|p| p.content.clone())
            .collect();

        let suffix = if segments.is_empty() { "$" } else { "/?$" };
        let matcher = Regex::new(&build_source(&segments, "/", suffix))
            .map_err(|e| invalid(&format!("cannot compile matcher: {e}")))?;

        Ok(Self {
            route: normalize_route(route),
            segments,
            params,
            matcher,
        })
    }

    #[inline]
    pub fn route(&self) -> &str {
        &self.route
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in declaration order (spread names without `...`).
    #[inline]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// True when no segment has a dynamic part.
    pub fn is_static(&self) -> bool {
        self.params.is_empty()
    }

    /// Whether the named parameter is declared as `[...name]`.
    pub fn is_spread(&self, name: &str) -> bool {
        self.segments
            .iter()
            .flatten()
            .any(|p| p.spread && p.content == name)
    }

    /// Whether any spread part shares a segment with other parts.
    pub fn has_embedded_spread(&self) -> bool {
        self.segments
            .iter()
            .any(|seg| seg.iter().any(|p| p.spread) && seg.len() > 1)
    }

    /// The fixed request path of a route without parameters.
    pub fn pathname(&self) -> Option<String> {
        if !self.is_static() {
            return None;
        }
        let joined: Vec<&str> = self
            .segments
            .iter()
            .flatten()
            .map(|p| p.content.as_str())
            .collect();
        Some(format!("/{}", joined.join("/")))
    }

    /// Regex source for runtime matching, `/` escaped for JS consumers.
    pub fn pattern_source(&self, trailing: TrailingSlash) -> String {
        let suffix = match trailing {
            TrailingSlash::Always if !self.segments.is_empty() => "\\/$",
            TrailingSlash::Ignore if !self.segments.is_empty() => "\\/?$",
            _ => "$",
        };
        build_source(&self.segments, "\\/", suffix)
    }

    /// Fill the route with parameter values.
    ///
    /// The result has no trailing slash (except the root `/`). Undefined or
    /// empty values collapse their segment, which only a spread may do
    /// silently; a missing non-spread value is an error.
    pub fn generate(&self, params: &Params) -> Result<String, RouteError> {
        let mut out = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let mut piece = String::new();
            for part in segment {
                if !part.dynamic {
                    piece.push_str(&part.content);
                    continue;
                }
                match params.get(&part.content).and_then(ParamValue::as_segment) {
                    Some(value) => {
                        if !part.spread && value.contains('/') {
                            return Err(RouteError::SlashInParam {
                                route: self.route.clone(),
                                param: part.content.clone(),
                                value,
                            });
                        }
                        piece.push_str(&value);
                    }
                    None if part.spread => {}
                    None if params.contains_key(&part.content) => {}
                    None => {
                        return Err(RouteError::MissingParam {
                            route: self.route.clone(),
                            param: part.content.clone(),
                        });
                    }
                }
            }
            if !piece.is_empty() {
                out.push(piece);
            }
        }
        Ok(format!("/{}", out.join("/")))
    }

    /// Match a request path, returning decoded parameters on success.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let caps = self.matcher.captures(path)?;
        let mut params = Params::new();
        for (i, name) in self.params.iter().enumerate() {
            let value = match caps.get(i + 1) {
                Some(m) if !m.as_str().is_empty() => {
                    let raw = m.as_str();
                    let decoded = percent_decode_str(raw)
                        .decode_utf8()
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| raw.to_string());
                    ParamValue::String(decoded)
                }
                _ => ParamValue::Undefined,
            };
            params.insert(name.clone(), value);
        }
        Some(params)
    }

    /// Priority order: more specific routes first.
    ///
    /// Segments are compared left to right. Static beats dynamic, dynamic
    /// beats spread. Among static segments the longer literal wins. A route
    /// that ends where the other continues with a spread is the more
    /// specific one. Equal routes keep declaration order (stable sort).
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            match (self.segments.get(i), other.segments.get(i)) {
                (None, Some(b)) if is_lone_spread(b) => return Ordering::Less,
                (Some(a), None) if is_lone_spread(a) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Greater,
                (Some(_), None) => return Ordering::Less,
                (Some(a), Some(b)) => {
                    let ord = classify(a).cmp(&classify(b)).then_with(|| {
                        if classify(a) != SegmentClass::Static {
                            return static_chars(b).cmp(&static_chars(a));
                        }
                        let (ca, cb) = (literal(a), literal(b));
                        if ca == cb {
                            Ordering::Equal
                        } else {
                            cb.len().cmp(&ca.len()).then_with(|| ca.cmp(&cb))
                        }
                    });
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                (None, None) => break,
            }
        }
        Ordering::Equal
    }
}

fn literal(segment: &Segment) -> String {
    segment.iter().map(|p| p.content.as_str()).collect()
}

fn static_chars(segment: &Segment) -> usize {
    segment
        .iter()
        .filter(|p| !p.dynamic)
        .map(|p| p.content.len())
        .sum()
}

fn normalize_route(route: &str) -> String {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Split one raw segment into parts, validating parameter names.
fn parse_segment(raw: &str) -> Result<Segment, String> {
    let mut parts = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        if open > 0 {
            parts.push(RoutePart::literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after.find(']').ok_or("brackets are unbalanced")?;
        let inner = &after[..close];
        if inner.contains('[') {
            return Err("brackets are unbalanced".to_string());
        }
        if !RE_PARAM_NAME.is_match(inner) {
            return Err(format!("invalid parameter name `{inner}`"));
        }
        let spread = inner.starts_with("...");
        parts.push(RoutePart {
            content: inner.trim_start_matches("...").to_string(),
            dynamic: true,
            spread,
        });
        rest = &after[close + 1..];
    }

    if rest.contains(']') {
        return Err("brackets are unbalanced".to_string());
    }
    if !rest.is_empty() {
        parts.push(RoutePart::literal(rest));
    }
    Ok(parts)
}

fn build_source(segments: &[Segment], sep: &str, suffix: &str) -> String {
    let mut source = String::from("^");
    if segments.is_empty() {
        source.push_str(sep);
    }
    for segment in segments {
        if is_lone_spread(segment) {
            source.push_str(&format!("(?:{sep}(.*?))?"));
            continue;
        }
        source.push_str(sep);
        for part in segment {
            if part.spread {
                source.push_str("(.*?)");
            } else if part.dynamic {
                source.push_str("([^/]+?)");
            } else {
                source.push_str(&regex::escape(&part.content));
            }
        }
    }
    source.push_str(suffix);
    source
}
