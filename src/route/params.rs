//! Route parameters and their canonical keys.
//!
//! Enumeration results arrive as JSON. Each parameter value must be a
//! string, a number or absent; anything else is rejected with the key,
//! the offending value and its JSON type.

use super::{RouteDescriptor, RouteError};
use crate::core::TrailingSlash;
use crate::core::path::trim_slashes;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Parameter values keyed by name, ordered for deterministic output.
pub type Params = BTreeMap<String, ParamValue>;

// ============================================================================
// ParamValue
// ============================================================================

/// A single route parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Explicitly unset, only meaningful for spread parameters.
    Undefined,
    String(String),
    Number(Number),
}

impl ParamValue {
    /// Convert an enumeration value, rejecting unsupported JSON types.
    pub fn from_json(component: &str, key: &str, value: &Value) -> Result<Self, RouteError> {
        match value {
            Value::String(s) => Ok(Self::String(s.clone())),
            Value::Number(n) => Ok(Self::Number(n.clone())),
            other => Err(RouteError::InvalidParamType {
                component: component.to_string(),
                key: key.to_string(),
                value: other.to_string(),
                kind: json_type_name(other),
            }),
        }
    }

    /// The text placed into a path, `None` when undefined.
    ///
    /// String values lose their surrounding slashes so `"/a/b/"` and
    /// `"a/b"` produce the same path.
    pub fn as_segment(&self) -> Option<String> {
        match self {
            Self::Undefined => None,
            Self::String(s) => Some(trim_slashes(s).to_string()),
            Self::Number(n) => Some(number_segment(n)),
        }
    }

    #[inline]
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }
}

/// Integral floats render without a fraction (`1.0` → `1`), the way a
/// request path spells them.
fn number_segment(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
            format!("{f:.0}")
        }
        _ => n.to_string(),
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined => serializer.serialize_none(),
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => n.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Self::Undefined),
            Value::String(s) => Ok(Self::String(s)),
            Value::Number(n) => Ok(Self::Number(n)),
            other => Err(de::Error::custom(format!(
                "expected string, number or null param value, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// Run-time type name of a JSON value, as a script author would see it.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert a JSON object into typed params.
pub fn params_from_json(component: &str, object: &Map<String, Value>) -> Result<Params, RouteError> {
    object
        .iter()
        .map(|(key, value)| Ok((key.clone(), ParamValue::from_json(component, key, value)?)))
        .collect()
}

// ============================================================================
// StaticPathItem
// ============================================================================

/// One enumerated page: its params and optional props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticPathItem {
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
}

impl StaticPathItem {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            props: None,
        }
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = Some(props);
        self
    }
}

// ============================================================================
// ParamKeyCodec
// ============================================================================

/// Maps params to the canonical lookup key of a route.
///
/// The key is the generated path under the trailing-slash policy, so the
/// params that produced a page and the params matched from a request for
/// that page always agree.
pub struct ParamKeyCodec;

impl ParamKeyCodec {
    /// Canonical key for a param set.
    pub fn encode(
        params: &Params,
        route: &RouteDescriptor,
        trailing: TrailingSlash,
    ) -> Result<String, RouteError> {
        let raw = route.pattern.generate(params)?;
        Ok(trailing.normalize(&raw))
    }

    /// Canonical key for an incoming request path, `None` if the route
    /// does not match it.
    pub fn key_for_request(
        path: &str,
        route: &RouteDescriptor,
        trailing: TrailingSlash,
    ) -> Result<Option<String>, RouteError> {
        match route.pattern.match_path(path) {
            Some(params) => Self::encode(&params, route, trailing).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteType;
    use serde_json::json;

    fn route(pattern: &str) -> RouteDescriptor {
        RouteDescriptor::new(pattern, "src/pages/test.astro", RouteType::Page, true).unwrap()
    }

    #[test]
    fn test_rejects_boolean_and_object() {
        let err = ParamValue::from_json("src/pages/x.astro", "slug", &json!(true)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("slug"));
        assert!(msg.contains("true"));
        assert!(msg.contains("boolean"));

        let err = ParamValue::from_json("src/pages/x.astro", "id", &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, RouteError::InvalidParamType { kind: "object", .. }));
    }

    #[test]
    fn test_number_and_string_keys_agree() {
        let r = route("/page/[n]");
        let mut as_num = Params::new();
        as_num.insert("n".into(), ParamValue::Number(2.into()));
        let mut as_str = Params::new();
        as_str.insert("n".into(), "2".into());

        let a = ParamKeyCodec::encode(&as_num, &r, TrailingSlash::Ignore).unwrap();
        let b = ParamKeyCodec::encode(&as_str, &r, TrailingSlash::Ignore).unwrap();
        assert_eq!(a, "/page/2");
        assert_eq!(a, b);
    }

    #[test]
    fn test_integral_float_keys_match_requests() {
        let r = route("/p/[n]");
        let mut params = Params::new();
        params.insert("n".into(), ParamValue::Number(Number::from_f64(1.0).unwrap()));
        let key = ParamKeyCodec::encode(&params, &r, TrailingSlash::Ignore).unwrap();
        assert_eq!(key, "/p/1");
        assert_eq!(
            ParamKeyCodec::key_for_request("/p/1", &r, TrailingSlash::Ignore).unwrap(),
            Some(key)
        );

        params.insert("n".into(), ParamValue::Number(Number::from_f64(1.5).unwrap()));
        assert_eq!(
            ParamKeyCodec::encode(&params, &r, TrailingSlash::Ignore).unwrap(),
            "/p/1.5"
        );
        params.insert("n".into(), ParamValue::Number(Number::from_f64(-0.0).unwrap()));
        assert_eq!(
            ParamKeyCodec::encode(&params, &r, TrailingSlash::Ignore).unwrap(),
            "/p/0"
        );
    }

    #[test]
    fn test_key_symmetry_with_request_path() {
        let r = route("/posts/[...slug]");
        for policy in [TrailingSlash::Always, TrailingSlash::Never, TrailingSlash::Ignore] {
            let mut params = Params::new();
            params.insert("slug".into(), "a/b".into());
            let key = ParamKeyCodec::encode(&params, &r, policy).unwrap();
            let from_request = ParamKeyCodec::key_for_request(&key, &r, policy).unwrap();
            assert_eq!(from_request.as_deref(), Some(key.as_str()), "policy {policy}");
        }
    }

    #[test]
    fn test_spread_keys() {
        let r = route("/posts/[...slug]");
        let keys: Vec<String> = [Some("a"), Some("b"), None]
            .iter()
            .map(|v| {
                let mut params = Params::new();
                params.insert(
                    "slug".into(),
                    v.map(ParamValue::from).unwrap_or(ParamValue::Undefined),
                );
                ParamKeyCodec::encode(&params, &r, TrailingSlash::Never).unwrap()
            })
            .collect();
        assert_eq!(keys, ["/posts/a", "/posts/b", "/posts"]);
    }

    #[test]
    fn test_string_values_trim_slashes() {
        let r = route("/docs/[...path]");
        let mut params = Params::new();
        params.insert("path".into(), "/guide/intro/".into());
        assert_eq!(
            ParamKeyCodec::encode(&params, &r, TrailingSlash::Always).unwrap(),
            "/docs/guide/intro/"
        );
    }

    #[test]
    fn test_param_value_serde() {
        let item: StaticPathItem =
            serde_json::from_value(json!({"params": {"a": "x", "b": 3, "c": null}})).unwrap();
        assert_eq!(item.params["c"], ParamValue::Undefined);
        assert!(item.props.is_none());

        let bad = serde_json::from_value::<StaticPathItem>(json!({"params": {"a": false}}));
        assert!(bad.is_err());
    }
}
