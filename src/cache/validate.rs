//! Shape validation for enumeration results.

use super::RouteCacheError;
use crate::route::params::{json_type_name, params_from_json};
use crate::route::{RouteDescriptor, StaticPathItem};
use serde_json::Value;

/// Check an enumeration result and convert it into typed items.
///
/// The value must be an array of objects, each with a `params` object whose
/// values are strings, numbers or absent. Every failure names the component
/// and shows the offending value.
pub(super) fn validate_static_paths(
    route: &RouteDescriptor,
    value: Value,
) -> Result<Vec<StaticPathItem>, RouteCacheError> {
    let component = route.component.as_str();

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(RouteCacheError::InvalidReturn {
                component: component.to_string(),
                received: other.to_string(),
                kind: json_type_name(&other),
            });
        }
    };

    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let mut object = match entry {
            Value::Object(object) => object,
            other => {
                return Err(RouteCacheError::InvalidEntry {
                    component: component.to_string(),
                    index,
                    received: other.to_string(),
                    kind: json_type_name(&other),
                });
            }
        };

        let params = match object.remove("params") {
            Some(Value::Object(params)) => params,
            other => {
                return Err(RouteCacheError::MissingParams {
                    component: component.to_string(),
                    index,
                    received: other.map(|v| v.to_string()).unwrap_or_else(|| "nothing".into()),
                });
            }
        };

        let params = params_from_json(component, &params)?;
        for (key, value) in &params {
            if value.is_empty_string() {
                crate::log!(
                    "warn";
                    "invalid path param `{key}` in {component}: `undefined` expected for an optional param, got an empty string"
                );
            }
        }

        let mut item = StaticPathItem::new(params);
        if let Some(props) = object.remove("props") {
            item = item.with_props(props);
        }
        items.push(item);
    }

    Ok(items)
}
