//! Dot-separated concern path utilities.
//!
//! A *concern* is a dot-separated string locating a nested field within a
//! view-model document, e.g. `"list.items"` points at the `items` field of
//! the `list` object. Array elements are addressed by numeric steps.
//!
//! # Example
//!
//! ```
//! use skylift_concern::{parse_concern, get, resolve};
//! use serde_json::json;
//!
//! let doc = json!({"list": {"items": [1, 2]}});
//!
//! let path = parse_concern("list.items");
//! assert_eq!(path, vec!["list".to_string(), "items".to_string()]);
//! assert_eq!(get(&doc, &path), Some(&json!([1, 2])));
//!
//! let resolved = resolve(&doc, "list.items");
//! assert_eq!(
//!     resolved.anchor,
//!     Some((vec!["list".to_string()], "items".to_string()))
//! );
//! ```

use serde_json::Value;

pub mod types;
pub use types::{Path, PathStep, Resolved};

/// Split a concern string into path steps.
///
/// An empty concern yields a single empty step, matching the behavior of
/// splitting on `.`; [`resolve`] treats an empty step as the end of the walk.
///
/// # Example
///
/// ```
/// use skylift_concern::parse_concern;
///
/// assert_eq!(parse_concern("list.items"), vec!["list", "items"]);
/// assert_eq!(parse_concern(""), vec![""]);
/// ```
pub fn parse_concern(concern: &str) -> Path {
    concern.split('.').map(str::to_string).collect()
}

/// Join path steps back into a concern string.
pub fn format_concern(path: &[PathStep]) -> String {
    path.join(".")
}

/// JSON truthiness: everything except `null`, `false`, `0`, and `""`.
///
/// Resolution only descends into truthy values, so a falsy value ends the
/// walk even when steps remain.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Index one step into a value: object key lookup, or array element lookup
/// when the step parses as an index.
pub fn step<'a>(value: &'a Value, path_step: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(path_step),
        Value::Array(arr) => arr.get(path_step.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Mutable variant of [`step`].
pub fn step_mut<'a>(value: &'a mut Value, path_step: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(path_step),
        Value::Array(arr) => arr.get_mut(path_step.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Get the value at `path`, or `None` if any step is missing.
///
/// # Example
///
/// ```
/// use skylift_concern::{get, parse_concern};
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": [10, 20]}});
/// assert_eq!(get(&doc, &parse_concern("a.b.1")), Some(&json!(20)));
/// assert_eq!(get(&doc, &parse_concern("a.missing")), None);
/// ```
pub fn get<'a>(value: &'a Value, path: &[PathStep]) -> Option<&'a Value> {
    let mut current = value;
    for path_step in path {
        current = step(current, path_step)?;
    }
    Some(current)
}

/// Mutable variant of [`get`].
pub fn get_mut<'a>(value: &'a mut Value, path: &[PathStep]) -> Option<&'a mut Value> {
    let mut current = value;
    for path_step in path {
        current = step_mut(current, path_step)?;
    }
    Some(current)
}

/// Resolve a concern against a document.
///
/// Walks from the root, following each step while the current value is
/// truthy (see [`is_truthy`]) and the step is non-empty. The walk records
/// the last `(parent path, key)` pair it reached — the *anchor* — even when
/// it stops at a missing step, so a caller holding a replacement value knows
/// where to write it.
///
/// The value at the anchor slot (which may be absent) is the target of the
/// concern; when no step was consumed the target is the root and the anchor
/// is `None`. Steps past the first missing or falsy value are dropped.
///
/// # Example
///
/// ```
/// use skylift_concern::resolve;
/// use serde_json::json;
///
/// let doc = json!({"list": {"items": []}});
///
/// // Full walk: anchor is (["list"], "items").
/// let hit = resolve(&doc, "list.items");
/// assert_eq!(hit.anchor, Some((vec!["list".to_string()], "items".to_string())));
///
/// // Missing step: the anchor still points at the reachable slot.
/// let miss = resolve(&doc, "list.missing.deep");
/// assert_eq!(miss.anchor, Some((vec!["list".to_string()], "missing".to_string())));
///
/// // Empty concern: the root itself, no anchor.
/// assert_eq!(resolve(&doc, "").anchor, None);
/// ```
pub fn resolve(root: &Value, concern: &str) -> Resolved {
    let mut anchor: Option<(Path, PathStep)> = None;
    let mut prefix: Path = Vec::new();
    let mut current: Option<&Value> = Some(root);

    for path_step in concern.split('.') {
        if path_step.is_empty() {
            break;
        }
        let value = match current {
            Some(value) if is_truthy(value) => value,
            _ => break,
        };
        anchor = Some((prefix.clone(), path_step.to_string()));
        current = step(value, path_step);
        prefix.push(path_step.to_string());
    }

    Resolved { anchor }
}
