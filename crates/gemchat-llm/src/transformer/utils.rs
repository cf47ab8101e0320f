/// Transformer utilities
use serde_json::Value;

/// Safe get from JSON value.
///
/// Path segments are separated by `.`; a numeric segment indexes into an array,
/// so `candidates.0.content` walks `candidates[0].content`.
pub fn safe_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;

    for part in path.split('.') {
        current = match current {
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => current.get(part)?,
        };
    }

    Some(current)
}

/// Safe get string from JSON
pub fn safe_get_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    safe_get(value, path)?.as_str()
}
