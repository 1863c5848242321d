//! Dotted key-path helpers.
//!
//! Only the first segment names a persisted record. Later segments walk
//! object fields, or list elements when the segment is an index.

use serde_json::{Map, Value};

use crate::error::{Result, SettingsError};

use super::SettingsMap;

/// Split a path into its top-level key and the nested segments.
pub fn split(path: &str) -> (&str, Vec<&str>) {
    let mut segments = path.split('.');
    let top = segments.next().unwrap_or_default();
    (top, segments.collect())
}

/// Record key and nested segments a path addresses in `settings`.
///
/// A top-level key literally named `path` wins over path navigation.
pub fn target<'p>(settings: &SettingsMap, path: &'p str) -> (&'p str, Vec<&'p str>) {
    if settings.contains_key(path) {
        (path, Vec::new())
    } else {
        split(path)
    }
}

/// Resolve a path against the snapshot. `null` counts as absent.
pub fn lookup<'a>(settings: &'a SettingsMap, path: &str) -> Option<&'a Value> {
    let (key, segments) = target(settings, path);
    let mut current = settings.get(key)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current).filter(|value| !value.is_null())
}

/// Write `value` at `segments` below `node`, creating objects on the way.
///
/// Scalars in the way are replaced by objects. Lists accept an existing
/// index or their length (append); anything else is an invalid path.
pub fn write(node: &mut Value, segments: &[&str], value: Value, path: &str) -> Result<()> {
    let Some((head, tail)) = segments.split_first() else {
        *node = value;
        return Ok(());
    };

    if let Value::Array(items) = node {
        let index = head
            .parse::<usize>()
            .ok()
            .filter(|index| *index <= items.len())
            .ok_or_else(|| SettingsError::InvalidPath {
                path: path.to_string(),
                reason: "list segment must be an existing index or the list length",
            })?;
        if index == items.len() {
            items.push(Value::Null);
        }
        return write(&mut items[index], tail, value, path);
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        return write(child, tail, value, path);
    }
    Ok(())
}

/// Remove the field at `segments` below `node`. Returns whether anything changed.
pub fn remove(node: &mut Value, segments: &[&str]) -> bool {
    let Some((head, tail)) = segments.split_first() else {
        return false;
    };

    match node {
        Value::Object(map) if tail.is_empty() => map.remove(*head).is_some(),
        Value::Object(map) => map.get_mut(*head).is_some_and(|child| remove(child, tail)),
        Value::Array(items) => {
            let Some(index) = head.parse::<usize>().ok().filter(|i| *i < items.len()) else {
                return false;
            };
            if tail.is_empty() {
                items.remove(index);
                true
            } else {
                remove(&mut items[index], tail)
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> SettingsMap {
        let Value::Object(map) = json!({
            "a": {"b": {"c": 1}, "list": [10, {"x": "y"}], "empty": null},
            "scalar": 5,
            "dotted.key": "literal",
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn test_split() {
        assert_eq!(split("a"), ("a", vec![]));
        assert_eq!(split("a.b.c"), ("a", vec!["b", "c"]));
    }

    #[test]
    fn test_lookup() {
        let settings = settings();
        assert_eq!(lookup(&settings, "a.b.c"), Some(&json!(1)));
        assert_eq!(lookup(&settings, "a.b"), Some(&json!({"c": 1})));
        assert_eq!(lookup(&settings, "a.list.1.x"), Some(&json!("y")));
        assert_eq!(lookup(&settings, "dotted.key"), Some(&json!("literal")));
        assert_eq!(lookup(&settings, "scalar"), Some(&json!(5)));
    }

    #[test]
    fn test_lookup_absent() {
        let settings = settings();
        assert_eq!(lookup(&settings, "missing"), None);
        assert_eq!(lookup(&settings, "a.missing"), None);
        assert_eq!(lookup(&settings, "scalar.deeper"), None);
        assert_eq!(lookup(&settings, "a.list.9"), None);
        assert_eq!(lookup(&settings, "a.list.x"), None);
        assert_eq!(lookup(&settings, "a.empty"), None);
    }

    #[test]
    fn test_write_creates_objects() {
        let mut root = Value::Null;
        write(&mut root, &["b", "c"], json!(1), "a.b.c").unwrap();
        assert_eq!(root, json!({"b": {"c": 1}}));

        write(&mut root, &["b", "d"], json!(2), "a.b.d").unwrap();
        assert_eq!(root, json!({"b": {"c": 1, "d": 2}}));

        let mut scalar = json!(5);
        write(&mut scalar, &["x"], json!(true), "s.x").unwrap();
        assert_eq!(scalar, json!({"x": true}));
    }

    #[test]
    fn test_write_into_lists() {
        let mut root = json!({"list": [1, 2]});
        write(&mut root, &["list", "0"], json!(9), "a.list.0").unwrap();
        write(&mut root, &["list", "2"], json!(3), "a.list.2").unwrap();
        assert_eq!(root, json!({"list": [9, 2, 3]}));

        let err = write(&mut root, &["list", "7"], json!(0), "a.list.7").unwrap_err();
        assert!(matches!(err, SettingsError::InvalidPath { ref path, .. } if path == "a.list.7"));
        assert!(write(&mut root, &["list", "name"], json!(0), "a.list.name").is_err());
    }

    #[test]
    fn test_remove() {
        let mut root = json!({"b": {"c": 1, "d": 2}, "list": [1, 2, 3]});
        assert!(remove(&mut root, &["b", "c"]));
        assert!(remove(&mut root, &["list", "1"]));
        assert_eq!(root, json!({"b": {"d": 2}, "list": [1, 3]}));

        assert!(!remove(&mut root, &["b", "c"]));
        assert!(!remove(&mut root, &["b", "d", "deeper"]));
        assert!(!remove(&mut root, &["list", "5"]));
        assert!(!remove(&mut root, &[]));
    }
}
