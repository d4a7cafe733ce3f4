//! Layer merge logic
//!
//! Config layers are merged as JSON before they reach a container:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use serde_json::{Map, Value};

use super::layers::ConfigError;

/// Deep merge two JSON values.
///
/// Null in the overlay overrides too; with `none_to_default` options that
/// resets the option to its default.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays and scalars: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), deep_merge)
}

/// Parse a `key.path=value` override into a nested object.
///
/// The value is read as JSON when it parses as JSON, otherwise it is taken
/// as a plain string, so `--set port=8080` gives a number and
/// `--set host=example.org` a string.
pub fn parse_override(assignment: &str) -> Result<Value, ConfigError> {
    let (path, raw) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(assignment.to_string()))?;

    let path = path.trim();
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(ConfigError::InvalidOverride(assignment.to_string()));
    }

    let value: Value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    Ok(path.rsplit('.').fold(value, |inner, key| {
        let mut map = Map::new();
        map.insert(key.to_string(), inner);
        Value::Object(map)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(json!({"retries": 3}), json!({"retries": 5}));
        assert_eq!(result["retries"], 5);
    }

    #[test]
    fn test_nested_container_merge() {
        let base = json!({
            "database": {"host": "localhost", "port": 5432}
        });
        let overlay = json!({
            "database": {"host": "db.internal"}
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["database"]["host"], "db.internal");
        assert_eq!(result["database"]["port"], 5432);
    }

    #[test]
    fn test_list_replaced() {
        let result = deep_merge(json!({"tags": ["a", "b", "c"]}), json!({"tags": ["x"]}));
        assert_eq!(result["tags"], json!(["x"]));
    }

    #[test]
    fn test_null_overrides() {
        let result = deep_merge(json!({"timeout": 30}), json!({"timeout": null}));
        assert!(result["timeout"].is_null());
    }

    #[test]
    fn test_merge_layers_precedence() {
        let result = merge_layers(vec![
            json!({"timeout": 30, "database": {"host": "a"}}),
            json!({"timeout": 60}),
            json!({"database": {"host": "b"}}),
        ]);

        assert_eq!(result, json!({"timeout": 60, "database": {"host": "b"}}));
    }

    #[test]
    fn test_merge_no_layers_is_empty_object() {
        assert_eq!(merge_layers(Vec::new()), json!({}));
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("port=8080").unwrap(), json!({"port": 8080}));
        assert_eq!(
            parse_override("database.host=db.internal").unwrap(),
            json!({"database": {"host": "db.internal"}})
        );
        assert_eq!(parse_override("flag=true").unwrap(), json!({"flag": true}));
        assert_eq!(parse_override("empty=").unwrap(), json!({"empty": ""}));
    }

    #[test]
    fn test_parse_override_rejects_malformed() {
        assert!(parse_override("no-equals").is_err());
        assert!(parse_override("=1").is_err());
        assert!(parse_override("a..b=1").is_err());
    }
}
