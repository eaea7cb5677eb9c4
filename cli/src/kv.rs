//! `key=value` flag parsing for request bodies.
//!
//! `--set name=net1` sets one field. `--item fixed_ips:subnet_id=s1,ip_address=10.0.0.5`
//! appends one object to an array field, the shape used by fixed-IP,
//! listener and pool-member style flags. Values that parse as JSON keep
//! their type (`true`, `3`, `["a"]`); anything else is a string.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

/// Split `key=value` on the first `=`.
pub fn parse_key_value(text: &str) -> Result<(String, Value)> {
    let (key, value) = text
        .split_once('=')
        .with_context(|| format!("expected KEY=VALUE, got {text:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in {text:?}");
    }
    Ok((key.to_string(), typed_value(value)))
}

/// Parse `a=1,b=2` into an object, keeping the order given.
pub fn parse_key_values(text: &str) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    for part in text.split(',').filter(|p| !p.trim().is_empty()) {
        let (key, value) = parse_key_value(part)?;
        object.insert(key, value);
    }
    if object.is_empty() {
        bail!("expected KEY=VALUE[,KEY=VALUE...], got {text:?}");
    }
    Ok(object)
}

/// Parse `field:a=1,b=2` into the array field name and one object.
pub fn parse_item(text: &str) -> Result<(String, Map<String, Value>)> {
    let (field, rest) = text
        .split_once(':')
        .with_context(|| format!("expected FIELD:KEY=VALUE[,...], got {text:?}"))?;
    let field = field.trim();
    if field.is_empty() {
        bail!("empty field name in {text:?}");
    }
    Ok((field.to_string(), parse_key_values(rest)?))
}

/// Build a request body object from `--set` and `--item` flags.
pub fn build_body(sets: &[String], items: &[String]) -> Result<Map<String, Value>> {
    let mut body = Map::new();
    for set in sets {
        let (key, value) = parse_key_value(set)?;
        body.insert(key, value);
    }
    for item in items {
        let (field, object) = parse_item(item)?;
        match body
            .entry(field.clone())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(entries) => entries.push(Value::Object(object)),
            _ => bail!("--item {field} conflicts with --set {field}"),
        }
    }
    Ok(body)
}

fn typed_value(raw: &str) -> Value {
    let raw = raw.trim();
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if !value.is_string() => value,
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_on_first_equals() {
        let (key, value) = parse_key_value("description=a=b").unwrap();
        assert_eq!(key, "description");
        assert_eq!(value, json!("a=b"));
    }

    #[test]
    fn keeps_json_types() {
        assert_eq!(parse_key_value("admin_state_up=false").unwrap().1, json!(false));
        assert_eq!(parse_key_value("mtu=1500").unwrap().1, json!(1500));
        assert_eq!(parse_key_value("tags=[\"a\",\"b\"]").unwrap().1, json!(["a", "b"]));
        assert_eq!(parse_key_value("name=net1").unwrap().1, json!("net1"));
        assert_eq!(parse_key_value("empty=").unwrap().1, json!(""));
    }

    #[test]
    fn quoted_json_string_stays_verbatim() {
        assert_eq!(parse_key_value("name=\"x\"").unwrap().1, json!("\"x\""));
    }

    #[test]
    fn rejects_missing_equals_and_empty_key() {
        assert!(parse_key_value("name").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn parses_comma_separated_pairs_in_order() {
        let object = parse_key_values("subnet_id=s1,ip_address=10.0.0.5").unwrap();
        let keys: Vec<&String> = object.keys().collect();
        assert_eq!(keys, ["subnet_id", "ip_address"]);
        assert_eq!(object["ip_address"], json!("10.0.0.5"));
    }

    #[test]
    fn empty_pair_list_is_an_error() {
        assert!(parse_key_values("").is_err());
        assert!(parse_key_values(" , ").is_err());
    }

    #[test]
    fn items_append_to_array_fields() {
        let body = build_body(
            &["name=port1".to_string()],
            &[
                "fixed_ips:subnet_id=s1,ip_address=10.0.0.5".to_string(),
                "fixed_ips:subnet_id=s2".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(
            Value::Object(body),
            json!({
                "name": "port1",
                "fixed_ips": [
                    {"subnet_id": "s1", "ip_address": "10.0.0.5"},
                    {"subnet_id": "s2"}
                ]
            })
        );
    }

    #[test]
    fn item_conflicting_with_scalar_is_an_error() {
        let err = build_body(&["fixed_ips=none".to_string()], &["fixed_ips:a=1".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn item_needs_field_name() {
        assert!(parse_item("subnet_id=s1").is_err());
        assert!(parse_item(":a=1").is_err());
    }
}
