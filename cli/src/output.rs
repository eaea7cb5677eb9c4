//! Table and JSON rendering of response payloads.

use clap::ValueEnum;
use comfy_table::{presets, Table};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One cell: strings bare, null empty, nested values as compact JSON.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Columns to show: the requested ones, else the keys of the first item.
pub fn columns_for(items: &[Value], requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    items
        .first()
        .and_then(Value::as_object)
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default()
}

pub fn render_list(items: &[Value], requested: &[String]) -> String {
    let columns = columns_for(items, requested);
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(columns.clone());
    for item in items {
        table.add_row(
            columns
                .iter()
                .map(|column| item.get(column).map(cell).unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }
    table.to_string()
}

/// Field/Value table for a single resource.
pub fn render_object(item: &Value) -> String {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);
    match item.as_object() {
        Some(object) => {
            for (key, value) in object {
                table.add_row(vec![key.clone(), cell(value)]);
            }
        }
        None => {
            table.add_row(vec!["value".to_string(), cell(item)]);
        }
    }
    table.to_string()
}

pub fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells_flatten_values() {
        assert_eq!(cell(&json!(null)), "");
        assert_eq!(cell(&json!("net1")), "net1");
        assert_eq!(cell(&json!(true)), "true");
        assert_eq!(cell(&json!(1500)), "1500");
        assert_eq!(cell(&json!(["a", "b"])), r#"["a","b"]"#);
        assert_eq!(cell(&json!({"subnet_id": "s1"})), r#"{"subnet_id":"s1"}"#);
    }

    #[test]
    fn columns_follow_first_item_keys() {
        let items = vec![json!({"id": "1", "name": "a", "status": "ACTIVE"})];
        assert_eq!(columns_for(&items, &[]), vec!["id", "name", "status"]);
        assert_eq!(
            columns_for(&items, &["name".to_string()]),
            vec!["name".to_string()]
        );
        assert!(columns_for(&[], &[]).is_empty());
    }

    #[test]
    fn list_table_contains_every_row() {
        let items = vec![
            json!({"id": "1", "name": "alpha"}),
            json!({"id": "2", "name": "beta", "extra": "ignored"}),
        ];
        let table = render_list(&items, &[]);
        assert!(table.contains("id"));
        assert!(table.contains("alpha"));
        assert!(table.contains("beta"));
        assert!(!table.contains("ignored"));
    }

    #[test]
    fn missing_columns_render_empty() {
        let items = vec![json!({"id": "1"})];
        let table = render_list(&items, &["id".to_string(), "name".to_string()]);
        assert!(table.contains("name"));
        assert!(table.contains('1'));
    }

    #[test]
    fn object_table_lists_fields() {
        let table = render_object(&json!({"id": "n1", "admin_state_up": false}));
        assert!(table.contains("Field"));
        assert!(table.contains("admin_state_up"));
        assert!(table.contains("false"));
    }

    #[test]
    fn json_output_is_pretty() {
        assert_eq!(render_json(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }
}
