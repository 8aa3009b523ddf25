/*!
Schema inference from example values.

The inferred schema describes the example structurally: type from the JSON
kind, `format` from recognizable string literals, `items` from the first array
element and `required` from the non-null object keys.
*/

use super::specification::Schema;
use crate::pattern;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(&EMAIL, r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
}

fn date_regex() -> Option<&'static Regex> {
    static DATE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(&DATE, r"^\d{4}-\d{2}-\d{2}$")
}

fn date_time_regex() -> Option<&'static Regex> {
    static DATE_TIME: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(&DATE_TIME, r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(:\d{2})?")
}

fn uuid_regex() -> Option<&'static Regex> {
    static UUID: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(
        &UUID,
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
}

/// Infer a schema describing `example`
pub fn infer_schema(example: &Value) -> Schema {
    match example {
        Value::Null => Schema {
            nullable: Some(true),
            ..Schema::of_type("string")
        },
        Value::Bool(_) => Schema::of_type("boolean"),
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                Schema::of_type("integer")
            } else {
                Schema::of_type("number")
            }
        }
        Value::String(text) => match string_format(text) {
            Some(format) => Schema::of_type("string").with_format(format),
            None => Schema::of_type("string"),
        },
        Value::Array(items) => {
            let item_schema = items
                .first()
                .map(infer_schema)
                .unwrap_or_else(|| Schema::of_type("string"));
            Schema {
                items: Some(Box::new(item_schema)),
                ..Schema::of_type("array")
            }
        }
        Value::Object(map) => {
            let mut schema = Schema::of_type("object");
            for (key, value) in map {
                schema.properties.insert(key.clone(), infer_schema(value));
                if !value.is_null() {
                    schema.required.push(key.clone());
                }
            }
            schema
        }
    }
}

/// Format hint for a string literal, if it matches a known pattern
pub fn string_format(text: &str) -> Option<&'static str> {
    if pattern::is_match(uuid_regex(), text) {
        Some("uuid")
    } else if pattern::is_match(email_regex(), text) {
        Some("email")
    } else if pattern::is_match(date_regex(), text) {
        Some("date")
    } else if pattern::is_match(date_time_regex(), text) {
        Some("date-time")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_schemas() {
        let null = infer_schema(&Value::Null);
        assert_eq!(null.schema_type.as_deref(), Some("string"));
        assert_eq!(null.nullable, Some(true));

        assert_eq!(infer_schema(&json!(true)).schema_type.as_deref(), Some("boolean"));
        assert_eq!(infer_schema(&json!(42)).schema_type.as_deref(), Some("integer"));
        assert_eq!(infer_schema(&json!(99.99)).schema_type.as_deref(), Some("number"));
        assert_eq!(infer_schema(&json!("hello")).format, None);
    }

    #[test]
    fn test_string_formats() {
        assert_eq!(string_format("user@example.com"), Some("email"));
        assert_eq!(string_format("2024-01-15"), Some("date"));
        assert_eq!(string_format("2024-01-15T10:30:00Z"), Some("date-time"));
        assert_eq!(string_format("550e8400-e29b-41d4-a716-446655440000"), Some("uuid"));
        assert_eq!(string_format("not-an-email@"), None);
        assert_eq!(string_format("2024-1-5"), None);
    }

    #[test]
    fn test_array_schemas() {
        let numbers = infer_schema(&json!([1, 2.5]));
        assert_eq!(numbers.schema_type.as_deref(), Some("array"));
        assert_eq!(numbers.items.unwrap().schema_type.as_deref(), Some("integer"));

        let empty = infer_schema(&json!([]));
        assert_eq!(empty.items.unwrap().schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_object_schema() {
        let schema = infer_schema(&json!({
            "id": 1,
            "email": "user@example.com",
            "deleted_at": null,
            "tags": ["a"],
            "profile": { "bio": "x" }
        }));

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        let keys: Vec<&String> = schema.properties.keys().collect();
        assert_eq!(keys, vec!["id", "email", "deleted_at", "tags", "profile"]);
        assert_eq!(schema.required, vec!["id", "email", "tags", "profile"]);
        assert_eq!(schema.properties["email"].format.as_deref(), Some("email"));
        assert_eq!(schema.properties["deleted_at"].nullable, Some(true));
        assert_eq!(schema.properties["profile"].required, vec!["bio"]);
    }
}
