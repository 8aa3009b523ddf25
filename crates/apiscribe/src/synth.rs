//! Deterministic example values for fields known only by name and constraints.
//!
//! Resolution order, first match wins:
//!
//! 1. the semantic name table, matched against the field name
//!    normalized to `snake_case`,
//! 2. the first declared enum option,
//! 3. the type hint,
//! 4. a context-dependent placeholder.
//!
//! Output is asserted byte-for-byte by callers, so the table order is part of
//! the contract.

use serde_json::{json, Map, Value};

pub const UUID_EXAMPLE: &str = "550e8400-e29b-41d4-a716-446655440000";
pub const EMAIL_EXAMPLE: &str = "user@example.com";
pub const PHONE_EXAMPLE: &str = "+1234567890";
pub const TOKEN_EXAMPLE: &str = "example_token_123456";
pub const PASSWORD_EXAMPLE: &str = "password123";
pub const NAME_EXAMPLE: &str = "John Doe";
pub const URL_EXAMPLE: &str = "https://example.com";
pub const IMAGE_EXAMPLE: &str = "https://example.com/images/sample.jpg";
pub const STATUS_EXAMPLE: &str = "active";
pub const TYPE_EXAMPLE: &str = "default";
pub const DATETIME_EXAMPLE: &str = "2024-01-15T10:30:00Z";
pub const FILE_PLACEHOLDER: &str = "(file)";
pub const BODY_PLACEHOLDER: &str = "example_value";
pub const QUERY_PLACEHOLDER: &str = "value";
pub const LATITUDE_EXAMPLE: f64 = 40.7128;
pub const LONGITUDE_EXAMPLE: f64 = -74.006;
pub const PRICE_EXAMPLE: f64 = 99.99;
pub const COUNT_EXAMPLE: i64 = 10;

const BOOLEAN_PREFIXES: &[&str] = &["is_", "has_", "can_", "should_", "needs_", "allow_"];

/// Declared type of a field, as far as a collector knows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Boolean,
    Integer,
    Numeric,
    Array,
    File,
    String,
}

/// Where the synthesized value will be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldContext {
    #[default]
    Body,
    Query,
}

/// Validation-like constraints attached to a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldConstraints {
    pub required: bool,
    pub nullable: bool,
    pub type_hint: Option<TypeHint>,
    pub enum_options: Vec<String>,
    pub context: FieldContext,
}

/// One row of the semantic name table
struct NameRule {
    matches: fn(&str) -> bool,
    value: fn() -> Value,
}

/// Semantic name table. Order is significant.
const NAME_RULES: &[NameRule] = &[
    NameRule { matches: |n| n == "id" || n.ends_with("_id"), value: || json!(1) },
    NameRule { matches: |n| n.contains("uuid"), value: || json!(UUID_EXAMPLE) },
    NameRule { matches: |n| n.contains("email"), value: || json!(EMAIL_EXAMPLE) },
    NameRule { matches: |n| n.contains("phone"), value: || json!(PHONE_EXAMPLE) },
    NameRule { matches: |n| n.contains("token"), value: || json!(TOKEN_EXAMPLE) },
    NameRule { matches: |n| n.contains("password"), value: || json!(PASSWORD_EXAMPLE) },
    NameRule { matches: |n| n.contains("name"), value: || json!(NAME_EXAMPLE) },
    NameRule { matches: |n| n.contains("url") || n.contains("link"), value: || json!(URL_EXAMPLE) },
    NameRule {
        matches: |n| n.contains("image") || n.contains("avatar") || n.contains("photo"),
        value: || json!(IMAGE_EXAMPLE),
    },
    NameRule {
        matches: |n| BOOLEAN_PREFIXES.iter().any(|prefix| n.starts_with(prefix)),
        value: || json!(true),
    },
    NameRule { matches: |n| n.contains("status"), value: || json!(STATUS_EXAMPLE) },
    NameRule { matches: |n| n.contains("type"), value: || json!(TYPE_EXAMPLE) },
    NameRule {
        matches: |n| n.ends_with("_at") || n.contains("date") || n.contains("time"),
        value: || json!(DATETIME_EXAMPLE),
    },
    NameRule {
        matches: |n| {
            n.contains("count") || n.contains("total") || n.contains("amount") || n.contains("quantity")
        },
        value: || json!(COUNT_EXAMPLE),
    },
    NameRule {
        matches: |n| n.contains("price") || n.contains("cost") || n.contains("fee"),
        value: || json!(PRICE_EXAMPLE),
    },
    NameRule { matches: |n| n.contains("lat"), value: || json!(LATITUDE_EXAMPLE) },
    NameRule {
        matches: |n| n.contains("lng") || n.contains("lon"),
        value: || json!(LONGITUDE_EXAMPLE),
    },
];

/// Produce an example value for `field_name`. Pure and total.
pub fn synthesize(field_name: &str, constraints: &FieldConstraints) -> Value {
    let normalized = normalize_name(field_name);

    if let Some(rule) = NAME_RULES.iter().find(|rule| (rule.matches)(&normalized)) {
        return (rule.value)();
    }

    if let Some(first) = constraints.enum_options.first() {
        return Value::String(first.clone());
    }

    match constraints.type_hint {
        Some(TypeHint::Boolean) => return json!(true),
        Some(TypeHint::Integer) => {
            return match normalized.as_str() {
                "per_page" | "limit" => json!(COUNT_EXAMPLE),
                _ => json!(1),
            }
        }
        Some(TypeHint::Numeric) => return json!(0),
        Some(TypeHint::Array) => return json!([]),
        Some(TypeHint::File) => return json!(FILE_PLACEHOLDER),
        Some(TypeHint::String) | None => {}
    }

    match constraints.context {
        FieldContext::Body => json!(BODY_PLACEHOLDER),
        FieldContext::Query => json!(QUERY_PLACEHOLDER),
    }
}

/// Synthesize a whole body from `(field, constraints)` pairs, keeping field order
pub fn synthesize_fields<'a, I>(fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a str, &'a FieldConstraints)>,
{
    fields
        .into_iter()
        .map(|(name, constraints)| (name.to_string(), synthesize(name, constraints)))
        .collect()
}

/// `userId`, `User-Id` and `user id` all become `user_id`
pub fn normalize_name(field_name: &str) -> String {
    let mut normalized = String::with_capacity(field_name.len() + 4);
    let mut previous_lower = false;

    for ch in field_name.trim().chars() {
        if ch == '-' || ch == ' ' || ch == '.' || ch == '_' {
            if !normalized.ends_with('_') && !normalized.is_empty() {
                normalized.push('_');
            }
            previous_lower = false;
            continue;
        }
        if ch.is_uppercase() {
            if previous_lower && !normalized.ends_with('_') {
                normalized.push('_');
            }
            normalized.extend(ch.to_lowercase());
            previous_lower = false;
        } else {
            normalized.push(ch);
            previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }

    normalized.trim_end_matches('_').to_string()
}

impl FieldConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_type(mut self, hint: TypeHint) -> Self {
        self.type_hint = Some(hint);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_query(mut self) -> Self {
        self.context = FieldContext::Query;
        self
    }

    /// Build constraints from validation rules such as `required`,
    /// `nullable`, `integer`, `in:a,b` or `mimes:jpg,png`.
    ///
    /// Unknown rules are ignored; later type rules override earlier ones.
    pub fn from_rules<'a, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut constraints = Self::default();

        for rule in rules {
            let rule = rule.trim();
            let (head, args) = match rule.split_once(':') {
                Some((head, args)) => (head.trim(), Some(args)),
                None => (rule, None),
            };

            match head.to_lowercase().as_str() {
                "required" => constraints.required = true,
                "nullable" | "sometimes" => constraints.nullable = true,
                "boolean" | "bool" => constraints.type_hint = Some(TypeHint::Boolean),
                "integer" | "int" => constraints.type_hint = Some(TypeHint::Integer),
                "numeric" | "number" | "decimal" => constraints.type_hint = Some(TypeHint::Numeric),
                "array" | "list" => constraints.type_hint = Some(TypeHint::Array),
                "file" | "image" | "mimes" | "mimetypes" => constraints.type_hint = Some(TypeHint::File),
                "string" => constraints.type_hint = Some(TypeHint::String),
                "in" => {
                    if let Some(args) = args {
                        constraints.enum_options = args
                            .split(',')
                            .map(|option| option.trim().to_string())
                            .filter(|option| !option.is_empty())
                            .collect();
                    }
                }
                _ => {}
            }
        }

        constraints
    }
}
