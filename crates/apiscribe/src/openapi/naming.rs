//! Summaries and operation identifiers derived from endpoint names and paths.

use std::collections::BTreeMap;

/// Summary for an unnamed endpoint, e.g. `GET /users/{id}` → `Get user`
pub fn generate_operation_summary(method: &str, path: &str) -> String {
    let verb = method.to_lowercase();
    let resource = extract_resource_from_path(path);

    match verb.as_str() {
        "get" => {
            if ends_with_parameter(path) {
                format!("Get {}", resource)
            } else {
                format!("List {}", pluralize(&resource))
            }
        }
        "post" => format!("Create {}", resource),
        "put" => format!("Update {}", resource),
        "patch" => format!("Partially update {}", resource),
        "delete" => format!("Delete {}", resource),
        _ => format!("{} {}", capitalize(&verb), resource),
    }
}

/// camelCase identifier from free text; separators collapse
pub fn operation_id_from(text: &str) -> String {
    let mut id = String::new();
    for word in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        let word = word.to_lowercase();
        if id.is_empty() {
            id.push_str(&word);
        } else {
            id.push_str(&capitalize(&word));
        }
    }
    id
}

/// Hands out unique operation ids; repeats get `_2`, `_3`, ... in call order
#[derive(Debug, Default)]
pub struct OperationIds {
    issued: BTreeMap<String, usize>,
}

impl OperationIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, base: &str) -> String {
        let count = self.issued.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base.to_string()
        } else {
            format!("{}_{}", base, count)
        }
    }
}

fn ends_with_parameter(path: &str) -> bool {
    path.split('/')
        .filter(|part| !part.is_empty())
        .last()
        .map_or(false, |part| part.starts_with('{'))
}

fn extract_resource_from_path(path: &str) -> String {
    let parts: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty() && !part.starts_with('{'))
        .collect();

    match parts.last() {
        Some(last) => singularize(&last.replace(['-', '_'], " ")),
        None => "resource".to_string(),
    }
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{}y", stem)
    } else if word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        format!("{}ies", stem)
    } else if word.ends_with('s') || word.ends_with("sh") || word.ends_with("ch") {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_summary_generation() {
        assert_eq!(generate_operation_summary("GET", "/users"), "List users");
        assert_eq!(generate_operation_summary("GET", "/users/{id}"), "Get user");
        assert_eq!(generate_operation_summary("POST", "/users"), "Create user");
        assert_eq!(generate_operation_summary("PUT", "/users/{id}"), "Update user");
        assert_eq!(generate_operation_summary("PATCH", "/categories/{id}"), "Partially update category");
        assert_eq!(generate_operation_summary("DELETE", "/users/{id}"), "Delete user");
        assert_eq!(generate_operation_summary("GET", "/"), "List resources");
        assert_eq!(generate_operation_summary("OPTIONS", "/blog-posts"), "Options blog post");
    }

    #[test]
    fn test_operation_id_from_text() {
        assert_eq!(operation_id_from("Show user"), "showUser");
        assert_eq!(operation_id_from("api.users.index"), "apiUsersIndex");
        assert_eq!(operation_id_from("  Request OTP -- code "), "requestOtpCode");
        assert_eq!(operation_id_from("!!"), "");
    }

    #[test]
    fn test_operation_ids_are_unique() {
        let mut ids = OperationIds::new();
        assert_eq!(ids.issue("listUsers"), "listUsers");
        assert_eq!(ids.issue("listUsers"), "listUsers_2");
        assert_eq!(ids.issue("showUser"), "showUser");
        assert_eq!(ids.issue("listUsers"), "listUsers_3");
    }
}
