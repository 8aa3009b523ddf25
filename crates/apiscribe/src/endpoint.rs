/*!
Canonical endpoint model shared by the collectors, the merge engine and both
document generators.

Values are built once by a collector and never mutated afterwards; merging and
resource expansion always produce new `Endpoint`s.
*/

use crate::pattern;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Folder used when an endpoint does not declare one
pub const DEFAULT_FOLDER: &str = "General";

/// Body language used when an endpoint does not declare one
pub const DEFAULT_BODY_LANGUAGE: &str = "json";

/// Default status for response examples
pub const DEFAULT_STATUS: u16 = 200;

/// One documented request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    /// HTTP method, always upper-case
    pub method: String,
    /// URI template with `{name}` / `{name?}` placeholders
    pub uri: String,
    pub description: Option<String>,
    /// Folder path, segments joined by the configured separator
    pub folder: String,
    pub order: i64,
    pub body: Option<Map<String, Value>>,
    pub body_mode: BodyMode,
    pub body_language: String,
    /// Overlay `body` on the other source's body instead of replacing it
    pub body_merge: bool,
    /// Keys removed from the other source's body before a body merge
    pub body_except: BTreeSet<String>,
    pub headers: Vec<Header>,
    pub query_params: Vec<QueryParam>,
    pub responses: Vec<ResponseExample>,
    pub variables: Vec<Variable>,
    pub tests: Vec<Test>,
    pub pre_request_scripts: Vec<String>,
    pub auth: Option<Auth>,
    pub middleware_tags: BTreeSet<String>,
    pub resource_ref: Option<ResourceRef>,
}

/// Encoding of a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    #[default]
    Raw,
    Formdata,
    Urlencoded,
}

/// Key/value pair used for headers and query parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

pub type Header = KeyValue;
pub type QueryParam = KeyValue;

/// Example response attached to an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseExample {
    pub name: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default = "empty_object")]
    pub body: Value,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

/// Authentication declared for an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Auth {
    Bearer {
        #[serde(default)]
        token: String,
    },
    Basic {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    ApiKey {
        #[serde(default)]
        value: String,
        #[serde(default = "default_api_key_header")]
        header: String,
    },
    NoAuth,
}

/// Value extracted from a response body into a collection/environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Dot-delimited pointer into the response body, e.g. `data.token`
    pub path: String,
    #[serde(default)]
    pub scope: VariableScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    #[default]
    Collection,
    Environment,
    Global,
}

/// Test script run after the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub script: String,
    /// Wraps the script in a named assertion block when present
    #[serde(default)]
    pub name: Option<String>,
}

/// Pointer from an endpoint to the transformer that shapes its response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub identifier: String,
    #[serde(default = "default_status")]
    pub status: u16,
    /// `None` defers to the configured envelope default
    #[serde(default)]
    pub wrapped: Option<bool>,
    #[serde(default)]
    pub is_collection: bool,
}

fn default_status() -> u16 {
    DEFAULT_STATUS
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

fn path_variable_regex() -> Option<&'static Regex> {
    static PATH_VARIABLE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(&PATH_VARIABLE, r"\{\s*([A-Za-z_][A-Za-z0-9_\-]*)\s*\??\s*\}")
}

/// Identity key: upper-cased method, ":" and the URI without surrounding slashes
pub fn identity_key(method: &str, uri: &str) -> String {
    format!(
        "{}:{}",
        method.trim().to_uppercase(),
        uri.trim().trim_matches('/')
    )
}

/// Names of the path variables in a URI template, in order of appearance
pub fn path_variables(uri: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let Some(regex) = path_variable_regex() else {
        return names;
    };
    for caps in regex.captures_iter(uri) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Rewrite every `{name}` / `{name?}` placeholder through `render`
pub fn rewrite_path_variables<F>(uri: &str, render: F) -> String
where
    F: Fn(&str) -> String,
{
    match path_variable_regex() {
        Some(regex) => regex
            .replace_all(uri, |caps: &regex::Captures| render(&caps[1]))
            .into_owned(),
        None => uri.to_string(),
    }
}

impl Endpoint {
    /// Create an endpoint with every optional field at its default
    pub fn new(name: &str, method: &str, uri: &str) -> Self {
        Self {
            name: name.to_string(),
            method: method.trim().to_uppercase(),
            uri: uri.to_string(),
            description: None,
            folder: DEFAULT_FOLDER.to_string(),
            order: 0,
            body: None,
            body_mode: BodyMode::default(),
            body_language: DEFAULT_BODY_LANGUAGE.to_string(),
            body_merge: false,
            body_except: BTreeSet::new(),
            headers: Vec::new(),
            query_params: Vec::new(),
            responses: Vec::new(),
            variables: Vec::new(),
            tests: Vec::new(),
            pre_request_scripts: Vec::new(),
            auth: None,
            middleware_tags: BTreeSet::new(),
            resource_ref: None,
        }
    }

    pub fn identity_key(&self) -> String {
        identity_key(&self.method, &self.uri)
    }

    pub fn path_variables(&self) -> Vec<String> {
        path_variables(&self.uri)
    }

    /// Whether a request needs credentials.
    ///
    /// Explicit auth decides first (`noauth` means no); otherwise any
    /// middleware tag in `protected_tags` implies bearer auth.
    pub fn requires_auth(&self, protected_tags: &[String]) -> bool {
        match &self.auth {
            Some(Auth::NoAuth) => false,
            Some(_) => true,
            None => self.has_protected_tag(protected_tags),
        }
    }

    pub fn has_protected_tag(&self, protected_tags: &[String]) -> bool {
        protected_tags
            .iter()
            .any(|tag| self.middleware_tags.contains(tag))
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_folder(mut self, folder: &str) -> Self {
        self.folder = folder.to_string();
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_body_mode(mut self, mode: BodyMode) -> Self {
        self.body_mode = mode;
        self
    }

    pub fn with_body_language(mut self, language: &str) -> Self {
        self.body_language = language.to_string();
        self
    }

    /// Enable body merging, dropping `except` keys from the other source first
    pub fn with_body_merge<I, S>(mut self, except: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body_merge = true;
        self.body_except = except.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push(KeyValue::new(key, value));
        self
    }

    pub fn with_query_param(mut self, param: QueryParam) -> Self {
        self.query_params.push(param);
        self
    }

    pub fn with_response(mut self, response: ResponseExample) -> Self {
        self.responses.push(response);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_test(mut self, test: Test) -> Self {
        self.tests.push(test);
        self
    }

    pub fn with_pre_request_script(mut self, script: &str) -> Self {
        self.pre_request_scripts.push(script.to_string());
        self
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_middleware<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_resource(mut self, resource: ResourceRef) -> Self {
        self.resource_ref = Some(resource);
        self
    }
}

impl KeyValue {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            description: None,
            disabled: false,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

impl ResponseExample {
    pub fn new(name: &str, status: u16, body: Value) -> Self {
        Self {
            name: name.to_string(),
            status,
            body,
            headers: IndexMap::new(),
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }
}

impl Auth {
    /// Lower-case family name (`bearer`, `basic`, `apikey`, `noauth`)
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer { .. } => "bearer",
            Auth::Basic { .. } => "basic",
            Auth::ApiKey { .. } => "apikey",
            Auth::NoAuth => "noauth",
        }
    }
}

impl Variable {
    pub fn new(name: &str, path: &str, scope: VariableScope) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            scope,
        }
    }
}

impl Test {
    pub fn new(script: &str) -> Self {
        Self {
            script: script.to_string(),
            name: None,
        }
    }

    pub fn named(name: &str, script: &str) -> Self {
        Self {
            script: script.to_string(),
            name: Some(name.to_string()),
        }
    }
}

impl ResourceRef {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            status: DEFAULT_STATUS,
            wrapped: None,
            is_collection: false,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn wrapped(mut self, wrapped: bool) -> Self {
        self.wrapped = Some(wrapped);
        self
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_key_normalization() {
        assert_eq!(identity_key("get", "/api/users/"), identity_key("GET", "api/users"));
        assert_eq!(identity_key("get", "/api/users/"), "GET:api/users");
        assert_ne!(identity_key("POST", "api/users"), identity_key("GET", "api/users"));
    }

    #[test]
    fn test_method_is_upper_cased() {
        let endpoint = Endpoint::new("List users", "get", "/users");
        assert_eq!(endpoint.method, "GET");
        assert_eq!(endpoint.folder, DEFAULT_FOLDER);
        assert_eq!(endpoint.body_language, DEFAULT_BODY_LANGUAGE);
    }

    #[test]
    fn test_path_variable_extraction() {
        assert_eq!(
            path_variables("/users/{id}/posts/{post_id?}"),
            vec!["id".to_string(), "post_id".to_string()]
        );
        assert!(path_variables("/users").is_empty());
        assert_eq!(path_variables("/a/{id}/b/{id}"), vec!["id".to_string()]);
    }

    #[test]
    fn test_rewrite_path_variables() {
        let rendered = rewrite_path_variables("/users/{id}/posts/{post?}", |name| format!(":{}", name));
        assert_eq!(rendered, "/users/:id/posts/:post");
    }

    #[test]
    fn test_requires_auth() {
        let protected = vec!["auth".to_string()];

        let public = Endpoint::new("Ping", "GET", "/ping");
        assert!(!public.requires_auth(&protected));

        let tagged = Endpoint::new("Me", "GET", "/me").with_middleware(["auth"]);
        assert!(tagged.requires_auth(&protected));

        let opted_out = Endpoint::new("Me", "GET", "/me")
            .with_middleware(["auth"])
            .with_auth(Auth::NoAuth);
        assert!(!opted_out.requires_auth(&protected));

        let explicit = Endpoint::new("Key", "GET", "/key").with_auth(Auth::ApiKey {
            value: "secret".to_string(),
            header: "X-Key".to_string(),
        });
        assert!(explicit.requires_auth(&protected));
    }

    #[test]
    fn test_auth_serde_tags() {
        let auth: Auth = serde_json::from_value(json!({"type": "apikey", "value": "k"})).unwrap();
        assert_eq!(
            auth,
            Auth::ApiKey {
                value: "k".to_string(),
                header: "X-API-Key".to_string()
            }
        );
        let noauth: Auth = serde_json::from_value(json!({"type": "noauth"})).unwrap();
        assert_eq!(noauth.kind(), "noauth");
    }

    #[test]
    fn test_response_defaults() {
        let response: ResponseExample = serde_json::from_value(json!({"name": "Ok"})).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({}));
        assert!(response.headers.is_empty());
    }
}
