/*!
Declarative endpoint definitions.

Reading definition files is left to the caller; this module turns
already-decoded records into [`Endpoint`]s. A record is either a single
endpoint or a group:

```json
{ "folder": "Auth / OTP", "endpoints": [ { "name": "Request OTP", "method": "POST", "uri": "/otp" } ] }
```

Invalid records are skipped individually and the rest of the batch is kept.
*/

use crate::{
    config::DocsConfig,
    endpoint::{Auth, BodyMode, Endpoint, KeyValue, ResourceRef, ResponseExample, Test, Variable, VariableScope},
    error::{ApiDocError, ApiDocResult},
    synth::{synthesize, FieldConstraints},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One declaratively described endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointDefinition {
    pub name: Option<String>,
    pub method: Option<String>,
    pub uri: Option<String>,
    pub description: Option<String>,
    pub folder: Option<String>,
    pub order: Option<i64>,
    pub body: Option<Map<String, Value>>,
    /// Field → validation rules (`"required|email"` or a list); synthesized
    /// into body entries that `body` does not already provide
    pub body_rules: IndexMap<String, RuleList>,
    pub body_mode: Option<BodyMode>,
    pub body_language: Option<String>,
    #[serde(alias = "merge_body")]
    pub body_merge: bool,
    pub body_except: Vec<String>,
    pub headers: Pairs,
    pub query: Pairs,
    /// Query field → validation rules, synthesized in query context
    pub query_rules: IndexMap<String, RuleList>,
    pub responses: Vec<ResponseExample>,
    pub variables: Vec<VariableDefinition>,
    pub tests: Vec<TestDefinition>,
    #[serde(alias = "pre_request")]
    pub pre_request_scripts: Vec<String>,
    pub auth: Option<Auth>,
    pub middleware: Vec<String>,
    pub resource: Option<ResourceRef>,
}

/// Key/value pairs given either as a list of entries or as a plain map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pairs {
    List(Vec<KeyValue>),
    Map(IndexMap<String, String>),
}

/// Validation rules as a `|`-separated string or a list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleList {
    Text(String),
    List(Vec<String>),
}

/// Variable extraction; a missing scope uses the configured default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub scope: Option<VariableScope>,
}

/// Test given as bare script text or as `{script, name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestDefinition {
    Script(String),
    Full(Test),
}

/// A folder applied to several definitions
#[derive(Debug, Clone, Deserialize)]
struct DefinitionGroup {
    #[serde(default)]
    folder: Option<String>,
    endpoints: Vec<Value>,
}

impl Default for Pairs {
    fn default() -> Self {
        Pairs::List(Vec::new())
    }
}

impl Pairs {
    pub fn into_key_values(self) -> Vec<KeyValue> {
        match self {
            Pairs::List(list) => list,
            Pairs::Map(map) => map
                .into_iter()
                .map(|(key, value)| KeyValue::new(&key, &value))
                .collect(),
        }
    }
}

impl RuleList {
    pub fn constraints(&self) -> FieldConstraints {
        match self {
            RuleList::Text(text) => FieldConstraints::from_rules(text.split('|')),
            RuleList::List(rules) => FieldConstraints::from_rules(rules.iter().map(String::as_str)),
        }
    }
}

impl EndpointDefinition {
    /// Convert into an endpoint; fails when name, method or uri is missing
    pub fn into_endpoint(self, config: &DocsConfig) -> ApiDocResult<Endpoint> {
        let name = required_field(self.name, "name")?;
        let method = required_field(self.method, "method")?;
        let uri = required_field(self.uri, "uri")?;

        let mut endpoint = Endpoint::new(&name, &method, &uri);
        endpoint.description = self.description.filter(|d| !d.trim().is_empty());
        endpoint.folder = self
            .folder
            .filter(|folder| !folder.trim().is_empty())
            .unwrap_or_else(|| config.default_folder.clone());
        endpoint.order = self.order.unwrap_or(0);
        endpoint.body = body_with_rules(self.body, &self.body_rules);
        if let Some(mode) = self.body_mode {
            endpoint.body_mode = mode;
        }
        if let Some(language) = self.body_language.filter(|l| !l.trim().is_empty()) {
            endpoint.body_language = language;
        }
        endpoint.body_merge = self.body_merge;
        endpoint.body_except = self.body_except.into_iter().collect();
        endpoint.headers = self.headers.into_key_values();
        endpoint.query_params = query_with_rules(self.query.into_key_values(), &self.query_rules);
        endpoint.responses = self.responses;
        endpoint.variables = self
            .variables
            .into_iter()
            .map(|variable| Variable {
                name: variable.name,
                path: variable.path,
                scope: variable.scope.unwrap_or(config.variable_scope),
            })
            .collect();
        endpoint.tests = self
            .tests
            .into_iter()
            .map(|test| match test {
                TestDefinition::Script(script) => Test::new(&script),
                TestDefinition::Full(test) => test,
            })
            .collect();
        endpoint.pre_request_scripts = self.pre_request_scripts;
        endpoint.auth = self.auth;
        endpoint.middleware_tags = self.middleware.into_iter().collect();
        endpoint.resource_ref = self.resource;

        Ok(endpoint)
    }
}

/// Decode a batch of records, skipping the ones that are not valid endpoints
pub fn endpoints_from_definitions(records: &[Value], config: &DocsConfig) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    for (index, record) in records.iter().enumerate() {
        collect_record(record, None, config, &mut endpoints, &index.to_string());
    }
    debug!(
        "Decoded {} endpoints from {} definition records",
        endpoints.len(),
        records.len()
    );
    endpoints
}

/// Decode one record that must be a single endpoint
pub fn endpoint_from_definition(record: &Value, config: &DocsConfig) -> ApiDocResult<Endpoint> {
    let definition: EndpointDefinition = serde_json::from_value(record.clone())
        .map_err(|e| ApiDocError::definition_error(format!("Invalid endpoint definition: {}", e)))?;
    definition.into_endpoint(config)
}

/// Parse a JSON document holding a record, a list of records or
/// `{"endpoints": [...]}`
pub fn records_from_json_str(content: &str) -> ApiDocResult<Vec<Value>> {
    let document: Value = serde_json::from_str(content)?;
    Ok(into_records(document))
}

/// YAML counterpart of [`records_from_json_str`]
pub fn records_from_yaml_str(content: &str) -> ApiDocResult<Vec<Value>> {
    let document: Value = serde_yaml::from_str(content)?;
    Ok(into_records(document))
}

fn into_records(document: Value) -> Vec<Value> {
    match document {
        Value::Array(records) => records,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn collect_record(
    record: &Value,
    group_folder: Option<&str>,
    config: &DocsConfig,
    endpoints: &mut Vec<Endpoint>,
    location: &str,
) {
    if record.get("endpoints").map_or(false, Value::is_array) {
        match serde_json::from_value::<DefinitionGroup>(record.clone()) {
            Ok(group) => {
                let folder = group.folder.as_deref().or(group_folder);
                for (index, member) in group.endpoints.iter().enumerate() {
                    let location = format!("{}.{}", location, index);
                    collect_record(member, folder, config, endpoints, &location);
                }
            }
            Err(e) => warn!("Skipping definition group {}: {}", location, e),
        }
        return;
    }

    let definition = match serde_json::from_value::<EndpointDefinition>(record.clone()) {
        Ok(mut definition) => {
            if definition.folder.as_deref().map_or(true, |f| f.trim().is_empty()) {
                definition.folder = group_folder.map(str::to_string);
            }
            definition
        }
        Err(e) => {
            warn!("Skipping definition {}: {}", location, e);
            return;
        }
    };

    match definition.into_endpoint(config) {
        Ok(endpoint) => endpoints.push(endpoint),
        Err(e) => warn!("Skipping definition {}: {}", location, e),
    }
}

fn required_field(value: Option<String>, field: &str) -> ApiDocResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ApiDocError::definition_error(format!(
            "Missing required field '{}'",
            field
        ))),
    }
}

fn body_with_rules(
    body: Option<Map<String, Value>>,
    rules: &IndexMap<String, RuleList>,
) -> Option<Map<String, Value>> {
    if rules.is_empty() {
        return body;
    }

    let mut body = body.unwrap_or_default();
    for (field, rule_list) in rules {
        if !body.contains_key(field) {
            body.insert(field.clone(), synthesize(field, &rule_list.constraints()));
        }
    }
    Some(body)
}

fn query_with_rules(mut params: Vec<KeyValue>, rules: &IndexMap<String, RuleList>) -> Vec<KeyValue> {
    for (field, rule_list) in rules {
        if params.iter().any(|param| &param.key == field) {
            continue;
        }
        let constraints = rule_list.constraints().in_query();
        let value = match synthesize(field, &constraints) {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let mut param = KeyValue::new(field, &value);
        if !constraints.required {
            param = param.disabled();
        }
        params.push(param);
    }
    params
}
