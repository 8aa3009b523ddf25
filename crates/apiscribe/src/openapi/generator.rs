/*!
OpenAPI document generation from canonical endpoints.
*/

use super::{
    naming::{generate_operation_summary, operation_id_from, OperationIds},
    schema::infer_schema,
    specification::*,
};
use crate::{
    collection::{folder_path, status_text},
    config::DocsConfig,
    endpoint::{path_variables, rewrite_path_variables, Auth, BodyMode, Endpoint, KeyValue, ResponseExample},
    synth::{synthesize, FieldConstraints, FILE_PLACEHOLDER},
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Header names never documented as parameters
pub const RESERVED_HEADERS: &[&str] = &["accept", "content-type", "authorization"];

/// Methods that may carry a request body
const BODY_METHODS: &[&str] = &["POST", "PUT", "PATCH"];

pub const BEARER_SCHEME: &str = "bearerAuth";
pub const BASIC_SCHEME: &str = "basicAuth";
pub const API_KEY_SCHEME: &str = "apiKeyAuth";

const DEFAULT_RESPONSE_DESCRIPTION: &str = "Successful operation";

/// Build an OpenAPI document for `endpoints`
pub fn build_spec(endpoints: &[Endpoint], config: &DocsConfig) -> OpenApiDocument {
    OpenApiGenerator::new(config).generate(endpoints)
}

/// Path key for a URI template: leading slash, `{name?}` becomes `{name}`
pub fn normalize_path(uri: &str) -> String {
    let trimmed = uri.trim().trim_matches('/');
    let path = rewrite_path_variables(trimmed, |name| format!("{{{}}}", name));
    format!("/{}", path)
}

/// OpenAPI document generator
pub struct OpenApiGenerator<'a> {
    config: &'a DocsConfig,
}

impl<'a> OpenApiGenerator<'a> {
    pub fn new(config: &'a DocsConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, endpoints: &[Endpoint]) -> OpenApiDocument {
        let mut document = OpenApiDocument::new(&self.config.info.title, &self.config.info.version);
        document.info.description = self.config.info.description.clone();
        document.servers = self.servers();

        let mut operation_ids = OperationIds::new();
        let mut tags = BTreeSet::new();
        let mut schemes = BTreeMap::new();

        for endpoint in endpoints {
            let path = normalize_path(&endpoint.uri);
            let item = document.paths.entry(path.clone()).or_default();

            let Some(slot) = item.slot_mut(&endpoint.method) else {
                debug!("Skipping {} {}: unsupported method", endpoint.method, path);
                continue;
            };
            if slot.is_some() {
                debug!("Skipping {} {}: operation already documented", endpoint.method, path);
                continue;
            }

            let mut operation = self.build_operation(endpoint, &path, &mut operation_ids);
            if endpoint.requires_auth(&self.config.protected_tags) {
                let scheme = register_scheme(&mut schemes, endpoint.auth.as_ref());
                let mut requirement = SecurityRequirement::new();
                requirement.insert(scheme, Vec::new());
                operation.security.push(requirement);
            }
            tags.extend(operation.tags.iter().cloned());

            *slot = Some(operation);
        }

        // paths that only held unsupported methods
        document.paths.retain(|_, item| !item.operations().is_empty());

        document.tags = tags
            .into_iter()
            .map(|name| Tag {
                name,
                description: None,
            })
            .collect();

        if !schemes.is_empty() {
            document.components = Some(Components {
                security_schemes: schemes,
            });
        }

        debug!(
            "Built OpenAPI document with {} paths and {} tags",
            document.paths.len(),
            document.tags.len()
        );

        document
    }

    fn servers(&self) -> Vec<Server> {
        if self.config.servers.is_empty() {
            return vec![Server {
                url: "/".to_string(),
                description: None,
            }];
        }

        self.config
            .servers
            .iter()
            .map(|server| Server {
                url: server.url.clone(),
                description: server.description.clone(),
            })
            .collect()
    }

    fn build_operation(&self, endpoint: &Endpoint, path: &str, ids: &mut OperationIds) -> Operation {
        let summary = if endpoint.name.trim().is_empty() {
            generate_operation_summary(&endpoint.method, path)
        } else {
            endpoint.name.clone()
        };

        let mut base_id = operation_id_from(&summary);
        if base_id.is_empty() {
            base_id = operation_id_from(&format!("{} {}", endpoint.method, path));
        }

        let tag = folder_path(&endpoint.folder, self.config)
            .pop()
            .unwrap_or_else(|| self.config.default_folder.clone());

        Operation {
            tags: vec![tag],
            summary: Some(summary),
            description: endpoint.description.clone(),
            operation_id: Some(ids.issue(&base_id)),
            parameters: self.parameters(endpoint),
            request_body: request_body(endpoint),
            responses: responses(&endpoint.responses),
            security: Vec::new(),
        }
    }

    fn parameters(&self, endpoint: &Endpoint) -> Vec<Parameter> {
        let mut parameters: Vec<Parameter> = path_variables(&endpoint.uri)
            .into_iter()
            .map(|name| {
                let example = synthesize(&name, &FieldConstraints::default());
                Parameter {
                    schema: Some(infer_schema(&example)),
                    example: Some(example),
                    required: Some(true),
                    ..parameter(&name, "path")
                }
            })
            .collect();

        parameters.extend(endpoint.query_params.iter().map(|param| key_value_parameter(param, "query")));
        parameters.extend(
            endpoint
                .headers
                .iter()
                .filter(|header| !RESERVED_HEADERS.contains(&header.key.to_lowercase().as_str()))
                .map(|header| key_value_parameter(header, "header")),
        );

        parameters
    }
}

fn parameter(name: &str, location: &str) -> Parameter {
    Parameter {
        name: name.to_string(),
        location: location.to_string(),
        description: None,
        required: None,
        schema: None,
        example: None,
    }
}

fn key_value_parameter(pair: &KeyValue, location: &str) -> Parameter {
    let example = typed_value(&pair.value);
    Parameter {
        description: pair.description.clone(),
        schema: Some(
            example
                .as_ref()
                .map(infer_schema)
                .unwrap_or_else(|| Schema::of_type("string")),
        ),
        example,
        ..parameter(&pair.key, location)
    }
}

/// Typed example for a textual parameter value
fn typed_value(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() || text.starts_with("{{") {
        return None;
    }
    if let Ok(integer) = text.parse::<i64>() {
        return Some(Value::from(integer));
    }
    if let Ok(float) = text.parse::<f64>() {
        if float.is_finite() {
            return Some(Value::from(float));
        }
    }
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => Some(Value::String(text.to_string())),
    }
}

fn request_body(endpoint: &Endpoint) -> Option<RequestBody> {
    if !BODY_METHODS.contains(&endpoint.method.as_str()) {
        return None;
    }
    let body = endpoint.body.as_ref()?;

    let content_type = content_type(endpoint);
    let example = Value::Object(body.clone());
    let mut schema = infer_schema(&example);
    if endpoint.body_mode == BodyMode::Formdata {
        mark_binary_fields(&mut schema, body);
    }

    let mut content = BTreeMap::new();
    content.insert(
        content_type.to_string(),
        MediaType {
            schema: Some(schema),
            example: Some(example),
        },
    );

    Some(RequestBody {
        description: None,
        content,
        required: Some(true),
    })
}

/// Media type for a request body, from its mode and language
pub fn content_type(endpoint: &Endpoint) -> &'static str {
    match endpoint.body_mode {
        BodyMode::Formdata => "multipart/form-data",
        BodyMode::Urlencoded => "application/x-www-form-urlencoded",
        BodyMode::Raw => match endpoint.body_language.to_lowercase().as_str() {
            "xml" => "application/xml",
            "text" => "text/plain",
            "html" => "text/html",
            "javascript" => "application/javascript",
            _ => "application/json",
        },
    }
}

fn mark_binary_fields(schema: &mut Schema, body: &Map<String, Value>) {
    for (key, value) in body {
        if value.as_str() == Some(FILE_PLACEHOLDER) {
            if let Some(property) = schema.properties.get_mut(key) {
                *property = Schema::of_type("string").with_format("binary");
            }
        }
    }
}

fn responses(examples: &[ResponseExample]) -> BTreeMap<String, Response> {
    let mut responses = BTreeMap::new();

    for example in examples {
        let status = example.status.to_string();
        if responses.contains_key(&status) {
            continue;
        }

        let description = if example.name.trim().is_empty() {
            status_text(example.status).to_string()
        } else {
            example.name.clone()
        };

        let mut content = BTreeMap::new();
        if let Some((media_type, body)) = response_content(&example.body) {
            content.insert(
                media_type.to_string(),
                MediaType {
                    schema: Some(infer_schema(body)),
                    example: Some(body.clone()),
                },
            );
        }

        let headers = example
            .headers
            .keys()
            .filter(|key| !key.eq_ignore_ascii_case("content-type"))
            .map(|key| {
                (
                    key.clone(),
                    Header {
                        description: None,
                        schema: Some(Schema::of_type("string")),
                    },
                )
            })
            .collect();

        responses.insert(
            status,
            Response {
                description,
                headers,
                content,
            },
        );
    }

    if responses.is_empty() {
        responses.insert(
            "200".to_string(),
            Response {
                description: DEFAULT_RESPONSE_DESCRIPTION.to_string(),
                headers: BTreeMap::new(),
                content: BTreeMap::new(),
            },
        );
    }

    responses
}

fn response_content(body: &Value) -> Option<(&'static str, &Value)> {
    match body {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        Value::String(_) => Some(("text/plain", body)),
        _ => Some(("application/json", body)),
    }
}

/// Record the scheme an endpoint uses and return its name. One scheme per
/// family; for API keys the first header seen names the scheme.
fn register_scheme(schemes: &mut BTreeMap<String, SecurityScheme>, auth: Option<&Auth>) -> String {
    let (name, scheme) = match auth {
        Some(Auth::Basic { .. }) => (
            BASIC_SCHEME,
            SecurityScheme::Http {
                scheme: "basic".to_string(),
                bearer_format: None,
            },
        ),
        Some(Auth::ApiKey { header, .. }) => (
            API_KEY_SCHEME,
            SecurityScheme::ApiKey {
                name: header.clone(),
                location: "header".to_string(),
            },
        ),
        _ => (
            BEARER_SCHEME,
            SecurityScheme::Http {
                scheme: "bearer".to_string(),
                bearer_format: None,
            },
        ),
    };

    if let Some(existing) = schemes.get(name) {
        if existing != &scheme {
            warn!(
                "Security scheme '{}' already registered with different settings, ignoring {:?}",
                name, scheme
            );
        }
    } else {
        schemes.insert(name.to_string(), scheme);
    }

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{body, create_test_config, create_user_show};
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn test_path_normalization() {
        assert_eq!(normalize_path("/v1/users/{id}"), "/v1/users/{id}");
        assert_eq!(normalize_path("/v1/users/{id?}"), "/v1/users/{id}");
        assert_eq!(normalize_path("v1/users/{ id }/"), "/v1/users/{id}");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_user_show_scenario() {
        let config = create_test_config();
        let document = build_spec(&[create_user_show()], &config);

        let operation = document.operation("GET", "/v1/users/{id}").unwrap();
        assert_eq!(operation.parameters.len(), 1);
        assert_eq!(operation.parameters[0].name, "id");
        assert_eq!(operation.parameters[0].location, "path");
        assert_eq!(operation.parameters[0].required, Some(true));
        assert!(operation.security.is_empty());
        assert_eq!(operation.responses["200"].description, "Success");
        assert_eq!(operation.summary.as_deref(), Some("Show user"));
        assert_eq!(operation.operation_id.as_deref(), Some("showUser"));
        assert_eq!(operation.tags, vec!["Users".to_string()]);
        assert!(document.components.is_none());

        let serialized = serde_json::to_value(operation).unwrap();
        assert!(serialized.get("security").is_none());
    }

    #[test]
    fn test_optional_and_required_variants_share_a_path() {
        let config = create_test_config();
        let document = build_spec(
            &[
                Endpoint::new("Show", "GET", "/v1/users/{id}"),
                Endpoint::new("Show again", "GET", "/v1/users/{id?}"),
                Endpoint::new("Update", "PUT", "/v1/users/{id?}"),
            ],
            &config,
        );

        assert_eq!(document.paths.len(), 1);
        let item = &document.paths["/v1/users/{id}"];
        assert_eq!(item.get.as_ref().and_then(|op| op.summary.as_deref()), Some("Show"));
        assert!(item.put.is_some());
    }

    #[test]
    fn test_parameters() {
        let config = create_test_config();
        let endpoint = Endpoint::new("Search", "GET", "/posts")
            .with_query_param(KeyValue::new("page", "2"))
            .with_query_param(KeyValue::new("q", ""))
            .with_header("Accept", "application/json")
            .with_header("Authorization", "Bearer x")
            .with_header("X-Tenant", "acme");

        let document = build_spec(&[endpoint], &config);
        let parameters = &document.operation("GET", "/posts").unwrap().parameters;

        let names: Vec<(&str, &str)> = parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location.as_str()))
            .collect();
        assert_eq!(names, vec![("page", "query"), ("q", "query"), ("X-Tenant", "header")]);
        assert_eq!(parameters[0].schema.as_ref().unwrap().schema_type.as_deref(), Some("integer"));
        assert_eq!(parameters[0].example, Some(json!(2)));
        assert_eq!(parameters[1].example, None);
    }

    #[test]
    fn test_request_bodies() {
        let config = create_test_config();
        let endpoints = vec![
            Endpoint::new("Create", "POST", "/posts").with_body(body(json!({ "title": "x" }))),
            Endpoint::new("Search", "GET", "/posts").with_body(body(json!({ "q": "x" }))),
            Endpoint::new("Upload", "PUT", "/files")
                .with_body(body(json!({ "file": "(file)", "name": "a" })))
                .with_body_mode(BodyMode::Formdata),
            Endpoint::new("Feed", "PATCH", "/feed")
                .with_body(body(json!({ "a": 1 })))
                .with_body_language("xml"),
            Endpoint::new("Touch", "PATCH", "/touch"),
        ];

        let document = build_spec(&endpoints, &config);

        let create = document.operation("POST", "/posts").unwrap();
        let media = &create.request_body.as_ref().unwrap().content["application/json"];
        assert_eq!(media.schema.as_ref().unwrap().required, vec!["title"]);

        assert!(document.operation("GET", "/posts").unwrap().request_body.is_none());

        let upload = document.operation("PUT", "/files").unwrap();
        let schema = upload.request_body.as_ref().unwrap().content["multipart/form-data"]
            .schema
            .clone()
            .unwrap();
        assert_eq!(schema.properties["file"].format.as_deref(), Some("binary"));

        let feed = document.operation("PATCH", "/feed").unwrap();
        assert!(feed.request_body.as_ref().unwrap().content.contains_key("application/xml"));

        assert!(document.operation("PATCH", "/touch").unwrap().request_body.is_none());
    }

    #[test]
    fn test_default_response() {
        let config = create_test_config();
        let document = build_spec(&[Endpoint::new("Ping", "GET", "/ping")], &config);
        let responses = &document.operation("GET", "/ping").unwrap().responses;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses["200"].description, "Successful operation");
        assert!(responses["200"].content.is_empty());
    }

    #[test]
    fn test_first_response_per_status_wins() {
        let config = create_test_config();
        let endpoint = Endpoint::new("Login", "POST", "/login")
            .with_response(ResponseExample::new("Logged in", 200, json!({ "token": "t" })))
            .with_response(ResponseExample::new("Also ok", 200, json!({})))
            .with_response(ResponseExample::new("", 422, json!({ "errors": {} })));

        let document = build_spec(&[endpoint], &config);
        let responses = &document.operation("POST", "/login").unwrap().responses;
        assert_eq!(responses["200"].description, "Logged in");
        assert_eq!(responses["422"].description, "Unprocessable Entity");
    }

    #[test]
    fn test_tag_and_security_registries() {
        let config = create_test_config();
        let endpoints = vec![
            Endpoint::new("Me", "GET", "/me").with_folder("Account").with_middleware(["auth"]),
            Endpoint::new("Token", "POST", "/token")
                .with_folder("Auth / OTP")
                .with_auth(Auth::Bearer { token: "t".to_string() }),
            Endpoint::new("Admin", "GET", "/admin")
                .with_folder("Admin")
                .with_auth(Auth::Basic {
                    username: "a".to_string(),
                    password: "b".to_string(),
                }),
            Endpoint::new("Key", "GET", "/key").with_auth(Auth::ApiKey {
                value: "v".to_string(),
                header: "X-Key".to_string(),
            }),
            Endpoint::new("Key 2", "GET", "/key2").with_auth(Auth::ApiKey {
                value: "v".to_string(),
                header: "X-Other".to_string(),
            }),
            Endpoint::new("Public", "GET", "/public")
                .with_folder("Account")
                .with_middleware(["auth"])
                .with_auth(Auth::NoAuth),
        ];

        let document = build_spec(&endpoints, &config);

        let tags: Vec<&str> = document.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tags, vec!["Account", "Admin", "General", "OTP"]);

        let schemes = document.security_schemes().unwrap();
        let names: Vec<&String> = schemes.keys().collect();
        assert_eq!(names, vec![API_KEY_SCHEME, BASIC_SCHEME, BEARER_SCHEME]);
        assert_eq!(
            schemes[API_KEY_SCHEME],
            SecurityScheme::ApiKey {
                name: "X-Key".to_string(),
                location: "header".to_string()
            }
        );

        let me = document.operation("GET", "/me").unwrap();
        assert!(me.security[0].contains_key(BEARER_SCHEME));
        assert!(document.operation("GET", "/public").unwrap().security.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_second_api_key_header_is_reported() {
        let config = create_test_config();
        let key = |name: &str, header: &str| {
            Endpoint::new(name, "GET", &format!("/{}", name)).with_auth(Auth::ApiKey {
                value: "v".to_string(),
                header: header.to_string(),
            })
        };

        let document = build_spec(&[key("first", "X-Key"), key("second", "X-Other")], &config);

        let schemes = document.security_schemes().unwrap();
        assert_eq!(schemes.len(), 1);
        assert_eq!(
            schemes[API_KEY_SCHEME],
            SecurityScheme::ApiKey {
                name: "X-Key".to_string(),
                location: "header".to_string()
            }
        );
        let second = document.operation("GET", "/second").unwrap();
        assert!(second.security[0].contains_key(API_KEY_SCHEME));
        assert!(logs_contain("WARN"));
        assert!(logs_contain("X-Other"));
    }

    #[test]
    fn test_operation_ids() {
        let config = create_test_config();
        let endpoints = vec![
            Endpoint::new("List", "GET", "/a"),
            Endpoint::new("List", "GET", "/b"),
            Endpoint::new("", "GET", "/users/{id}"),
            Endpoint::new("", "DELETE", "/users/{id}"),
        ];

        let document = build_spec(&endpoints, &config);
        let id = |method: &str, path: &str| {
            document
                .operation(method, path)
                .and_then(|op| op.operation_id.clone())
                .unwrap()
        };
        assert_eq!(id("GET", "/a"), "list");
        assert_eq!(id("GET", "/b"), "list_2");
        assert_eq!(id("GET", "/users/{id}"), "getUser");
        assert_eq!(id("DELETE", "/users/{id}"), "deleteUser");
        assert_eq!(
            document.operation("GET", "/users/{id}").unwrap().summary.as_deref(),
            Some("Get user")
        );
    }

    #[test]
    fn test_servers() {
        let document = build_spec(&[], &create_test_config());
        assert_eq!(document.servers.len(), 1);
        assert_eq!(document.servers[0].url, "/");
        assert_eq!(document.info.title, "Test API");
        assert!(document.paths.is_empty());

        let config = create_test_config().add_server("https://api.example.com", Some("Production"));
        let document = build_spec(&[], &config);
        assert_eq!(document.servers[0].url, "https://api.example.com");
    }

    #[test]
    fn test_unsupported_method_is_skipped() {
        let document = build_spec(&[Endpoint::new("Link", "LINK", "/x")], &create_test_config());
        assert!(document.paths.is_empty());
    }

    #[test]
    fn test_output_is_deterministic() {
        let config = create_test_config();
        let endpoints = vec![
            create_user_show(),
            Endpoint::new("Me", "GET", "/me").with_middleware(["auth"]),
            Endpoint::new("Create", "POST", "/posts").with_body(body(json!({ "b": 1, "a": 2 }))),
        ];

        let first = serde_json::to_string(&build_spec(&endpoints, &config)).unwrap();
        let second = serde_json::to_string(&build_spec(&endpoints, &config)).unwrap();
        assert_eq!(first, second);
        // body property order follows the example
        assert!(first.find("\"b\":{").unwrap() < first.find("\"a\":{").unwrap());
    }
}
