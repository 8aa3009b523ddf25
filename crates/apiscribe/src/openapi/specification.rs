use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPENAPI_VERSION: &str = "3.0.3";

/// Complete OpenAPI 3.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI specification version
    pub openapi: String,

    /// API metadata
    pub info: ApiInfo,

    /// Server URLs
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub servers: Vec<Server>,

    /// API paths and operations
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,

    /// Reusable components
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub components: Option<Components>,

    /// Tags for grouping operations
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<Tag>,
}

/// API metadata information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    pub version: String,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// Operations available on one path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub get: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub put: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub delete: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub options: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub head: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub patch: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trace: Option<Operation>,
}

/// HTTP operation (GET, POST, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Operation {
    /// Tags for grouping
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,

    /// Short summary
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<String>,

    /// Long description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Unique operation ID
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none", default)]
    pub operation_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none", default)]
    pub request_body: Option<RequestBody>,

    /// Responses keyed by status code
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security: Vec<SecurityRequirement>,
}

/// Parameter for operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    /// Parameter location (query, header, path, cookie)
    #[serde(rename = "in")]
    pub location: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub required: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<Schema>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub example: Option<serde_json::Value>,
}

/// Request body specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Media type content
    pub content: BTreeMap<String, MediaType>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub required: Option<bool>,
}

/// Response specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub headers: BTreeMap<String, Header>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub content: BTreeMap<String, MediaType>,
}

/// Response header specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<Schema>,
}

/// Media type specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<Schema>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub example: Option<serde_json::Value>,
}

/// Schema for data types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// Data type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub schema_type: Option<String>,

    /// Format specifier
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nullable: Option<bool>,

    /// Properties for object types, in example order
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub properties: IndexMap<String, Schema>,

    /// Required properties
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,

    /// Items schema for arrays
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub items: Option<Box<Schema>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub example: Option<serde_json::Value>,
}

/// Reusable components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Components {
    /// Security schemes
    #[serde(rename = "securitySchemes", skip_serializing_if = "BTreeMap::is_empty", default)]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

/// Security scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: String,
    },
    #[serde(rename = "http")]
    Http {
        scheme: String,
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none", default)]
        bearer_format: Option<String>,
    },
}

/// Security requirement
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// Tag for grouping operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl OpenApiDocument {
    /// Create a new document
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: ApiInfo {
                title: title.to_string(),
                description: None,
                version: version.to_string(),
            },
            servers: Vec::new(),
            paths: BTreeMap::new(),
            components: None,
            tags: Vec::new(),
        }
    }

    /// Every `(method, path, operation)` triple in path order
    pub fn operations(&self) -> Vec<(&'static str, &str, &Operation)> {
        let mut operations = Vec::new();
        for (path, item) in &self.paths {
            for (method, operation) in item.operations() {
                operations.push((method, path.as_str(), operation));
            }
        }
        operations
    }

    pub fn operation(&self, method: &str, path: &str) -> Option<&Operation> {
        self.paths.get(path)?.operation(method)
    }

    pub fn security_schemes(&self) -> Option<&BTreeMap<String, SecurityScheme>> {
        self.components
            .as_ref()
            .map(|components| &components.security_schemes)
    }
}

impl PathItem {
    /// Slot for an upper-case HTTP method; `None` for unsupported methods
    pub fn slot_mut(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        match method {
            "GET" => Some(&mut self.get),
            "PUT" => Some(&mut self.put),
            "POST" => Some(&mut self.post),
            "DELETE" => Some(&mut self.delete),
            "OPTIONS" => Some(&mut self.options),
            "HEAD" => Some(&mut self.head),
            "PATCH" => Some(&mut self.patch),
            "TRACE" => Some(&mut self.trace),
            _ => None,
        }
    }

    pub fn operation(&self, method: &str) -> Option<&Operation> {
        self.operations()
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(method))
            .map(|(_, operation)| operation)
    }

    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        let slots = [
            ("GET", &self.get),
            ("PUT", &self.put),
            ("POST", &self.post),
            ("DELETE", &self.delete),
            ("OPTIONS", &self.options),
            ("HEAD", &self.head),
            ("PATCH", &self.patch),
            ("TRACE", &self.trace),
        ];
        slots
            .into_iter()
            .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
            .collect()
    }
}

impl Schema {
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }
}
