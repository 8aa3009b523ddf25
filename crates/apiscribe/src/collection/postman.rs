// Postman collection v2.1 format structures

use serde::{Deserialize, Serialize};

pub const POSTMAN_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanCollection {
    pub info: PostmanInfo,
    pub item: Vec<PostmanItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable: Vec<PostmanVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanInfo {
    #[serde(rename = "_postman_id")]
    pub postman_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostmanItem {
    Folder(PostmanFolder),
    Request(PostmanRequestItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanFolder {
    pub name: String,
    pub item: Vec<PostmanItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanRequestItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event: Vec<PostmanEvent>,
    pub request: PostmanRequest,
    #[serde(default)]
    pub response: Vec<PostmanResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanRequest {
    pub method: String,
    pub header: Vec<PostmanHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PostmanBody>,
    pub url: PostmanUrl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<PostmanAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanHeader {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanUrl {
    pub raw: String,
    pub host: Vec<String>,
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<PostmanQuery>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable: Vec<PostmanVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanQuery {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanVariable {
    pub key: String,
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanBody {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<PostmanBodyOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formdata: Option<Vec<PostmanFormParam>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urlencoded: Option<Vec<PostmanFormParam>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanBodyOptions {
    pub raw: PostmanRawOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanRawOptions {
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanFormParam {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// `text` or `file`
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanAuth {
    #[serde(rename = "type")]
    pub auth_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer: Option<Vec<PostmanAuthAttribute>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<Vec<PostmanAuthAttribute>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apikey: Option<Vec<PostmanAuthAttribute>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanAuthAttribute {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanEvent {
    /// `test` or `prerequest`
    pub listen: String,
    pub script: PostmanScript,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanScript {
    #[serde(rename = "type")]
    pub script_type: String,
    pub exec: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanResponse {
    pub name: String,
    pub status: String,
    pub code: u16,
    #[serde(rename = "_postman_previewlanguage")]
    pub preview_language: String,
    pub header: Vec<PostmanHeader>,
    pub body: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl PostmanCollection {
    pub fn new(id: &str, name: &str, description: &Option<String>) -> Self {
        Self {
            info: PostmanInfo {
                postman_id: id.to_string(),
                name: name.to_string(),
                description: description.clone(),
                schema: POSTMAN_SCHEMA.to_string(),
            },
            item: Vec::new(),
            variable: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: PostmanItem) {
        self.item.push(item);
    }

    /// Request items at any depth
    pub fn request_count(&self) -> usize {
        self.item.iter().map(PostmanItem::request_count).sum()
    }
}

impl PostmanItem {
    pub fn name(&self) -> &str {
        match self {
            PostmanItem::Folder(folder) => &folder.name,
            PostmanItem::Request(request) => &request.name,
        }
    }

    pub fn request_count(&self) -> usize {
        match self {
            PostmanItem::Folder(folder) => folder.item.iter().map(PostmanItem::request_count).sum(),
            PostmanItem::Request(_) => 1,
        }
    }
}

impl PostmanHeader {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            description: None,
            disabled: false,
        }
    }
}

impl PostmanVariable {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            variable_type: None,
            description: None,
        }
    }

    pub fn string(key: &str, value: &str) -> Self {
        Self {
            variable_type: Some("string".to_string()),
            ..Self::new(key, value)
        }
    }
}

impl PostmanAuth {
    fn with_type(auth_type: &str) -> Self {
        Self {
            auth_type: auth_type.to_string(),
            bearer: None,
            basic: None,
            apikey: None,
        }
    }

    pub fn bearer(token: &str) -> Self {
        Self {
            bearer: Some(vec![PostmanAuthAttribute::string("token", token)]),
            ..Self::with_type("bearer")
        }
    }

    pub fn basic(username: &str, password: &str) -> Self {
        Self {
            basic: Some(vec![
                PostmanAuthAttribute::string("username", username),
                PostmanAuthAttribute::string("password", password),
            ]),
            ..Self::with_type("basic")
        }
    }

    pub fn apikey(header: &str, value: &str) -> Self {
        Self {
            apikey: Some(vec![
                PostmanAuthAttribute::string("key", header),
                PostmanAuthAttribute::string("value", value),
                PostmanAuthAttribute::string("in", "header"),
            ]),
            ..Self::with_type("apikey")
        }
    }

    pub fn noauth() -> Self {
        Self::with_type("noauth")
    }
}

impl PostmanAuthAttribute {
    pub fn string(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            attribute_type: "string".to_string(),
        }
    }
}

impl PostmanEvent {
    pub fn new(listen: &str, exec: Vec<String>) -> Self {
        Self {
            listen: listen.to_string(),
            script: PostmanScript {
                script_type: "text/javascript".to_string(),
                exec,
            },
        }
    }
}
