use crate::{
    endpoint::{KeyValue, VariableScope, DEFAULT_FOLDER},
    error::{ApiDocError, ApiDocResult},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration consumed by the merge engine and both generators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Document information
    pub info: DocsInfo,

    /// OpenAPI servers; empty means a single root server
    pub servers: Vec<ServerConfig>,

    /// Value of the base URL collection variable
    pub base_url: String,

    /// Name of the base URL collection variable
    pub base_url_variable: String,

    /// Version token (first path segment) → host variable name
    pub versioned_hosts: IndexMap<String, String>,

    /// Headers attached to every collection request
    pub default_headers: Vec<KeyValue>,

    /// Custom collection variables
    pub variables: IndexMap<String, String>,

    /// Scope used for extracted variables that do not declare one
    pub variable_scope: VariableScope,

    /// Response envelope applied around resolved resource shapes
    pub envelope: EnvelopeConfig,

    /// Separator between folder path segments
    pub folder_separator: String,

    /// Folder used for endpoints without one
    pub default_folder: String,

    /// Middleware tags that imply bearer authentication
    pub protected_tags: Vec<String>,

    /// Collection variable holding the bearer token for tag-derived auth
    pub auth_token_variable: String,

    /// Fallback namespaces searched when resolving transformer references
    pub resolver_namespaces: Vec<String>,

    /// De-duplicate collection leaves by name and identity key
    pub dedupe_leaves: bool,
}

/// Title/version/description of the generated documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Keys and defaults of the `{success, status_code, message, data}` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub success_key: String,
    pub status_key: String,
    pub message_key: String,
    pub data_key: String,
    pub default_message: String,
    /// Wrap resource shapes when a resource reference leaves it unspecified
    pub wrap_by_default: bool,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            info: DocsInfo::default(),
            servers: Vec::new(),
            base_url: "http://localhost:8000".to_string(),
            base_url_variable: "base_url".to_string(),
            versioned_hosts: IndexMap::new(),
            default_headers: vec![
                KeyValue::new("Accept", "application/json"),
                KeyValue::new("Content-Type", "application/json"),
            ],
            variables: IndexMap::new(),
            variable_scope: VariableScope::Collection,
            envelope: EnvelopeConfig::default(),
            folder_separator: "/".to_string(),
            default_folder: DEFAULT_FOLDER.to_string(),
            protected_tags: vec![
                "auth".to_string(),
                "auth:sanctum".to_string(),
                "auth:api".to_string(),
                "jwt".to_string(),
            ],
            auth_token_variable: "auth_token".to_string(),
            resolver_namespaces: vec![
                "app::http::resources".to_string(),
                "app::resources".to_string(),
                "app::transformers".to_string(),
            ],
            dedupe_leaves: false,
        }
    }
}

impl Default for DocsInfo {
    fn default() -> Self {
        Self {
            title: "API Documentation".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            success_key: "success".to_string(),
            status_key: "status_code".to_string(),
            message_key: "message".to_string(),
            data_key: "data".to_string(),
            default_message: "Operation successful".to_string(),
            wrap_by_default: true,
        }
    }
}

impl DocsConfig {
    /// Create a new configuration with custom document info
    pub fn new(title: &str, version: &str) -> Self {
        let mut config = Self::default();
        config.info.title = title.to_string();
        config.info.version = version.to_string();
        config
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> ApiDocResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> ApiDocResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Reject configurations that would produce unusable documents
    pub fn validate(&self) -> ApiDocResult<()> {
        if self.info.title.trim().is_empty() {
            return Err(ApiDocError::config_error("info.title must not be empty"));
        }
        if self.info.version.trim().is_empty() {
            return Err(ApiDocError::config_error("info.version must not be empty"));
        }
        if self.folder_separator.is_empty() {
            return Err(ApiDocError::config_error("folder_separator must not be empty"));
        }
        Ok(())
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.info.description = Some(description.to_string());
        self
    }

    /// Add a server configuration
    pub fn add_server(mut self, url: &str, description: Option<&str>) -> Self {
        self.servers.push(ServerConfig {
            url: url.to_string(),
            description: description.map(|s| s.to_string()),
        });
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Route URIs whose first segment is `token` through `{{variable}}`
    pub fn add_versioned_host(mut self, token: &str, variable: &str) -> Self {
        self.versioned_hosts
            .insert(token.to_string(), variable.to_string());
        self
    }

    pub fn add_variable(mut self, key: &str, value: &str) -> Self {
        self.variables.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_default_headers(mut self, headers: Vec<KeyValue>) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopeConfig) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_folder_separator(mut self, separator: &str) -> Self {
        self.folder_separator = separator.to_string();
        self
    }

    pub fn with_dedupe_leaves(mut self, dedupe: bool) -> Self {
        self.dedupe_leaves = dedupe;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DocsConfig::default();
        assert_eq!(config.info.title, "API Documentation");
        assert_eq!(config.folder_separator, "/");
        assert!(config.protected_tags.contains(&"auth".to_string()));
        assert!(config.envelope.wrap_by_default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DocsConfig::from_toml_str(
            r#"
base_url = "https://api.example.com"
protected_tags = ["auth:api"]

[info]
title = "Shop API"
version = "2.0.0"

[versioned_hosts]
v1 = "base_url_v1"

[envelope]
wrap_by_default = false
            "#,
        )
        .unwrap();

        assert_eq!(config.info.title, "Shop API");
        assert_eq!(config.info.version, "2.0.0");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.versioned_hosts.get("v1").map(String::as_str), Some("base_url_v1"));
        assert_eq!(config.protected_tags, vec!["auth:api".to_string()]);
        assert!(!config.envelope.wrap_by_default);
        assert_eq!(config.envelope.data_key, "data");
        assert_eq!(config.default_folder, "General");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = DocsConfig::from_toml_str("[info]\ntitle = \"\"\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("info.title"));

        let result = DocsConfig::from_toml_str("folder_separator = \"\"\n");
        assert!(matches!(result, Err(ApiDocError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("apidocs.toml");
        fs::write(&path, "[info]\ntitle = \"Files\"\nversion = \"0.1.0\"\n").unwrap();

        let config = DocsConfig::load(&path).unwrap();
        assert_eq!(config.info.title, "Files");

        let missing = DocsConfig::load(temp_dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ApiDocError::Io(_))));
    }

    #[test]
    fn test_builder_methods() {
        let config = DocsConfig::new("Test API", "1.0.0")
            .with_description("Docs")
            .add_server("https://api.example.com", Some("Production"))
            .add_versioned_host("v2", "base_url_v2")
            .add_variable("tenant", "acme");

        assert_eq!(config.info.description.as_deref(), Some("Docs"));
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.versioned_hosts.len(), 1);
        assert_eq!(config.variables.get("tenant").map(String::as_str), Some("acme"));
    }
}
