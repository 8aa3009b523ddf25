/*!
Serialization of generated documents to JSON or YAML text and files.
*/

use crate::error::{ApiDocError, ApiDocResult};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Output format for saving documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    /// Format implied by a file extension (`json`, `yaml`, `yml`)
    pub fn from_path<P: AsRef<Path>>(path: P) -> ApiDocResult<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(ApiDocError::export_error(format!(
                "Cannot infer output format from extension '{}'",
                other
            ))),
        }
    }
}

/// Render a document as text
pub fn render<T: Serialize>(document: &T, format: OutputFormat, pretty: bool) -> ApiDocResult<String> {
    let content = match format {
        OutputFormat::Json => {
            if pretty {
                serde_json::to_string_pretty(document)?
            } else {
                serde_json::to_string(document)?
            }
        }
        OutputFormat::Yaml => serde_yaml::to_string(document)?,
    };
    Ok(content)
}

/// Save a document to a file, creating missing parent directories
pub fn write_document<T: Serialize, P: AsRef<Path>>(
    document: &T,
    path: P,
    format: OutputFormat,
    pretty: bool,
) -> ApiDocResult<()> {
    let path = path.as_ref();
    let content = render(document, format, pretty)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;

    debug!("Wrote {:?} document to {}", format, path.display());
    Ok(())
}

/// Load a previously written document; the format follows the extension and
/// falls back to sniffing the content
pub fn load_document<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> ApiDocResult<T> {
    let content = fs::read_to_string(path.as_ref())?;

    match OutputFormat::from_path(path.as_ref()) {
        Ok(OutputFormat::Json) => Ok(serde_json::from_str(&content)?),
        Ok(OutputFormat::Yaml) => Ok(serde_yaml::from_str(&content)?),
        Err(_) => {
            if content.trim_start().starts_with('{') {
                Ok(serde_json::from_str(&content)?)
            } else {
                Ok(serde_yaml::from_str(&content)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::{build_spec, OpenApiDocument};
    use crate::test_utils::{create_test_config, create_user_show};
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path("openapi.json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path("openapi.YML").unwrap(), OutputFormat::Yaml);
        assert!(matches!(
            OutputFormat::from_path("openapi.txt"),
            Err(ApiDocError::Export(_))
        ));
    }

    #[test]
    fn test_render_formats() {
        let document = build_spec(&[create_user_show()], &create_test_config());

        let compact = render(&document, OutputFormat::Json, false).unwrap();
        assert!(compact.starts_with("{\"openapi\":\"3.0.3\""));

        let pretty = render(&document, OutputFormat::Json, true).unwrap();
        assert!(pretty.contains("\n  \"openapi\": \"3.0.3\""));

        let yaml = render(&document, OutputFormat::Yaml, true).unwrap();
        assert!(yaml.contains("openapi: 3.0.3"));
        assert!(yaml.contains("/v1/users/{id}"));
    }

    #[test]
    fn test_write_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let document = build_spec(&[create_user_show()], &create_test_config());

        let json_path = temp_dir.path().join("docs").join("openapi.json");
        write_document(&document, &json_path, OutputFormat::Json, true).unwrap();
        let loaded: OpenApiDocument = load_document(&json_path).unwrap();
        assert_eq!(loaded, document);

        let yaml_path = temp_dir.path().join("openapi.yaml");
        write_document(&document, &yaml_path, OutputFormat::Yaml, true).unwrap();
        let loaded: OpenApiDocument = load_document(&yaml_path).unwrap();
        assert_eq!(loaded, document);

        let missing = load_document::<OpenApiDocument, _>(temp_dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ApiDocError::Io(_))));
    }
}
