/*!
Structural checks over a generated OpenAPI document.
*/

use super::specification::OpenApiDocument;
use crate::{
    endpoint::path_variables,
    error::{ApiDocError, ApiDocResult},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Error,
    Warning,
    Info,
}

/// Validation warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub message: String,
    pub level: ValidationLevel,
}

impl ValidationWarning {
    pub fn new(message: &str, level: ValidationLevel) -> Self {
        Self {
            message: message.to_string(),
            level,
        }
    }
}

/// Validate an OpenAPI document
pub fn validate_document(document: &OpenApiDocument) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if document.info.title.trim().is_empty() {
        warnings.push(ValidationWarning::new(
            "info.title is required but empty",
            ValidationLevel::Error,
        ));
    }

    if document.info.version.trim().is_empty() {
        warnings.push(ValidationWarning::new(
            "info.version is required but empty",
            ValidationLevel::Error,
        ));
    }

    if document.paths.is_empty() {
        warnings.push(ValidationWarning::new(
            "No paths defined in document",
            ValidationLevel::Info,
        ));
    }

    let schemes = document.security_schemes();
    let mut operation_ids: BTreeMap<&str, usize> = BTreeMap::new();

    for (path, item) in &document.paths {
        if !path.starts_with('/') {
            warnings.push(ValidationWarning::new(
                &format!("Path '{}' should start with '/'", path),
                ValidationLevel::Warning,
            ));
        }

        if item.operations().is_empty() {
            warnings.push(ValidationWarning::new(
                &format!("Path '{}' has no operations defined", path),
                ValidationLevel::Warning,
            ));
        }

        let template_variables = path_variables(path);

        for (method, operation) in item.operations() {
            if operation.responses.is_empty() {
                warnings.push(ValidationWarning::new(
                    &format!("{} {} has no responses defined", method, path),
                    ValidationLevel::Error,
                ));
            }

            if let Some(id) = &operation.operation_id {
                *operation_ids.entry(id.as_str()).or_default() += 1;
            }

            for requirement in &operation.security {
                for scheme in requirement.keys() {
                    if !schemes.map_or(false, |registered| registered.contains_key(scheme)) {
                        warnings.push(ValidationWarning::new(
                            &format!(
                                "{} {} references unknown security scheme '{}'",
                                method, path, scheme
                            ),
                            ValidationLevel::Error,
                        ));
                    }
                }
            }

            for variable in &template_variables {
                let declared = operation
                    .parameters
                    .iter()
                    .any(|parameter| parameter.location == "path" && &parameter.name == variable);
                if !declared {
                    warnings.push(ValidationWarning::new(
                        &format!(
                            "{} {} does not declare path parameter '{}'",
                            method, path, variable
                        ),
                        ValidationLevel::Warning,
                    ));
                }
            }
        }
    }

    for (id, count) in operation_ids {
        if count > 1 {
            warnings.push(ValidationWarning::new(
                &format!("operationId '{}' is used by {} operations", id, count),
                ValidationLevel::Error,
            ));
        }
    }

    warnings
}

/// Whether any warning is an error
pub fn has_errors(warnings: &[ValidationWarning]) -> bool {
    warnings
        .iter()
        .any(|warning| warning.level == ValidationLevel::Error)
}

/// Fail with the error-level findings joined into one message
pub fn ensure_valid(document: &OpenApiDocument) -> ApiDocResult<()> {
    let errors: Vec<String> = validate_document(document)
        .into_iter()
        .filter(|warning| warning.level == ValidationLevel::Error)
        .map(|warning| warning.message)
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiDocError::validation_error(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::specification::{Operation, Parameter, PathItem, SecurityRequirement};
    use crate::openapi::{build_spec, OpenApiDocument};
    use crate::test_utils::{create_test_config, create_user_show};

    fn operation(id: &str) -> Operation {
        let mut operation = Operation {
            operation_id: Some(id.to_string()),
            ..Default::default()
        };
        operation.responses.insert(
            "200".to_string(),
            crate::openapi::specification::Response {
                description: "OK".to_string(),
                headers: Default::default(),
                content: Default::default(),
            },
        );
        operation
    }

    #[test]
    fn test_generated_document_is_clean() {
        let config = create_test_config();
        let document = build_spec(&[create_user_show()], &config);
        assert!(validate_document(&document).is_empty());
        assert!(ensure_valid(&document).is_ok());
    }

    #[test]
    fn test_empty_info_is_error() {
        let document = OpenApiDocument::new("", "");
        let warnings = validate_document(&document);
        assert!(has_errors(&warnings));
        assert!(matches!(ensure_valid(&document), Err(ApiDocError::Validation(_))));
        assert_eq!(
            warnings
                .iter()
                .filter(|w| w.level == ValidationLevel::Error)
                .count(),
            2
        );
    }

    #[test]
    fn test_structural_problems() {
        let mut document = OpenApiDocument::new("API", "1.0.0");

        let mut users = PathItem::default();
        users.get = Some(operation("listUsers"));
        document.paths.insert("users".to_string(), users);

        let mut user = PathItem::default();
        let mut show = operation("listUsers");
        let mut requirement = SecurityRequirement::new();
        requirement.insert("oauth".to_string(), Vec::new());
        show.security.push(requirement);
        show.parameters.push(Parameter {
            name: "id".to_string(),
            location: "query".to_string(),
            description: None,
            required: None,
            schema: None,
            example: None,
        });
        user.get = Some(show);
        user.delete = Some(Operation::default());
        document.paths.insert("/users/{id}".to_string(), user);

        document.paths.insert("/empty".to_string(), PathItem::default());

        let messages: Vec<String> = validate_document(&document)
            .into_iter()
            .map(|w| w.message)
            .collect();

        assert!(messages.contains(&"Path 'users' should start with '/'".to_string()));
        assert!(messages.contains(&"Path '/empty' has no operations defined".to_string()));
        assert!(messages.contains(&"DELETE /users/{id} has no responses defined".to_string()));
        assert!(messages.contains(&"GET /users/{id} references unknown security scheme 'oauth'".to_string()));
        assert!(messages.contains(&"GET /users/{id} does not declare path parameter 'id'".to_string()));
        assert!(messages.contains(&"operationId 'listUsers' is used by 2 operations".to_string()));
    }
}
