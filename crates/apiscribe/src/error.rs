use thiserror::Error;

/// Result type for documentation operations
pub type ApiDocResult<T> = Result<T, ApiDocError>;

/// Errors raised by the I/O-facing surfaces of the crate.
///
/// Synthesis, resolution, merging and document generation never fail; only
/// configuration loading, definition decoding and export produce these.
#[derive(Debug, Error)]
pub enum ApiDocError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Declarative definition record error
    #[error("Definition error: {0}")]
    Definition(String),

    /// Export format error
    #[error("Export format error: {0}")]
    Export(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Regular expression compilation error
    #[error("Pattern error: {0}")]
    Pattern(String),
}

impl ApiDocError {
    /// Create a new configuration error
    pub fn config_error<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    /// Create a new definition error
    pub fn definition_error<T: ToString>(msg: T) -> Self {
        Self::Definition(msg.to_string())
    }

    /// Create a new export format error
    pub fn export_error<T: ToString>(msg: T) -> Self {
        Self::Export(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation_error<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create a new pattern error
    pub fn pattern_error<T: ToString>(msg: T) -> Self {
        Self::Pattern(msg.to_string())
    }
}
