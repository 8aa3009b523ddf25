use crate::pattern;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Separator between namespace segments of a transformer identity
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Declared text of a transformer, as seen by a shape inspector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerSource {
    /// Fully-qualified identity, e.g. `app::http::resources::UserResource`
    pub identity: String,
    /// Local alias → fully-qualified identity
    pub imports: BTreeMap<String, String>,
    /// Text containing the returned map literal
    pub body: String,
}

/// Capability to look up a transformer's declared source by identity.
///
/// Implementations may read a registered metadata table, walk an AST or
/// scan source files; the resolver only needs the declared body text.
pub trait ShapeInspector {
    fn inspect(&self, identity: &str) -> Option<&TransformerSource>;

    fn contains(&self, identity: &str) -> bool {
        self.inspect(identity).is_some()
    }
}

fn use_regex() -> Option<&'static Regex> {
    static USE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern::cached(
        &USE,
        r"(?m)^\s*use\s+((?:[A-Za-z_][A-Za-z0-9_]*::)*[A-Za-z_][A-Za-z0-9_]*)(?:\s+as\s+([A-Za-z_][A-Za-z0-9_]*))?\s*;",
    )
}

impl TransformerSource {
    pub fn new(identity: &str, body: &str) -> Self {
        Self {
            identity: identity.to_string(),
            imports: BTreeMap::new(),
            body: body.to_string(),
        }
    }

    /// Build a source from text that may start with `use path::Name [as Alias];`
    /// lines; those become the import table and the remainder the body.
    pub fn from_text(identity: &str, text: &str) -> Self {
        let Some(regex) = use_regex() else {
            return Self::new(identity, text.trim());
        };

        let mut imports = BTreeMap::new();
        for caps in regex.captures_iter(text) {
            let path = caps[1].to_string();
            let alias = match caps.get(2) {
                Some(alias) => alias.as_str().to_string(),
                None => short_name(&path).to_string(),
            };
            imports.insert(alias, path);
        }

        Self {
            identity: identity.to_string(),
            imports,
            body: regex.replace_all(text, "").trim().to_string(),
        }
    }

    pub fn with_import(mut self, alias: &str, identity: &str) -> Self {
        self.imports.insert(alias.to_string(), identity.to_string());
        self
    }

    /// Namespace part of the identity (empty for unqualified identities)
    pub fn namespace(&self) -> &str {
        namespace_of(&self.identity)
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.identity)
    }
}

/// Last segment of a possibly qualified name
pub fn short_name(identity: &str) -> &str {
    identity
        .rsplit(NAMESPACE_SEPARATOR)
        .next()
        .unwrap_or(identity)
}

pub fn namespace_of(identity: &str) -> &str {
    identity
        .rsplit_once(NAMESPACE_SEPARATOR)
        .map(|(namespace, _)| namespace)
        .unwrap_or("")
}

/// In-memory registered-metadata inspector
#[derive(Debug, Clone, Default)]
pub struct TransformerRegistry {
    sources: IndexMap<String, TransformerSource>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source; a later registration of the same identity replaces it
    pub fn register(&mut self, source: TransformerSource) {
        self.sources.insert(source.identity.clone(), source);
    }

    pub fn with(mut self, source: TransformerSource) -> Self {
        self.register(source);
        self
    }

    /// Register `text` (see [`TransformerSource::from_text`]) under `identity`
    pub fn with_text(self, identity: &str, text: &str) -> Self {
        self.with(TransformerSource::from_text(identity, text))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl ShapeInspector for TransformerRegistry {
    fn inspect(&self, identity: &str) -> Option<&TransformerSource> {
        self.sources.get(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_parts() {
        let source = TransformerSource::new("app::http::resources::UserResource", "{}");
        assert_eq!(source.namespace(), "app::http::resources");
        assert_eq!(source.short_name(), "UserResource");

        let bare = TransformerSource::new("UserResource", "{}");
        assert_eq!(bare.namespace(), "");
        assert_eq!(bare.short_name(), "UserResource");
    }

    #[test]
    fn test_from_text_collects_imports() {
        let source = TransformerSource::from_text(
            "app::resources::PostResource",
            "use app::people::AuthorResource as Writer;\nuse app::tags::TagResource;\n\n{ 'author' => new Writer(self.author) }",
        );

        assert_eq!(
            source.imports.get("Writer").map(String::as_str),
            Some("app::people::AuthorResource")
        );
        assert_eq!(
            source.imports.get("TagResource").map(String::as_str),
            Some("app::tags::TagResource")
        );
        assert_eq!(source.body, "{ 'author' => new Writer(self.author) }");
    }

    #[test]
    fn test_registry_lookup() {
        let registry = TransformerRegistry::new()
            .with(TransformerSource::new("a::One", "{}"))
            .with_text("a::Two", "{ 'id' => self.id }");

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a::One"));
        assert!(!registry.contains("One"));
        assert_eq!(registry.inspect("a::Two").map(|s| s.body.as_str()), Some("{ 'id' => self.id }"));
    }
}
