/*!
Structural resolution of transformer output shapes.

A transformer is a named projection that returns a key → expression map. The
resolver never executes it: it reads the declared map literal through a
[`ShapeInspector`], follows references to other transformers and fills leaf
fields with the value synthesizer.

Reference resolution order for a name found inside transformer `T`:

1. a qualified name that is registered as-is,
2. `T`'s import table (the first segment is looked up as an alias),
3. `T`'s own namespace,
4. each configured fallback namespace in order,
5. an unqualified name that is registered as-is.

When a reference closes a cycle the resolver emits
`{"__recursive__": "<ShortName>"}` in place of the nested shape. Generators
surface this marker verbatim.
*/

pub mod scanner;
pub mod source;

pub use scanner::{CallKind, ShapeEntry, TransformerCall};
pub use source::{ShapeInspector, TransformerRegistry, TransformerSource, NAMESPACE_SEPARATOR};

use crate::synth::{synthesize, FieldConstraints};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Key of the marker emitted when a reference closes a cycle
pub const RECURSIVE_MARKER: &str = "__recursive__";

/// Resolves transformer references into example shapes
pub struct StructuralResolver<'a> {
    inspector: &'a dyn ShapeInspector,
    namespaces: Vec<String>,
}

impl<'a> StructuralResolver<'a> {
    pub fn new(inspector: &'a dyn ShapeInspector, namespaces: Vec<String>) -> Self {
        Self {
            inspector,
            namespaces,
        }
    }

    /// Resolve the output shape of `reference`.
    ///
    /// Unknown references and unparsable bodies yield an empty map. Each call
    /// starts with its own cycle guard.
    pub fn resolve_shape(&self, reference: &str) -> Map<String, Value> {
        let mut visited = BTreeSet::new();
        self.resolve_with_visited(reference, &mut visited)
    }

    /// Resolve with an explicit cycle guard holding the identities currently
    /// being expanded. The set is restored before returning.
    pub fn resolve_with_visited(
        &self,
        reference: &str,
        visited: &mut BTreeSet<String>,
    ) -> Map<String, Value> {
        match self.resolve_identity(reference, None) {
            Some(identity) => self.resolve_identity_shape(&identity, visited),
            None => {
                debug!("Transformer reference '{}' could not be resolved", reference);
                Map::new()
            }
        }
    }

    /// Fully-qualified identity of `name` as seen from `current`
    pub fn resolve_identity(&self, name: &str, current: Option<&TransformerSource>) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        if name.contains(NAMESPACE_SEPARATOR) && self.inspector.contains(name) {
            return Some(name.to_string());
        }

        if let Some(source) = current {
            let (head, rest) = match name.split_once(NAMESPACE_SEPARATOR) {
                Some((head, rest)) => (head, Some(rest)),
                None => (name, None),
            };
            if let Some(imported) = source.imports.get(head) {
                let candidate = match rest {
                    Some(rest) => format!("{}{}{}", imported, NAMESPACE_SEPARATOR, rest),
                    None => imported.clone(),
                };
                if self.inspector.contains(&candidate) {
                    return Some(candidate);
                }
            }

            let namespace = source.namespace();
            if !namespace.is_empty() {
                let candidate = format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, name);
                if self.inspector.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }

        for namespace in &self.namespaces {
            let candidate = format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, name);
            if self.inspector.contains(&candidate) {
                return Some(candidate);
            }
        }

        if self.inspector.contains(name) {
            return Some(name.to_string());
        }

        None
    }

    fn resolve_identity_shape(
        &self,
        identity: &str,
        visited: &mut BTreeSet<String>,
    ) -> Map<String, Value> {
        let Some(source) = self.inspector.inspect(identity) else {
            return Map::new();
        };

        if visited.contains(identity) {
            trace!("Cycle through transformer '{}' cut off", identity);
            let mut marker = Map::new();
            marker.insert(
                RECURSIVE_MARKER.to_string(),
                Value::String(source.short_name().to_string()),
            );
            return marker;
        }

        let Some(entries) = scanner::scan_entries(&source.body) else {
            debug!("Transformer '{}' has no readable map literal", identity);
            return Map::new();
        };

        visited.insert(identity.to_string());
        let shape = self.resolve_entries(source, &entries, visited);
        visited.remove(identity);
        shape
    }

    fn resolve_entries(
        &self,
        source: &TransformerSource,
        entries: &[ShapeEntry],
        visited: &mut BTreeSet<String>,
    ) -> Map<String, Value> {
        let mut shape = Map::new();
        for entry in entries {
            let value = self.resolve_expression(source, entry, visited);
            shape.insert(entry.key.clone(), value);
        }
        shape
    }

    fn resolve_expression(
        &self,
        source: &TransformerSource,
        entry: &ShapeEntry,
        visited: &mut BTreeSet<String>,
    ) -> Value {
        if let Some(nested) = scanner::nested_entries(&entry.expression) {
            return Value::Object(self.resolve_entries(source, &nested, visited));
        }

        let call = if scanner::is_conditional(&entry.expression) {
            scanner::find_call(&entry.expression)
        } else {
            scanner::leading_call(&entry.expression)
        };

        match call {
            Some(call) => self.resolve_call(source, &call, visited),
            None => synthesize(&entry.key, &FieldConstraints::default()),
        }
    }

    fn resolve_call(
        &self,
        source: &TransformerSource,
        call: &TransformerCall,
        visited: &mut BTreeSet<String>,
    ) -> Value {
        let shape = match self.resolve_identity(&call.name, Some(source)) {
            Some(identity) => self.resolve_identity_shape(&identity, visited),
            None => {
                debug!(
                    "Reference '{}' in transformer '{}' could not be resolved",
                    call.name, source.identity
                );
                Map::new()
            }
        };

        match call.kind {
            CallKind::Collection => Value::Array(vec![Value::Object(shape)]),
            CallKind::Construct | CallKind::Factory => Value::Object(shape),
        }
    }
}
