/*!
Merging of declared and introspected endpoint lists.

Endpoints are matched by identity key. Which source wins field conflicts is a
caller decision ([`MergePriority`]); the introspected source always supplies
`uri` and `middleware_tags` because only it reflects live route registration.
*/

use crate::{
    config::DocsConfig,
    endpoint::{Endpoint, ResourceRef, ResponseExample, DEFAULT_BODY_LANGUAGE, DEFAULT_FOLDER},
    resolver::{ShapeInspector, StructuralResolver},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// Name of the response example produced from a resource reference
pub const RESOURCE_RESPONSE_NAME: &str = "Success";

/// Source whose non-default values win field conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePriority {
    /// Declarative definitions override introspected metadata
    #[default]
    Declared,
    /// Introspected metadata overrides declarative definitions
    Introspected,
}

/// Merge engine bound to a configuration and a shape inspector
pub struct MergeEngine<'a> {
    config: &'a DocsConfig,
    resolver: StructuralResolver<'a>,
    priority: MergePriority,
}

impl<'a> MergeEngine<'a> {
    pub fn new(config: &'a DocsConfig, inspector: &'a dyn ShapeInspector) -> Self {
        Self {
            config,
            resolver: StructuralResolver::new(inspector, config.resolver_namespaces.clone()),
            priority: MergePriority::default(),
        }
    }

    pub fn with_priority(mut self, priority: MergePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn priority(&self) -> MergePriority {
        self.priority
    }

    /// Merge both sources into one list with unique identity keys.
    ///
    /// Output order: the primary source's order (merged or passed through),
    /// then endpoints only the secondary source knows, in its order.
    pub fn merge(&self, declared: &[Endpoint], introspected: &[Endpoint]) -> Vec<Endpoint> {
        let declared = index_by_identity(declared);
        let introspected = index_by_identity(introspected);

        let (primary, secondary, primary_is_route) = match self.priority {
            MergePriority::Declared => (&declared, &introspected, false),
            MergePriority::Introspected => (&introspected, &declared, true),
        };

        let mut merged = Vec::with_capacity(primary.len() + secondary.len());
        let mut matched = 0usize;

        for (key, primary_endpoint) in primary {
            match secondary.get(key) {
                Some(secondary_endpoint) => {
                    matched += 1;
                    let route = if primary_is_route {
                        *primary_endpoint
                    } else {
                        *secondary_endpoint
                    };
                    merged.push(self.merge_endpoint(primary_endpoint, secondary_endpoint, route));
                }
                None => merged.push((*primary_endpoint).clone()),
            }
        }

        for (key, secondary_endpoint) in secondary {
            if !primary.contains_key(key) {
                merged.push((*secondary_endpoint).clone());
            }
        }

        debug!(
            "Merged {} declared and {} introspected endpoints into {} ({} matched, {:?} wins)",
            declared.len(),
            introspected.len(),
            merged.len(),
            matched,
            self.priority
        );

        merged
    }

    /// Merge two descriptions of the same endpoint.
    ///
    /// `route` is whichever of the two came from route introspection; it
    /// supplies `uri` and `middleware_tags` regardless of priority.
    pub fn merge_endpoint(&self, primary: &Endpoint, secondary: &Endpoint, route: &Endpoint) -> Endpoint {
        Endpoint {
            name: pick_text(&primary.name, &secondary.name, ""),
            method: route.method.clone(),
            uri: route.uri.clone(),
            description: match &primary.description {
                Some(description) if !description.trim().is_empty() => Some(description.clone()),
                _ => secondary.description.clone(),
            },
            folder: if self.is_default_folder(&primary.folder) {
                secondary.folder.clone()
            } else {
                primary.folder.clone()
            },
            order: if primary.order != 0 {
                primary.order
            } else {
                secondary.order
            },
            body: merge_body(primary, secondary),
            body_mode: if primary.body_mode != Default::default() {
                primary.body_mode
            } else {
                secondary.body_mode
            },
            body_language: pick_text(
                &primary.body_language,
                &secondary.body_language,
                DEFAULT_BODY_LANGUAGE,
            ),
            body_merge: false,
            body_except: BTreeSet::new(),
            headers: pick_list(&primary.headers, &secondary.headers),
            query_params: pick_list(&primary.query_params, &secondary.query_params),
            responses: self.merge_responses(primary, secondary),
            variables: pick_list(&primary.variables, &secondary.variables),
            tests: pick_list(&primary.tests, &secondary.tests),
            pre_request_scripts: pick_list(&primary.pre_request_scripts, &secondary.pre_request_scripts),
            auth: primary.auth.clone().or_else(|| secondary.auth.clone()),
            middleware_tags: route.middleware_tags.clone(),
            resource_ref: primary
                .resource_ref
                .clone()
                .or_else(|| secondary.resource_ref.clone()),
        }
    }

    /// Build the example response described by a resource reference
    pub fn expand_resource(&self, resource: &ResourceRef) -> ResponseExample {
        let shape = Value::Object(self.resolver.resolve_shape(&resource.identifier));
        let data = if resource.is_collection {
            Value::Array(vec![shape])
        } else {
            shape
        };

        let wrapped = resource
            .wrapped
            .unwrap_or(self.config.envelope.wrap_by_default);
        let body = if wrapped {
            self.envelope(resource.status, data)
        } else {
            data
        };

        ResponseExample::new(RESOURCE_RESPONSE_NAME, resource.status, body)
    }

    /// Fill an endpoint's responses from its resource reference when it has none
    pub fn expand_endpoint(&self, endpoint: &Endpoint) -> Endpoint {
        let mut expanded = endpoint.clone();
        if expanded.responses.is_empty() {
            if let Some(resource) = &endpoint.resource_ref {
                expanded.responses.push(self.expand_resource(resource));
            }
        }
        expanded
    }

    fn merge_responses(&self, primary: &Endpoint, secondary: &Endpoint) -> Vec<ResponseExample> {
        if !primary.responses.is_empty() {
            return primary.responses.clone();
        }
        if let Some(resource) = &primary.resource_ref {
            return vec![self.expand_resource(resource)];
        }
        secondary.responses.clone()
    }

    fn envelope(&self, status: u16, data: Value) -> Value {
        let envelope = &self.config.envelope;
        let mut body = Map::new();
        body.insert(envelope.success_key.clone(), Value::Bool((200..300).contains(&status)));
        body.insert(envelope.status_key.clone(), Value::from(status));
        body.insert(
            envelope.message_key.clone(),
            Value::String(envelope.default_message.clone()),
        );
        body.insert(envelope.data_key.clone(), data);
        Value::Object(body)
    }

    fn is_default_folder(&self, folder: &str) -> bool {
        let folder = folder.trim();
        folder.is_empty() || folder == DEFAULT_FOLDER || folder == self.config.default_folder
    }
}

/// Drop later endpoints whose identity key was already seen; first occurrence wins
pub fn dedupe_by_identity(endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    let mut seen = BTreeSet::new();
    endpoints
        .into_iter()
        .filter(|endpoint| {
            let key = endpoint.identity_key();
            if seen.insert(key.clone()) {
                true
            } else {
                debug!("Duplicate endpoint '{}' ignored, first occurrence wins", key);
                false
            }
        })
        .collect()
}

fn index_by_identity(endpoints: &[Endpoint]) -> IndexMap<String, &Endpoint> {
    let mut index = IndexMap::with_capacity(endpoints.len());
    for endpoint in endpoints {
        let key = endpoint.identity_key();
        if index.contains_key(&key) {
            debug!("Duplicate endpoint '{}' ignored, first occurrence wins", key);
            continue;
        }
        index.insert(key, endpoint);
    }
    index
}

/// Three-way body resolution: overlay, explicit primary body, secondary body
fn merge_body(primary: &Endpoint, secondary: &Endpoint) -> Option<Map<String, Value>> {
    if primary.body_merge {
        if primary.body.is_none() && secondary.body.is_none() {
            return None;
        }

        let mut base = secondary.body.clone().unwrap_or_default();
        base.retain(|key, _| !primary.body_except.contains(key));
        if let Some(overlay) = &primary.body {
            for (key, value) in overlay {
                base.insert(key.clone(), value.clone());
            }
        }
        return Some(base);
    }

    match &primary.body {
        Some(body) => Some(body.clone()),
        None => secondary.body.clone(),
    }
}

fn pick_text(primary: &str, secondary: &str, unset: &str) -> String {
    if primary.trim().is_empty() || primary == unset {
        secondary.to_string()
    } else {
        primary.to_string()
    }
}

fn pick_list<T: Clone>(primary: &[T], secondary: &[T]) -> Vec<T> {
    if primary.is_empty() {
        secondary.to_vec()
    } else {
        primary.to_vec()
    }
}
