/*!
# apiscribe

API documentation synthesis from declared and introspected endpoint metadata.

Two endpoint sources are reconciled into one canonical list, response shapes
are derived structurally from transformer declarations, and the result is
rendered both as a Postman v2.1 collection and as an OpenAPI 3.0 document.

## Features

- Declarative endpoint definitions loaded from JSON or YAML records
- Priority-driven merge of declared and introspected endpoints
- Structural transformer resolution with cycle markers
- Rule- and name-driven example value synthesis
- Postman collections with nested folders, scripts, auth and variables
- OpenAPI documents with inferred schemas and security schemes

## Usage

```rust,no_run
use apiscribe::{
    build_spec, endpoints_from_definitions, CollectionGenerator, DocsConfig, MergeEngine,
    OutputFormat, TransformerRegistry,
};

let config = DocsConfig::load("apiscribe.toml").unwrap();
let registry = TransformerRegistry::new();
let declared = endpoints_from_definitions(&[], &config);
let introspected: Vec<apiscribe::Endpoint> = Vec::new(); // Route table metadata here

let endpoints = MergeEngine::new(&config, &registry).merge(&declared, &introspected);
let collection = CollectionGenerator::new(&config).generate(&endpoints).unwrap();
let document = build_spec(&endpoints, &config);

apiscribe::write_document(&collection, "docs/collection.json", OutputFormat::Json, true).unwrap();
apiscribe::write_document(&document, "docs/openapi.yaml", OutputFormat::Yaml, true).unwrap();
```
*/

// Re-export main types
pub use crate::{
    collection::{build_tree, CollectionGenerator, FolderNode, PostmanCollection},
    config::DocsConfig,
    definition::{endpoints_from_definitions, EndpointDefinition},
    endpoint::{Auth, BodyMode, Endpoint, KeyValue, ResourceRef, ResponseExample},
    error::{ApiDocError, ApiDocResult},
    export::{load_document, render, write_document, OutputFormat},
    merge::{MergeEngine, MergePriority},
    openapi::{build_spec, ensure_valid, validate_document, OpenApiDocument},
    resolver::{ShapeInspector, StructuralResolver, TransformerRegistry},
    synth::{synthesize, FieldConstraints},
};

// Core modules
pub mod config;
pub mod endpoint;
pub mod error;

// Endpoint sources and reconciliation
pub mod definition;
pub mod merge;
pub mod resolver;
pub mod synth;

// Output generators
pub mod collection;
pub mod openapi;

// Export functionality
pub mod export;

mod pattern;

#[cfg(test)]
mod test_utils;
