/*!
OpenAPI 3.0 document generation.

Paths are keyed by the normalized URI template, operations carry a tag taken
from the last folder segment, and security schemes are registered once per
family actually used.
*/

pub mod generator;
pub mod naming;
pub mod schema;
pub mod specification;
pub mod validate;

pub use generator::{build_spec, content_type, normalize_path, OpenApiGenerator};
pub use naming::generate_operation_summary;
pub use schema::infer_schema;
pub use specification::{OpenApiDocument, Operation, PathItem, Schema, SecurityScheme};
pub use validate::{ensure_valid, has_errors, validate_document, ValidationLevel, ValidationWarning};
