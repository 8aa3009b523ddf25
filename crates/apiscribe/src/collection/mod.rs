/*!
Request-collection generation.

Endpoints are first arranged into a [`FolderNode`] tree (grouping, ordering
and recursive folder merging), then rendered into a Postman v2.1 collection.
*/

pub mod generator;
pub mod postman;
pub mod tree;

pub use generator::{status_text, CollectionGenerator};
pub use postman::{PostmanCollection, PostmanItem, POSTMAN_SCHEMA};
pub use tree::{build_tree, folder_path, FolderNode};
