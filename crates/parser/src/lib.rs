//! Schema document loading for odata-cmdgen
//!
//! This crate turns a serialized, already-validated OData schema model
//! (JSON or YAML) into the [`SchemaGraph`] consumed by the generator.
//!
//! ## Document shape
//!
//! ```yaml
//! namespace: library
//! container:
//!   name: LibraryService
//!   properties:
//!     - { name: books, type: Book, collection: true }
//! classes:
//!   - name: Book
//!     key: id
//!     properties:
//!       - { name: id, type: Edm.String, computed: true }
//!       - { name: authors, type: "Collection(Author)", reference: true }
//! ```
//!
//! Type names are resolved against `Edm.*` primitives, enums and classes;
//! anything else is a fatal schema error.

mod converter;
pub mod document;
mod loader;
mod type_mapper;

pub use converter::resolve_type;
pub use document::SchemaDocument;
pub use loader::{DocumentFormat, SchemaLoader};
pub use type_mapper::TypeMapper;

use odata_cmdgen_common::{Result, SchemaGraph};
use std::path::Path;

/// Load and resolve a schema file
///
/// # Arguments
/// * `path` - Path to a `.json`, `.yaml` or `.yml` schema document
///
/// # Returns
/// * `SchemaGraph` - Fully resolved schema graph
pub fn load_schema(path: &Path) -> Result<SchemaGraph> {
    SchemaLoader::from_file(path, None)?.parse()
}
