//! Schema document loader

use crate::document::SchemaDocument;
use odata_cmdgen_common::{GeneratorError, Result, SchemaGraph};
use std::fs;
use std::path::Path;

/// Serialization of a schema document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension; anything but `.yaml`/`.yml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Schema document loader
///
/// Reads a serialized schema model and builds the [`SchemaGraph`] the
/// generator consumes.
pub struct SchemaLoader {
    /// Loaded document
    document: SchemaDocument,
}

impl SchemaLoader {
    /// Load a schema document from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let loader = SchemaLoader::from_file("library.yaml", None)?;
    /// let graph = loader.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P, format: Option<DocumentFormat>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Parse(format!(
                "Failed to read schema file {}: {}",
                path.display(),
                e
            ))
        })?;

        match format.unwrap_or_else(|| DocumentFormat::from_path(path)) {
            DocumentFormat::Json => Self::from_json(&content),
            DocumentFormat::Yaml => Self::from_yaml(&content),
        }
    }

    /// Parse a schema document from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(json)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse schema JSON: {}", e)))?;
        Ok(Self { document })
    }

    /// Parse a schema document from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: SchemaDocument = serde_yaml::from_str(yaml)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse schema YAML: {}", e)))?;
        Ok(Self { document })
    }

    /// Build the schema graph, resolving every type reference
    pub fn parse(&self) -> Result<SchemaGraph> {
        super::converter::convert_document_to_graph(&self.document)
    }

    /// Get reference to the underlying document
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }
}
