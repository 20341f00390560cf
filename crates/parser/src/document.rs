//! Serialized schema document
//!
//! A document is the already-validated schema model written out as JSON or
//! YAML. Type references are still names here; the converter resolves them.

use odata_cmdgen_common::{Capabilities, ClassKind, MethodKind};
use serde::{Deserialize, Serialize};

/// Document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Schema namespace (e.g., "library")
    pub namespace: String,

    /// Entry container
    pub container: ContainerDoc,

    /// Structured types
    #[serde(default)]
    pub classes: Vec<ClassDoc>,

    /// Enumeration types
    #[serde(default)]
    pub enums: Vec<EnumDoc>,
}

/// Entry container with its entity sets and singletons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDoc {
    pub name: String,

    #[serde(default)]
    pub properties: Vec<PropertyDoc>,
}

/// Structured type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDoc {
    pub name: String,

    #[serde(default = "default_kind")]
    pub kind: ClassKind,

    /// Base type name
    #[serde(default)]
    pub base: Option<String>,

    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,

    /// Key property name
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub properties: Vec<PropertyDoc>,

    #[serde(default)]
    pub methods: Vec<MethodDoc>,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_kind() -> ClassKind {
    ClassKind::Entity
}

fn default_true() -> bool {
    true
}

/// Property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDoc {
    pub name: String,

    /// Type name: `Edm.*`, a class or enum name, or `Collection(...)` of one
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub collection: bool,

    #[serde(default)]
    pub computed: bool,

    #[serde(default)]
    pub immutable: bool,

    /// Navigation to a resource owned elsewhere
    #[serde(default)]
    pub reference: bool,

    #[serde(default = "default_true")]
    pub nullable: bool,

    #[serde(default)]
    pub capabilities: Capabilities,

    #[serde(default)]
    pub description: Option<String>,
}

/// Bound action or function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDoc {
    pub name: String,

    pub kind: MethodKind,

    #[serde(default)]
    pub bound_to_collection: bool,

    #[serde(default)]
    pub parameters: Vec<MethodParameterDoc>,

    #[serde(default)]
    pub returns: Option<ReturnDoc>,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodParameterDoc {
    pub name: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub collection: bool,

    #[serde(default = "default_true")]
    pub nullable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnDoc {
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub collection: bool,
}

/// Enumeration definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDoc {
    pub name: String,

    #[serde(default)]
    pub members: Vec<String>,

    #[serde(default)]
    pub flags: bool,
}
