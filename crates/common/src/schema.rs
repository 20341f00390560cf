//! Schema graph consumed by the generator
//!
//! The graph is an arena: classes, properties, enums and methods live in
//! tables owned by [`SchemaGraph`] and refer to each other through typed
//! indices. Nothing in the generator owns a schema node; route nodes and
//! commands only hold these indices or copies of names.

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Index of a class in [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub usize);

/// Index of a property in [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub usize);

/// Index of an enum in [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnumId(pub usize);

/// Index of a method in [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub usize);

/// Primitive (EDM) types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    String,
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    Guid,
    Date,
    TimeOfDay,
    DateTimeOffset,
    Duration,
    Binary,
    Stream,
    Untyped,
}

impl PrimitiveType {
    /// Qualified EDM name, e.g. `Edm.String`
    pub fn edm_name(self) -> &'static str {
        match self {
            PrimitiveType::String => "Edm.String",
            PrimitiveType::Boolean => "Edm.Boolean",
            PrimitiveType::Byte => "Edm.Byte",
            PrimitiveType::SByte => "Edm.SByte",
            PrimitiveType::Int16 => "Edm.Int16",
            PrimitiveType::Int32 => "Edm.Int32",
            PrimitiveType::Int64 => "Edm.Int64",
            PrimitiveType::Single => "Edm.Single",
            PrimitiveType::Double => "Edm.Double",
            PrimitiveType::Decimal => "Edm.Decimal",
            PrimitiveType::Guid => "Edm.Guid",
            PrimitiveType::Date => "Edm.Date",
            PrimitiveType::TimeOfDay => "Edm.TimeOfDay",
            PrimitiveType::DateTimeOffset => "Edm.DateTimeOffset",
            PrimitiveType::Duration => "Edm.Duration",
            PrimitiveType::Binary => "Edm.Binary",
            PrimitiveType::Stream => "Edm.Stream",
            PrimitiveType::Untyped => "Edm.Untyped",
        }
    }

    /// Whether values of this type are textual
    pub fn is_textual(self) -> bool {
        matches!(self, PrimitiveType::String | PrimitiveType::Guid)
    }
}

/// Resolved type of a property, method parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Enum(EnumId),
    Class(ClassId),
}

/// Structured type flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    /// Addressable type with identity; navigable from routes
    Entity,
    /// Value type without identity
    Complex,
}

/// CRUD capability predicates of a property; omitted predicates default to `true`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
    pub update_link: bool,
    pub delete_link: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            insert: true,
            update: true,
            delete: true,
            update_link: true,
            delete_link: true,
        }
    }
}

/// Owner of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyOwner {
    /// Entity set or singleton of the entry container
    Container,
    Class(ClassId),
}

/// A named, typed member of a class or of the entry container
#[derive(Debug, Clone)]
pub struct SchemaProperty {
    pub name: String,
    pub owner: PropertyOwner,
    pub type_ref: TypeRef,
    pub is_collection: bool,
    pub is_computed: bool,
    pub is_immutable: bool,
    /// Navigation to a resource owned elsewhere (as opposed to containment)
    pub is_reference: bool,
    pub nullable: bool,
    pub capabilities: Capabilities,
    pub description: Option<String>,
}

impl SchemaProperty {
    /// Create a property with default flags; the owner is set when it is added to a graph
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            owner: PropertyOwner::Container,
            type_ref,
            is_collection: false,
            is_computed: false,
            is_immutable: false,
            is_reference: false,
            nullable: true,
            capabilities: Capabilities::default(),
            description: None,
        }
    }

    pub fn supports_insert(&self) -> bool {
        self.capabilities.insert
    }

    pub fn supports_update(&self) -> bool {
        self.capabilities.update
    }

    pub fn supports_delete(&self) -> bool {
        self.capabilities.delete
    }

    pub fn supports_update_link(&self) -> bool {
        self.capabilities.update_link
    }

    pub fn supports_delete_link(&self) -> bool {
        self.capabilities.delete_link
    }
}

/// A structured type
#[derive(Debug, Clone)]
pub struct SchemaClass {
    pub name: String,
    pub kind: ClassKind,
    pub base: Option<ClassId>,
    pub is_abstract: bool,
    /// Name of the key property; inherited when absent
    pub key: Option<String>,
    pub properties: Vec<PropertyId>,
    pub methods: Vec<MethodId>,
    pub derived: Vec<ClassId>,
    pub description: Option<String>,
}

impl SchemaClass {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base: None,
            is_abstract: false,
            key: None,
            properties: Vec::new(),
            methods: Vec::new(),
            derived: Vec::new(),
            description: None,
        }
    }

    pub fn is_entity(&self) -> bool {
        self.kind == ClassKind::Entity
    }
}

/// An enumeration type
#[derive(Debug, Clone)]
pub struct SchemaEnum {
    pub name: String,
    pub members: Vec<String>,
    pub is_flags: bool,
}

/// Whether a method has side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    /// Side-effecting, invoked with POST
    Action,
    /// Side-effect free, invoked with GET
    Function,
}

#[derive(Debug, Clone)]
pub struct MethodParameter {
    pub name: String,
    pub type_ref: TypeRef,
    pub is_collection: bool,
    pub nullable: bool,
}

#[derive(Debug, Clone)]
pub struct MethodReturn {
    pub type_ref: TypeRef,
    pub is_collection: bool,
}

/// An action or function bound to a class
#[derive(Debug, Clone)]
pub struct SchemaMethod {
    pub name: String,
    pub kind: MethodKind,
    pub declaring: ClassId,
    /// Bound to a collection of the declaring type rather than a single instance
    pub bound_to_collection: bool,
    pub parameters: Vec<MethodParameter>,
    pub returns: Option<MethodReturn>,
    pub description: Option<String>,
}

impl SchemaMethod {
    pub fn new(name: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            name: name.into(),
            kind,
            declaring: ClassId(0),
            bound_to_collection: false,
            parameters: Vec::new(),
            returns: None,
            description: None,
        }
    }

    /// Whether the method yields a collection
    pub fn returns_collection(&self) -> bool {
        self.returns.as_ref().is_some_and(|r| r.is_collection)
    }
}

/// Entry container exposing the top-level properties
#[derive(Debug, Clone)]
pub struct EntityContainer {
    pub name: String,
    pub properties: Vec<PropertyId>,
}

/// Fully constructed, read-only schema graph
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    namespace: String,
    container: EntityContainer,
    classes: Vec<SchemaClass>,
    properties: Vec<SchemaProperty>,
    enums: Vec<SchemaEnum>,
    methods: Vec<SchemaMethod>,
}

impl SchemaGraph {
    pub fn new(namespace: impl Into<String>, container_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            container: EntityContainer {
                name: container_name.into(),
                properties: Vec::new(),
            },
            classes: Vec::new(),
            properties: Vec::new(),
            enums: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn container(&self) -> &EntityContainer {
        &self.container
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &SchemaClass)> {
        self.classes.iter().enumerate().map(|(i, c)| (ClassId(i), c))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Add a class. Class names must be unique.
    pub fn add_class(&mut self, class: SchemaClass) -> Result<ClassId> {
        if self.find_class(&class.name).is_some() {
            return Err(GeneratorError::schema(
                &class.name,
                "duplicate class name",
            ));
        }
        self.classes.push(class);
        Ok(ClassId(self.classes.len() - 1))
    }

    /// Add an enum. Enum names must not clash with class names.
    pub fn add_enum(&mut self, schema_enum: SchemaEnum) -> Result<EnumId> {
        if self.find_class(&schema_enum.name).is_some() || self.find_enum(&schema_enum.name).is_some()
        {
            return Err(GeneratorError::schema(
                &schema_enum.name,
                "duplicate type name",
            ));
        }
        self.enums.push(schema_enum);
        Ok(EnumId(self.enums.len() - 1))
    }

    /// Link `derived` under `base`, rejecting inheritance cycles
    pub fn set_base(&mut self, derived: ClassId, base: ClassId) -> Result<()> {
        self.class(derived)?;
        self.class(base)?;

        let mut cursor = Some(base);
        while let Some(current) = cursor {
            if current == derived {
                return Err(GeneratorError::schema(
                    &self.classes[derived.0].name,
                    "base type chain contains a cycle",
                ));
            }
            cursor = self.classes[current.0].base;
        }

        let mut inherited = HashSet::new();
        for class in std::iter::once(base).chain(self.ancestors(base)?) {
            for p in &self.classes[class.0].properties {
                inherited.insert(self.properties[p.0].name.as_str());
            }
        }
        for class in std::iter::once(derived).chain(self.descendants(derived)?) {
            let redeclared = self.classes[class.0]
                .properties
                .iter()
                .find(|p| inherited.contains(self.properties[p.0].name.as_str()));
            if let Some(&p) = redeclared {
                return Err(GeneratorError::schema(
                    self.canonical_name(p)?,
                    format!(
                        "redeclares a property inherited from '{}'",
                        self.classes[base.0].name
                    ),
                ));
            }
        }

        if let Some(previous) = self.classes[derived.0].base {
            self.classes[previous.0].derived.retain(|c| *c != derived);
        }
        self.classes[derived.0].base = Some(base);
        self.classes[base.0].derived.push(derived);
        Ok(())
    }

    /// Add a property declared on `class`
    ///
    /// The name must be free on the class, its bases and its derived classes.
    pub fn add_property(&mut self, class: ClassId, mut property: SchemaProperty) -> Result<PropertyId> {
        let owner = self.class(class)?;
        let mut related = vec![class];
        related.extend(self.ancestors(class)?);
        related.extend(self.descendants(class)?);
        for other in related {
            let clash = self.classes[other.0]
                .properties
                .iter()
                .find(|p| self.properties[p.0].name == property.name);
            if let Some(&existing) = clash {
                let message = if other == class {
                    "duplicate property name".to_string()
                } else {
                    format!("same name as {}", self.canonical_name(existing)?)
                };
                return Err(GeneratorError::schema(
                    format!("{}.{}", owner.name, property.name),
                    message,
                ));
            }
        }

        property.owner = PropertyOwner::Class(class);
        self.properties.push(property);
        let id = PropertyId(self.properties.len() - 1);
        self.classes[class.0].properties.push(id);
        Ok(id)
    }

    /// Add an entity set or singleton to the entry container
    pub fn add_container_property(&mut self, mut property: SchemaProperty) -> Result<PropertyId> {
        let duplicate = self
            .container
            .properties
            .iter()
            .any(|p| self.properties[p.0].name == property.name);
        if duplicate {
            return Err(GeneratorError::schema(
                format!("{}.{}", self.container.name, property.name),
                "duplicate container property name",
            ));
        }

        property.owner = PropertyOwner::Container;
        self.properties.push(property);
        let id = PropertyId(self.properties.len() - 1);
        self.container.properties.push(id);
        Ok(id)
    }

    /// Add a method bound to `class`
    pub fn add_method(&mut self, class: ClassId, mut method: SchemaMethod) -> Result<MethodId> {
        let owner = self.class(class)?;
        let mut seen = HashSet::new();
        for param in &method.parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(GeneratorError::schema(
                    format!("{}.{}", owner.name, method.name),
                    format!("duplicate parameter '{}'", param.name),
                ));
            }
        }

        method.declaring = class;
        self.methods.push(method);
        let id = MethodId(self.methods.len() - 1);
        self.classes[class.0].methods.push(id);
        Ok(id)
    }

    pub fn class(&self, id: ClassId) -> Result<&SchemaClass> {
        self.classes
            .get(id.0)
            .ok_or_else(|| GeneratorError::schema(format!("class #{}", id.0), "dangling class reference"))
    }

    pub fn property(&self, id: PropertyId) -> Result<&SchemaProperty> {
        self.properties.get(id.0).ok_or_else(|| {
            GeneratorError::schema(format!("property #{}", id.0), "dangling property reference")
        })
    }

    pub fn enum_type(&self, id: EnumId) -> Result<&SchemaEnum> {
        self.enums
            .get(id.0)
            .ok_or_else(|| GeneratorError::schema(format!("enum #{}", id.0), "dangling enum reference"))
    }

    pub fn method(&self, id: MethodId) -> Result<&SchemaMethod> {
        self.methods.get(id.0).ok_or_else(|| {
            GeneratorError::schema(format!("method #{}", id.0), "dangling method reference")
        })
    }

    /// Look up a class by simple or namespace-qualified name
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        let simple = self.strip_namespace(name);
        self.classes
            .iter()
            .position(|c| c.name == simple)
            .map(ClassId)
    }

    /// Look up an enum by simple or namespace-qualified name
    pub fn find_enum(&self, name: &str) -> Option<EnumId> {
        let simple = self.strip_namespace(name);
        self.enums.iter().position(|e| e.name == simple).map(EnumId)
    }

    fn strip_namespace<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name)
    }

    /// Namespace-qualified name of a class
    pub fn qualified_name(&self, id: ClassId) -> Result<String> {
        let class = self.class(id)?;
        if self.namespace.is_empty() {
            Ok(class.name.clone())
        } else {
            Ok(format!("{}.{}", self.namespace, class.name))
        }
    }

    /// Canonical identity of a property: `<DeclaringClass>.<name>`
    pub fn canonical_name(&self, id: PropertyId) -> Result<String> {
        let property = self.property(id)?;
        let owner = match property.owner {
            PropertyOwner::Container => self.container.name.as_str(),
            PropertyOwner::Class(class) => self.class(class)?.name.as_str(),
        };
        Ok(format!("{}.{}", owner, property.name))
    }

    /// Human readable name of a resolved type
    pub fn type_name(&self, type_ref: TypeRef) -> Result<String> {
        match type_ref {
            TypeRef::Primitive(p) => Ok(p.edm_name().to_string()),
            TypeRef::Enum(id) => Ok(self.enum_type(id)?.name.clone()),
            TypeRef::Class(id) => Ok(self.class(id)?.name.clone()),
        }
    }

    /// Whether the type is an entity class
    pub fn is_entity_type(&self, type_ref: TypeRef) -> Result<bool> {
        match type_ref {
            TypeRef::Class(id) => Ok(self.class(id)?.is_entity()),
            _ => Ok(false),
        }
    }

    /// Base chain of a class, nearest base first
    pub fn ancestors(&self, id: ClassId) -> Result<Vec<ClassId>> {
        let mut chain = Vec::new();
        let mut cursor = self.class(id)?.base;
        while let Some(current) = cursor {
            if current == id || chain.contains(&current) {
                return Err(GeneratorError::schema(
                    &self.class(id)?.name,
                    "base type chain contains a cycle",
                ));
            }
            chain.push(current);
            cursor = self.class(current)?.base;
        }
        Ok(chain)
    }

    /// Whether `ancestor` is `id` or one of its bases
    pub fn is_same_or_derived_from(&self, id: ClassId, ancestor: ClassId) -> Result<bool> {
        Ok(id == ancestor || self.ancestors(id)?.contains(&ancestor))
    }

    /// Directly derived classes
    pub fn derived_types(&self, id: ClassId) -> Result<&[ClassId]> {
        Ok(&self.class(id)?.derived)
    }

    /// Every class below `id`, breadth first
    pub fn descendants(&self, id: ClassId) -> Result<Vec<ClassId>> {
        let mut found: Vec<ClassId> = Vec::new();
        let mut queue: VecDeque<ClassId> = self.class(id)?.derived.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            if current == id || found.contains(&current) {
                continue;
            }
            found.push(current);
            queue.extend(self.class(current)?.derived.iter().copied());
        }
        Ok(found)
    }

    /// Properties declared on the class and all its bases, base-most first
    pub fn all_properties(&self, id: ClassId) -> Result<Vec<PropertyId>> {
        let mut chain = self.ancestors(id)?;
        chain.reverse();
        chain.push(id);

        let mut properties = Vec::new();
        for class in chain {
            properties.extend(self.class(class)?.properties.iter().copied());
        }
        Ok(properties)
    }

    /// Methods declared on the class and, optionally, inherited from its bases
    pub fn all_methods(&self, id: ClassId, include_inherited: bool) -> Result<Vec<MethodId>> {
        let mut chain = if include_inherited {
            self.ancestors(id)?
        } else {
            Vec::new()
        };
        chain.reverse();
        chain.push(id);

        let mut methods = Vec::new();
        for class in chain {
            methods.extend(self.class(class)?.methods.iter().copied());
        }
        Ok(methods)
    }

    /// Key property of a class, searching the base chain for the key name
    pub fn key_property(&self, id: ClassId) -> Result<Option<PropertyId>> {
        let mut key_name = self.class(id)?.key.clone();
        if key_name.is_none() {
            for ancestor in self.ancestors(id)? {
                if let Some(key) = &self.class(ancestor)?.key {
                    key_name = Some(key.clone());
                    break;
                }
            }
        }

        let Some(key_name) = key_name else {
            return Ok(None);
        };

        for property in self.all_properties(id)? {
            if self.property(property)?.name == key_name {
                return Ok(Some(property));
            }
        }

        Err(GeneratorError::schema(
            &self.class(id)?.name,
            format!("key property '{}' is not declared", key_name),
        ))
    }
}
