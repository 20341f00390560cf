//! Converts a schema document into the schema graph
//!
//! Every type name is resolved here. A name that cannot be classified as a
//! class, enum or primitive aborts the conversion: dropping the member would
//! silently produce an incomplete command set.

use crate::document::{ClassDoc, MethodDoc, PropertyDoc, SchemaDocument};
use crate::type_mapper::TypeMapper;
use odata_cmdgen_common::{
    GeneratorError, MethodParameter, MethodReturn, Result, SchemaClass, SchemaEnum, SchemaGraph,
    SchemaMethod, SchemaProperty, TypeRef,
};

/// Convert a schema document to a schema graph
pub fn convert_document_to_graph(doc: &SchemaDocument) -> Result<SchemaGraph> {
    let mut graph = SchemaGraph::new(&doc.namespace, &doc.container.name);

    for enum_doc in &doc.enums {
        graph.add_enum(SchemaEnum {
            name: enum_doc.name.clone(),
            members: enum_doc.members.clone(),
            is_flags: enum_doc.flags,
        })?;
    }

    // Classes first so properties and bases can refer to any of them
    let mut class_ids = Vec::with_capacity(doc.classes.len());
    for class_doc in &doc.classes {
        let mut class = SchemaClass::new(&class_doc.name, class_doc.kind);
        class.is_abstract = class_doc.is_abstract;
        class.key = class_doc.key.clone();
        class.description = class_doc.description.clone();
        class_ids.push(graph.add_class(class)?);
    }

    for (class_doc, &class_id) in doc.classes.iter().zip(&class_ids) {
        if let Some(base_name) = &class_doc.base {
            let base = graph.find_class(base_name).ok_or_else(|| {
                GeneratorError::schema(
                    &class_doc.name,
                    format!("unknown base type '{}'", base_name),
                )
            })?;
            graph.set_base(class_id, base)?;
        }
    }

    for (class_doc, &class_id) in doc.classes.iter().zip(&class_ids) {
        for property_doc in &class_doc.properties {
            let location = format!("{}.{}", class_doc.name, property_doc.name);
            let property = convert_property(&graph, property_doc, &location)?;
            graph.add_property(class_id, property)?;
        }
    }

    for property_doc in &doc.container.properties {
        let location = format!("{}.{}", doc.container.name, property_doc.name);
        let property = convert_property(&graph, property_doc, &location)?;
        graph.add_container_property(property)?;
    }

    for (class_doc, &class_id) in doc.classes.iter().zip(&class_ids) {
        for method_doc in &class_doc.methods {
            let method = convert_method(&graph, class_doc, method_doc)?;
            graph.add_method(class_id, method)?;
        }
    }

    validate_keys(&graph, &doc.classes)?;

    tracing::debug!(
        namespace = %doc.namespace,
        classes = doc.classes.len(),
        enums = doc.enums.len(),
        container_properties = doc.container.properties.len(),
        "converted schema document"
    );

    Ok(graph)
}

/// Resolve a type name into a type reference
///
/// Returns the reference and whether the name was wrapped in `Collection(...)`.
pub fn resolve_type(graph: &SchemaGraph, type_name: &str, location: &str) -> Result<(TypeRef, bool)> {
    let (inner, wrapped) = TypeMapper::unwrap_collection(type_name);

    if TypeMapper::is_edm(inner) {
        return TypeMapper::map_primitive(inner)
            .map(|p| (TypeRef::Primitive(p), wrapped))
            .ok_or_else(|| {
                GeneratorError::schema(location, format!("unsupported primitive type '{}'", inner))
            });
    }

    if let Some(class) = graph.find_class(inner) {
        return Ok((TypeRef::Class(class), wrapped));
    }
    if let Some(enum_id) = graph.find_enum(inner) {
        return Ok((TypeRef::Enum(enum_id), wrapped));
    }

    Err(GeneratorError::schema(
        location,
        format!("type '{}' is not a class, enum or primitive", inner),
    ))
}

fn convert_property(graph: &SchemaGraph, doc: &PropertyDoc, location: &str) -> Result<SchemaProperty> {
    let (type_ref, wrapped) = resolve_type(graph, &doc.type_name, location)?;

    if doc.reference && !graph.is_entity_type(type_ref)? {
        return Err(GeneratorError::schema(
            location,
            "only entity-typed properties can be references",
        ));
    }

    let mut property = SchemaProperty::new(&doc.name, type_ref);
    property.is_collection = doc.collection || wrapped;
    property.is_computed = doc.computed;
    property.is_immutable = doc.immutable;
    property.is_reference = doc.reference;
    property.nullable = doc.nullable;
    property.capabilities = doc.capabilities;
    property.description = doc.description.clone();
    Ok(property)
}

fn convert_method(graph: &SchemaGraph, class_doc: &ClassDoc, doc: &MethodDoc) -> Result<SchemaMethod> {
    let location = format!("{}.{}", class_doc.name, doc.name);

    let mut method = SchemaMethod::new(&doc.name, doc.kind);
    method.bound_to_collection = doc.bound_to_collection;
    method.description = doc.description.clone();

    for param_doc in &doc.parameters {
        let param_location = format!("{}({})", location, param_doc.name);
        let (type_ref, wrapped) = resolve_type(graph, &param_doc.type_name, &param_location)?;
        method.parameters.push(MethodParameter {
            name: param_doc.name.clone(),
            type_ref,
            is_collection: param_doc.collection || wrapped,
            nullable: param_doc.nullable,
        });
    }

    if let Some(return_doc) = &doc.returns {
        let (type_ref, wrapped) = resolve_type(graph, &return_doc.type_name, &location)?;
        method.returns = Some(MethodReturn {
            type_ref,
            is_collection: return_doc.collection || wrapped,
        });
    }

    Ok(method)
}

/// Declared keys must name a property of the class or one of its bases
fn validate_keys(graph: &SchemaGraph, classes: &[ClassDoc]) -> Result<()> {
    for class_doc in classes {
        if class_doc.key.is_some() {
            if let Some(class) = graph.find_class(&class_doc.name) {
                graph.key_property(class)?;
            }
        }
    }
    Ok(())
}
