//! Mapping from schema types to semantic parameter types

use odata_cmdgen_common::{ParameterType, Result, SchemaGraph, TypeRef};

/// Parameter type of a schema type, wrapped in a collection when needed
pub fn to_parameter_type(
    graph: &SchemaGraph,
    type_ref: TypeRef,
    is_collection: bool,
) -> Result<ParameterType> {
    let element = match type_ref {
        TypeRef::Primitive(primitive) => ParameterType::Primitive(primitive),
        TypeRef::Enum(id) => {
            let name = &graph.enum_type(id)?.name;
            ParameterType::Enum(qualify(graph, name))
        }
        TypeRef::Class(id) => {
            let qualified = graph.qualified_name(id)?;
            if graph.class(id)?.is_entity() {
                ParameterType::Entity(qualified)
            } else {
                ParameterType::Complex(qualified)
            }
        }
    };

    if is_collection {
        Ok(ParameterType::Collection(Box::new(element)))
    } else {
        Ok(element)
    }
}

/// Namespace-qualify a schema name
pub fn qualify(graph: &SchemaGraph, name: &str) -> String {
    if graph.namespace().is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", graph.namespace(), name)
    }
}
