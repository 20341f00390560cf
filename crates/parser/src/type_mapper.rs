//! Type mapping from schema type names to the graph's type references
//!
//! Maps `Edm.*` names to [`PrimitiveType`] and unwraps `Collection(...)`.

use odata_cmdgen_common::PrimitiveType;

/// Maps schema type names to primitive types
pub struct TypeMapper;

impl TypeMapper {
    /// Map an `Edm.*` type name to a primitive type
    ///
    /// # Examples
    /// ```
    /// use odata_cmdgen_parser::TypeMapper;
    /// use odata_cmdgen_common::PrimitiveType;
    ///
    /// assert_eq!(TypeMapper::map_primitive("Edm.String"), Some(PrimitiveType::String));
    /// assert_eq!(TypeMapper::map_primitive("Edm.Int64"), Some(PrimitiveType::Int64));
    /// assert_eq!(TypeMapper::map_primitive("Book"), None);
    /// ```
    pub fn map_primitive(type_name: &str) -> Option<PrimitiveType> {
        let primitive = match type_name {
            "Edm.String" => PrimitiveType::String,
            "Edm.Boolean" => PrimitiveType::Boolean,
            "Edm.Byte" => PrimitiveType::Byte,
            "Edm.SByte" => PrimitiveType::SByte,
            "Edm.Int16" => PrimitiveType::Int16,
            "Edm.Int32" => PrimitiveType::Int32,
            "Edm.Int64" => PrimitiveType::Int64,
            "Edm.Single" => PrimitiveType::Single,
            "Edm.Double" => PrimitiveType::Double,
            "Edm.Decimal" => PrimitiveType::Decimal,
            "Edm.Guid" => PrimitiveType::Guid,
            "Edm.Date" => PrimitiveType::Date,
            "Edm.TimeOfDay" => PrimitiveType::TimeOfDay,
            "Edm.DateTimeOffset" => PrimitiveType::DateTimeOffset,
            "Edm.Duration" => PrimitiveType::Duration,
            "Edm.Binary" => PrimitiveType::Binary,
            "Edm.Stream" => PrimitiveType::Stream,
            "Edm.Untyped" => PrimitiveType::Untyped,
            _ => return None,
        };
        Some(primitive)
    }

    /// Whether the name is in the `Edm` namespace
    pub fn is_edm(type_name: &str) -> bool {
        type_name.starts_with("Edm.")
    }

    /// Split `Collection(T)` into `(T, true)`; other names map to `(name, false)`
    pub fn unwrap_collection(type_name: &str) -> (&str, bool) {
        let trimmed = type_name.trim();
        match trimmed
            .strip_prefix("Collection(")
            .and_then(|s| s.strip_suffix(')'))
        {
            Some(inner) => (inner.trim(), true),
            None => (trimmed, false),
        }
    }
}
