//! Command model handed to the emission backend
//!
//! A [`Command`] is one callable operation on one route. Its parameters are
//! stored once each; a parameter records which parameter sets it belongs to
//! instead of being copied into every set.

use crate::schema::PrimitiveType;
use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Kind of operation a command performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Get,
    Search,
    Post,
    Patch,
    Delete,
    PostRef,
    DeleteRef,
    Action,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Patch => write!(f, "PATCH"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Verb half of a command name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    Get,
    New,
    Update,
    Remove,
    Set,
    Invoke,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Verb::Get => "Get",
            Verb::New => "New",
            Verb::Update => "Update",
            Verb::Remove => "Remove",
            Verb::Set => "Set",
            Verb::Invoke => "Invoke",
        };
        f.write_str(verb)
    }
}

/// Verb-noun command name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandName {
    pub verb: Verb,
    pub noun: String,
}

impl CommandName {
    pub fn new(verb: Verb, noun: impl Into<String>) -> Self {
        Self {
            verb,
            noun: noun.into(),
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.verb, self.noun)
    }
}

/// Semantic parameter type, independent of any target language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    Primitive(PrimitiveType),
    Enum(String),
    Complex(String),
    Entity(String),
    Collection(Box<ParameterType>),
    /// Presence-only flag
    Switch,
    /// Absolute URL of another resource
    Url,
    /// Values of differing shapes merged into one parameter
    Object,
}

impl ParameterType {
    pub fn string() -> Self {
        ParameterType::Primitive(PrimitiveType::String)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, ParameterType::Primitive(p) if p.is_textual()) || *self == ParameterType::Url
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::Primitive(p) => f.write_str(p.edm_name()),
            ParameterType::Enum(name) | ParameterType::Complex(name) | ParameterType::Entity(name) => {
                f.write_str(name)
            }
            ParameterType::Collection(inner) => write!(f, "Collection({})", inner),
            ParameterType::Switch => f.write_str("Switch"),
            ParameterType::Url => f.write_str("Url"),
            ParameterType::Object => f.write_str("Object"),
        }
    }
}

/// Where a parameter's value travels in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterLocation {
    /// Substituted into a URL placeholder
    Path,
    /// OData query option
    Query,
    /// Field of the request body
    Body,
    /// Inline function argument, `fn(name=value)`
    FunctionArgument,
    /// Selects a derived type; serialized as the body's type annotation
    TypeDiscriminator,
}

/// Parameter sets a parameter belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetMembership {
    All,
    Only(BTreeSet<String>),
}

impl SetMembership {
    pub fn only<I, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SetMembership::Only(sets.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, set: &str) -> bool {
        match self {
            SetMembership::All => true,
            SetMembership::Only(sets) => sets.contains(set),
        }
    }

    /// Add a set; returns whether the membership changed
    pub fn insert(&mut self, set: &str) -> bool {
        match self {
            SetMembership::All => false,
            SetMembership::Only(sets) => sets.insert(set.to_string()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SetMembership::All)
    }
}

/// One parameter of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Name used on the wire when it differs from `name`
    pub wire_name: Option<String>,
    pub param_type: ParameterType,
    pub location: ParameterLocation,
    /// Mandatory in every set it belongs to
    pub mandatory: bool,
    /// Sets it is mandatory in when that differs between its sets
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub mandatory_in: BTreeSet<String>,
    pub from_pipeline_value: bool,
    pub from_pipeline_by_name: bool,
    pub validate_not_null: bool,
    pub validate_not_null_or_empty: bool,
    /// Qualified name of the only derived type this parameter applies to
    pub derived_type_discriminator: Option<String>,
    pub membership: SetMembership,
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: ParameterType, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            wire_name: None,
            param_type,
            location,
            mandatory: false,
            mandatory_in: BTreeSet::new(),
            from_pipeline_value: false,
            from_pipeline_by_name: false,
            validate_not_null: false,
            validate_not_null_or_empty: false,
            derived_type_discriminator: None,
            membership: SetMembership::All,
            description: None,
        }
    }

    /// Mark mandatory, with the matching null validation
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        if self.param_type.is_textual() {
            self.validate_not_null_or_empty = true;
        } else if self.param_type != ParameterType::Switch {
            self.validate_not_null = true;
        }
        self
    }

    pub fn in_sets<I, S>(mut self, sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.membership = SetMembership::only(sets);
        self
    }

    pub fn from_pipeline_by_name(mut self) -> Self {
        self.from_pipeline_by_name = true;
        self
    }

    pub fn from_pipeline_value(mut self) -> Self {
        self.from_pipeline_value = true;
        self
    }

    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        let wire_name = wire_name.into();
        if wire_name != self.name {
            self.wire_name = Some(wire_name);
        }
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Name the value is sent under
    pub fn effective_wire_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_mandatory_in(&self, set: &str) -> bool {
        self.mandatory || self.mandatory_in.contains(set)
    }

    /// Add the parameter to another set, mandatory there or not
    ///
    /// Mandatory-ness stays per set: joining a set as optional does not make
    /// the parameter optional in the sets it is already mandatory in.
    pub fn join_set(&mut self, set: &str, mandatory: bool) {
        if self.mandatory && !mandatory {
            if let SetMembership::Only(sets) = &self.membership {
                self.mandatory_in = sets.clone();
            }
            self.mandatory = false;
        } else if mandatory && !self.mandatory {
            self.mandatory_in.insert(set.to_string());
        }
        self.membership.insert(set);
    }
}

/// A named mode of invoking a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub name: String,
    pub is_default: bool,
    /// Qualified derived type selected by this set, if any
    pub derived_type: Option<String>,
}

impl ParameterSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_default: false,
            derived_type: None,
        }
    }
}

/// One generated operation on one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: CommandName,
    pub operation: OperationKind,
    pub http_method: HttpMethod,
    /// URL relative to the service root with `{placeholder}` tokens
    pub call_url_template: String,
    /// Rendered route the command was built from
    pub route: String,
    /// Qualified type of the addressed resource
    pub resource_type: Option<String>,
    pub parameter_sets: Vec<ParameterSet>,
    pub parameters: Vec<Parameter>,
    /// Parameter carrying the addressed entity's own identifier
    pub id_parameter: Option<String>,
    /// Whether reference commands may point at resources addressed by this command
    pub is_referenceable: bool,
    /// Name of the referenceable command whose resources this reference command links to
    pub reference_target: Option<String>,
    pub summary: String,
    pub description: Option<String>,
}

impl Command {
    pub fn new(
        name: CommandName,
        operation: OperationKind,
        http_method: HttpMethod,
        call_url_template: impl Into<String>,
        route: impl Into<String>,
    ) -> Self {
        Self {
            name,
            operation,
            http_method,
            call_url_template: call_url_template.into(),
            route: route.into(),
            resource_type: None,
            parameter_sets: Vec::new(),
            parameters: Vec::new(),
            id_parameter: None,
            is_referenceable: false,
            reference_target: None,
            summary: String::new(),
            description: None,
        }
    }

    /// Declare a parameter set; names must be unique
    pub fn add_parameter_set(&mut self, set: ParameterSet) -> Result<()> {
        if self.has_parameter_set(&set.name) {
            return Err(GeneratorError::invalid_command(
                self.name.to_string(),
                format!("duplicate parameter set '{}'", set.name),
            ));
        }
        self.parameter_sets.push(set);
        Ok(())
    }

    pub fn has_parameter_set(&self, name: &str) -> bool {
        self.parameter_sets.iter().any(|s| s.name == name)
    }

    pub fn default_parameter_set(&self) -> Option<&ParameterSet> {
        self.parameter_sets.iter().find(|s| s.is_default)
    }

    /// Make `name` the one default set
    pub fn set_default_parameter_set(&mut self, name: &str) -> Result<()> {
        if !self.has_parameter_set(name) {
            return Err(GeneratorError::invalid_command(
                self.name.to_string(),
                format!("unknown default parameter set '{}'", name),
            ));
        }
        for set in &mut self.parameter_sets {
            set.is_default = set.name == name;
        }
        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Add a parameter; names must be unique
    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<()> {
        if self.parameter(&parameter.name).is_some() {
            return Err(GeneratorError::invalid_command(
                self.name.to_string(),
                format!("duplicate parameter '{}'", parameter.name),
            ));
        }
        self.parameters.push(parameter);
        Ok(())
    }

    /// Parameters usable in the named set
    pub fn parameters_in_set<'a>(&'a self, set: &'a str) -> impl Iterator<Item = &'a Parameter> + 'a {
        self.parameters
            .iter()
            .filter(move |p| p.membership.contains(set))
    }

    /// Check the command-model invariants
    pub fn validate(&self) -> Result<()> {
        let name = self.name.to_string();

        if self.parameter_sets.is_empty() {
            return Err(GeneratorError::invalid_command(name, "no parameter sets"));
        }

        let defaults = self.parameter_sets.iter().filter(|s| s.is_default).count();
        if defaults != 1 {
            return Err(GeneratorError::invalid_command(
                name,
                format!("expected exactly one default parameter set, found {}", defaults),
            ));
        }

        let mut set_names = HashSet::new();
        for set in &self.parameter_sets {
            if !set_names.insert(set.name.as_str()) {
                return Err(GeneratorError::invalid_command(
                    name,
                    format!("duplicate parameter set '{}'", set.name),
                ));
            }
        }

        let mut parameter_names = HashSet::new();
        for parameter in &self.parameters {
            if !parameter_names.insert(parameter.name.as_str()) {
                return Err(GeneratorError::invalid_command(
                    name,
                    format!("duplicate parameter '{}'", parameter.name),
                ));
            }
            if let SetMembership::Only(sets) = &parameter.membership {
                if sets.is_empty() {
                    return Err(GeneratorError::invalid_command(
                        name,
                        format!("parameter '{}' belongs to no parameter set", parameter.name),
                    ));
                }
                if let Some(unknown) = sets.iter().find(|s| !set_names.contains(s.as_str())) {
                    return Err(GeneratorError::invalid_command(
                        name,
                        format!(
                            "parameter '{}' references unknown parameter set '{}'",
                            parameter.name, unknown
                        ),
                    ));
                }
            }
            if let Some(stray) = parameter
                .mandatory_in
                .iter()
                .find(|s| !parameter.membership.contains(s.as_str()))
            {
                return Err(GeneratorError::invalid_command(
                    name,
                    format!(
                        "parameter '{}' is mandatory in '{}' but not a member of it",
                        parameter.name, stray
                    ),
                ));
            }
        }

        if let Some(id) = &self.id_parameter {
            if !parameter_names.contains(id.as_str()) {
                return Err(GeneratorError::invalid_command(
                    name,
                    format!("id parameter '{}' is not declared", id),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        let mut command = Command::new(
            CommandName::new(Verb::Get, "Books"),
            OperationKind::Search,
            HttpMethod::Get,
            "books/{BookId ?? \"\"}",
            "books/{BookId}",
        );
        command.add_parameter_set(ParameterSet::new("Get")).unwrap();
        command.add_parameter_set(ParameterSet::new("Search")).unwrap();
        command.set_default_parameter_set("Search").unwrap();
        command
    }

    #[test]
    fn test_command_name_display() {
        assert_eq!(CommandName::new(Verb::Remove, "Books").to_string(), "Remove-Books");
    }

    #[test]
    fn test_valid_command() {
        let mut command = command();
        command
            .add_parameter(
                Parameter::new("BookId", ParameterType::string(), ParameterLocation::Path)
                    .mandatory()
                    .in_sets(["Get"]),
            )
            .unwrap();
        command.id_parameter = Some("BookId".to_string());

        command.validate().unwrap();
        assert_eq!(command.default_parameter_set().unwrap().name, "Search");
        assert_eq!(command.parameters_in_set("Get").count(), 1);
        assert_eq!(command.parameters_in_set("Search").count(), 0);
    }

    #[test]
    fn test_mandatory_string_validates_not_null_or_empty() {
        let p = Parameter::new("BookId", ParameterType::string(), ParameterLocation::Path).mandatory();
        assert!(p.validate_not_null_or_empty);
        assert!(!p.validate_not_null);

        let s = Parameter::new("AudioBook", ParameterType::Switch, ParameterLocation::TypeDiscriminator)
            .mandatory();
        assert!(!s.validate_not_null);
    }

    #[test]
    fn test_mandatory_stays_per_set() {
        let mut x = Parameter::new("X", ParameterType::string(), ParameterLocation::FunctionArgument)
            .mandatory()
            .in_sets(["FindX"]);
        x.join_set("FindXY", false);
        assert!(x.is_mandatory_in("FindX"));
        assert!(!x.is_mandatory_in("FindXY"));
        assert!(!x.mandatory);

        let mut y = Parameter::new("Y", ParameterType::string(), ParameterLocation::FunctionArgument)
            .in_sets(["FindXY"]);
        y.join_set("FindY", true);
        assert!(!y.is_mandatory_in("FindXY"));
        assert!(y.is_mandatory_in("FindY"));

        let mut z = Parameter::new("Z", ParameterType::string(), ParameterLocation::FunctionArgument)
            .mandatory()
            .in_sets(["FindZ"]);
        z.join_set("FindZW", true);
        assert!(z.mandatory);
        assert!(z.mandatory_in.is_empty());
    }

    #[test]
    fn test_validate_rejects_stray_mandatory_set() {
        let mut command = command();
        let mut parameter = Parameter::new("Top", ParameterType::string(), ParameterLocation::Query)
            .in_sets(["Search"]);
        parameter.mandatory_in.insert("Get".to_string());
        command.parameters.push(parameter);
        assert!(matches!(
            command.validate(),
            Err(GeneratorError::InvalidCommand { .. })
        ));
    }

    #[test]
    fn test_duplicate_parameter_set_rejected() {
        let mut command = command();
        assert!(command.add_parameter_set(ParameterSet::new("Get")).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_membership() {
        let mut command = command();
        command.parameters.push(
            Parameter::new("Filter", ParameterType::string(), ParameterLocation::Query)
                .in_sets(["List"]),
        );
        assert!(matches!(
            command.validate(),
            Err(GeneratorError::InvalidCommand { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_default() {
        let mut command = command();
        for set in &mut command.parameter_sets {
            set.is_default = false;
        }
        assert!(command.validate().is_err());
    }

    #[test]
    fn test_membership_insert() {
        let mut membership = SetMembership::only(["Book"]);
        assert!(membership.insert("AudioBook"));
        assert!(!membership.insert("AudioBook"));
        assert!(membership.contains("AudioBook"));

        let mut all = SetMembership::All;
        assert!(!all.insert("Book"));
        assert!(all.contains("anything"));
    }
}
