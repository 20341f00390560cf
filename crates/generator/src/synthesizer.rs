//! Command synthesis
//!
//! For each route the synthesizer decides which operations apply and builds
//! one [`Command`] per operation: a combined get/search command always, the
//! write commands the property's capability flags allow, reference commands
//! in place of create and delete for non-contained navigation, and one
//! command per action or function bound to the addressed type.

use crate::overloads::{select_default, SetCandidate};
use crate::resolver::ParameterResolver;
use crate::routes::{Route, TerminalId};
use crate::types::{qualify, to_parameter_type};
use odata_cmdgen_common::naming::{singularize, to_pascal_case, unique_name};
use odata_cmdgen_common::{
    ClassId, Command, CommandName, GeneratorConfig, GeneratorError, HttpMethod, MethodKind,
    OperationKind, Parameter, ParameterLocation, ParameterSet, ParameterType, PrimitiveType,
    PropertyId, Result, SchemaGraph, SchemaMethod, SchemaProperty, TypeRef, Verb,
};
use tracing::{debug, warn};

const GET_SET: &str = "Get";
const SEARCH_SET: &str = "Search";
const DELETE_SET: &str = "Delete";
const REFERENCE_SET: &str = "Reference";
const REF_SEGMENT: &str = "$ref";

/// Whether a create command is emitted for a contained property
pub fn allows_create(property: &SchemaProperty) -> bool {
    property.supports_insert() && !property.is_computed
}

/// Whether an update command is emitted
pub fn allows_update(property: &SchemaProperty) -> bool {
    property.supports_update() && !property.is_computed && !property.is_immutable
}

/// Whether a delete command is emitted for a contained property
pub fn allows_delete(property: &SchemaProperty) -> bool {
    property.supports_delete() && !property.is_computed
}

/// Whether a reference can be added to a non-contained navigation property
pub fn allows_reference_create(property: &SchemaProperty) -> bool {
    (property.supports_insert() || property.supports_update_link()) && !property.is_computed
}

/// Whether a reference can be removed from a non-contained navigation property
pub fn allows_reference_delete(property: &SchemaProperty) -> bool {
    (property.supports_delete() || property.supports_delete_link()) && !property.is_computed
}

/// Builds the commands of one route
pub struct CommandSynthesizer<'a> {
    graph: &'a SchemaGraph,
    config: &'a GeneratorConfig,
    resolver: ParameterResolver<'a>,
}

impl<'a> CommandSynthesizer<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a GeneratorConfig) -> Self {
        Self {
            graph,
            config,
            resolver: ParameterResolver::new(graph),
        }
    }

    /// All commands for a route whose terminal segment is `property_id`
    pub fn synthesize(&self, route: &Route, property_id: PropertyId) -> Result<Vec<Command>> {
        let property = self.graph.property(property_id)?;
        let class = match property.type_ref {
            TypeRef::Class(class) => Some(class),
            _ => None,
        };

        let mut commands = vec![self.get_or_search(route, property)?];

        if property.is_reference {
            if allows_reference_create(property) {
                commands.push(self.post_ref(route, property)?);
            }
        } else if let Some(class) = class {
            if allows_create(property) {
                commands.push(self.create(route, property, class)?);
            }
        }

        if let Some(class) = class {
            if allows_update(property) {
                commands.push(self.update(route, property, class)?);
            }
        }

        if property.is_reference {
            if allows_reference_delete(property) {
                commands.push(self.delete_ref(route, property)?);
            }
        } else if allows_delete(property) {
            commands.push(self.delete(route, property)?);
        }

        if let Some(class) = class {
            commands.extend(self.methods(route, property, class)?);
        }

        debug!(
            route = %route.to_route_string(true),
            commands = commands.len(),
            "synthesized route commands"
        );
        Ok(commands)
    }

    fn noun(&self, route: &Route) -> String {
        format!("{}{}", self.config.noun_prefix, route.noun())
    }

    fn terminal_name(route: &Route) -> &str {
        route.terminal().map(|s| s.name.as_str()).unwrap_or_default()
    }

    /// Where the addressed resource lives, for summaries
    fn location(&self, route: &Route) -> String {
        if route.depth() > 1 {
            route.segments[route.depth() - 2].name.clone()
        } else {
            self.graph.container().name.clone()
        }
    }

    fn is_entity_collection(&self, property: &SchemaProperty) -> Result<bool> {
        Ok(property.is_collection && self.graph.is_entity_type(property.type_ref)?)
    }

    fn resource_type(&self, property: &SchemaProperty) -> Result<Option<String>> {
        match property.type_ref {
            TypeRef::Class(class) => Ok(Some(self.graph.qualified_name(class)?)),
            _ => Ok(None),
        }
    }

    fn new_command(
        &self,
        route: &Route,
        property: &SchemaProperty,
        name: CommandName,
        operation: OperationKind,
        http_method: HttpMethod,
        url: String,
    ) -> Result<Command> {
        let mut command = Command::new(name, operation, http_method, url, route.to_route_string(true));
        command.resource_type = self.resource_type(property)?;
        command.description = property.description.clone();
        Ok(command)
    }

    /// Identifier and typecast parameters of the ancestor segments
    fn add_path_parameters(&self, command: &mut Command, route: &Route, terminal_id: bool) -> Result<()> {
        let last = route.depth().saturating_sub(1);
        for (index, segment) in route.segments.iter().enumerate() {
            if let Some(id) = &segment.id {
                if index < last || terminal_id {
                    command.add_parameter(
                        Parameter::new(&id.name, id.key_type.clone(), ParameterLocation::Path)
                            .mandatory()
                            .from_pipeline_by_name()
                            .with_description(format!(
                                "The {} of the {}",
                                id.key_name,
                                singularize(&segment.name)
                            )),
                    )?;
                }
            }
            if let Some(typecast) = &segment.typecast {
                let mut parameter =
                    Parameter::new(&typecast.name, ParameterType::string(), ParameterLocation::Path)
                        .mandatory()
                        .with_description(format!(
                            "Qualified type {} is cast to, e.g. {}",
                            segment.name, typecast.cast_type
                        ));
                parameter.derived_type_discriminator = Some(typecast.cast_type.clone());
                command.add_parameter(parameter)?;
            }
        }
        Ok(())
    }

    fn get_or_search(&self, route: &Route, property: &SchemaProperty) -> Result<Command> {
        let noun = self.noun(route);
        let terminal = Self::terminal_name(route);

        if property.is_collection {
            let entity = self.is_entity_collection(property)?;
            let url = if entity {
                route.to_url_template(TerminalId::Optional)
            } else {
                route.to_url_template(TerminalId::Omit)
            };
            let mut command = self.new_command(
                route,
                property,
                CommandName::new(Verb::Get, noun),
                OperationKind::Search,
                HttpMethod::Get,
                url,
            )?;
            self.add_path_parameters(&mut command, route, false)?;

            if let (true, Some(id)) = (entity, route.terminal_id()) {
                command.add_parameter_set(ParameterSet::new(GET_SET))?;
                command.add_parameter(
                    Parameter::new(&id.name, id.key_type.clone(), ParameterLocation::Path)
                        .mandatory()
                        .in_sets([GET_SET])
                        .from_pipeline_by_name()
                        .with_description(format!("The {} of the {}", id.key_name, singularize(terminal))),
                )?;
                command.id_parameter = Some(id.name.clone());
                command.is_referenceable = route.is_top_level();
            }
            command.add_parameter_set(ParameterSet::new(SEARCH_SET))?;
            command.set_default_parameter_set(SEARCH_SET)?;

            for parameter in projection_options() {
                command.add_parameter(parameter)?;
            }
            for parameter in query_options() {
                command.add_parameter(parameter.in_sets([SEARCH_SET]))?;
            }

            command.summary = format!("Get {} from {}", terminal, self.location(route));
            return Ok(command);
        }

        let mut command = self.new_command(
            route,
            property,
            CommandName::new(Verb::Get, noun),
            OperationKind::Get,
            HttpMethod::Get,
            route.to_url_template(TerminalId::Omit),
        )?;
        self.add_path_parameters(&mut command, route, false)?;
        command.add_parameter_set(ParameterSet::new(GET_SET))?;
        command.set_default_parameter_set(GET_SET)?;
        if matches!(property.type_ref, TypeRef::Class(_)) {
            for parameter in projection_options() {
                command.add_parameter(parameter)?;
            }
        }
        command.summary = format!("Get {} from {}", terminal, self.location(route));
        Ok(command)
    }

    fn create(&self, route: &Route, property: &SchemaProperty, class: ClassId) -> Result<Command> {
        let mut command = self.new_command(
            route,
            property,
            CommandName::new(Verb::New, self.noun(route)),
            OperationKind::Post,
            HttpMethod::Post,
            route.to_url_template(TerminalId::Omit),
        )?;
        self.add_path_parameters(&mut command, route, false)?;
        self.resolver.resolve(&mut command, class)?;
        command.summary = format!(
            "Create new {} in {}",
            singularize(Self::terminal_name(route)),
            self.location(route)
        );
        Ok(command)
    }

    fn update(&self, route: &Route, property: &SchemaProperty, class: ClassId) -> Result<Command> {
        let mut command = self.new_command(
            route,
            property,
            CommandName::new(Verb::Update, self.noun(route)),
            OperationKind::Patch,
            HttpMethod::Patch,
            route.to_url_template(TerminalId::Mandatory),
        )?;
        self.add_path_parameters(&mut command, route, true)?;
        command.id_parameter = route.terminal_id().map(|id| id.name.clone());
        self.resolver.resolve(&mut command, class)?;
        command.summary = format!(
            "Update the {} in {}",
            singularize(Self::terminal_name(route)),
            self.location(route)
        );
        Ok(command)
    }

    fn delete(&self, route: &Route, property: &SchemaProperty) -> Result<Command> {
        let mut command = self.new_command(
            route,
            property,
            CommandName::new(Verb::Remove, self.noun(route)),
            OperationKind::Delete,
            HttpMethod::Delete,
            route.to_url_template(TerminalId::Mandatory),
        )?;
        self.add_path_parameters(&mut command, route, true)?;
        command.id_parameter = route.terminal_id().map(|id| id.name.clone());
        command.add_parameter_set(ParameterSet::new(DELETE_SET))?;
        command.set_default_parameter_set(DELETE_SET)?;
        command.summary = format!(
            "Delete the {} in {}",
            singularize(Self::terminal_name(route)),
            self.location(route)
        );
        Ok(command)
    }

    fn reference_url(&self, location: ParameterLocation, wire_name: &str) -> Parameter {
        Parameter::new(
            &self.config.reference_url_parameter,
            ParameterType::Url,
            location,
        )
        .mandatory()
        .from_pipeline_value()
        .from_pipeline_by_name()
        .with_wire_name(wire_name)
        .with_description("Absolute URL of the resource to reference")
    }

    fn reference_noun(&self, route: &Route) -> String {
        format!("{}Reference", self.noun(route))
    }

    fn post_ref(&self, route: &Route, property: &SchemaProperty) -> Result<Command> {
        let base = route.to_url_template(TerminalId::Omit);
        let (verb, http_method) = if property.is_collection {
            (Verb::New, HttpMethod::Post)
        } else {
            (Verb::Set, HttpMethod::Put)
        };

        let mut command = self.new_command(
            route,
            property,
            CommandName::new(verb, self.reference_noun(route)),
            OperationKind::PostRef,
            http_method,
            format!("{}/{}", base, REF_SEGMENT),
        )?;
        self.add_path_parameters(&mut command, route, false)?;
        command.add_parameter_set(ParameterSet::new(REFERENCE_SET))?;
        command.set_default_parameter_set(REFERENCE_SET)?;
        command.add_parameter(self.reference_url(ParameterLocation::Body, "@odata.id"))?;

        let terminal = Self::terminal_name(route);
        command.summary = if property.is_collection {
            format!("Add a reference to {} of {}", terminal, self.location(route))
        } else {
            format!("Set the reference to {} of {}", terminal, self.location(route))
        };
        Ok(command)
    }

    fn delete_ref(&self, route: &Route, property: &SchemaProperty) -> Result<Command> {
        let base = route.to_url_template(TerminalId::Omit);
        let mut command = self.new_command(
            route,
            property,
            CommandName::new(Verb::Remove, self.reference_noun(route)),
            OperationKind::DeleteRef,
            HttpMethod::Delete,
            format!("{}/{}", base, REF_SEGMENT),
        )?;
        self.add_path_parameters(&mut command, route, false)?;
        command.add_parameter_set(ParameterSet::new(REFERENCE_SET))?;
        command.set_default_parameter_set(REFERENCE_SET)?;
        if property.is_collection {
            command.add_parameter(self.reference_url(ParameterLocation::Query, "$id"))?;
        }

        command.summary = format!(
            "Remove the reference to {} of {}",
            Self::terminal_name(route),
            self.location(route)
        );
        Ok(command)
    }

    /// One command per method name and binding
    fn methods(&self, route: &Route, property: &SchemaProperty, class: ClassId) -> Result<Vec<Command>> {
        let mut groups: Vec<((String, bool), Vec<&SchemaMethod>)> = Vec::new();
        for id in self
            .graph
            .all_methods(class, self.config.include_inherited_methods)?
        {
            let method = self.graph.method(id)?;
            let key = (method.name.clone(), method.bound_to_collection);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, overloads)) => overloads.push(method),
                None => groups.push((key, vec![method])),
            }
        }

        let entity_collection = self.is_entity_collection(property)?;
        let mut commands = Vec::new();
        for ((name, bound_to_collection), overloads) in groups {
            if bound_to_collection && !property.is_collection {
                debug!(method = %name, "collection-bound method skipped on single-valued route");
                continue;
            }
            if !bound_to_collection && property.is_collection && !entity_collection {
                continue;
            }
            commands.push(self.method_command(route, property, &name, bound_to_collection, &overloads)?);
        }
        Ok(commands)
    }

    fn method_command(
        &self,
        route: &Route,
        property: &SchemaProperty,
        name: &str,
        bound_to_collection: bool,
        overloads: &[&SchemaMethod],
    ) -> Result<Command> {
        let kind = overloads[0].kind;
        if overloads.iter().any(|m| m.kind != kind) {
            return Err(GeneratorError::schema(
                format!("{}.{}", self.graph.type_name(property.type_ref)?, name),
                "an action and a function share a name",
            ));
        }

        let item_bound = !bound_to_collection && property.is_collection;
        let terminal = if item_bound {
            TerminalId::Mandatory
        } else {
            TerminalId::Omit
        };
        let url = format!(
            "{}/{}",
            route.to_url_template(terminal),
            qualify(self.graph, name)
        );

        let (operation, http_method, location) = match kind {
            MethodKind::Action => (OperationKind::Action, HttpMethod::Post, ParameterLocation::Body),
            MethodKind::Function => (
                OperationKind::Function,
                HttpMethod::Get,
                ParameterLocation::FunctionArgument,
            ),
        };

        let noun = format!("{}{}", to_pascal_case(name), self.noun(route));
        let mut command = self.new_command(
            route,
            property,
            CommandName::new(Verb::Invoke, noun),
            operation,
            http_method,
            url,
        )?;
        command.resource_type = match &overloads[0].returns {
            Some(returns) => match returns.type_ref {
                TypeRef::Class(class) => Some(self.graph.qualified_name(class)?),
                _ => None,
            },
            None => None,
        };
        command.description = overloads[0].description.clone();
        self.add_path_parameters(&mut command, route, item_bound)?;
        if item_bound {
            command.id_parameter = route.terminal_id().map(|id| id.name.clone());
        }

        let mut candidates = Vec::with_capacity(overloads.len());
        for overload in overloads {
            let set_name = if overloads.len() == 1 {
                to_pascal_case(name)
            } else {
                let stem: String = std::iter::once(to_pascal_case(name))
                    .chain(overload.parameters.iter().map(|p| to_pascal_case(&p.name)))
                    .collect();
                unique_name(&stem, |n| command.has_parameter_set(n))
            };
            command.add_parameter_set(ParameterSet::new(&set_name))?;

            let mut mandatory = 0;
            for method_parameter in &overload.parameters {
                let is_mandatory = !method_parameter.nullable;
                if is_mandatory {
                    mandatory += 1;
                }
                let param_type =
                    to_parameter_type(self.graph, method_parameter.type_ref, method_parameter.is_collection)?;
                self.merge_argument(
                    &mut command,
                    &method_parameter.name,
                    param_type,
                    location,
                    is_mandatory,
                    &set_name,
                )?;
            }
            candidates.push(SetCandidate::new(set_name, mandatory, overload.parameters.len()));
        }

        if let Some(default) = select_default(candidates) {
            command.set_default_parameter_set(&default.name)?;
        }

        if kind == MethodKind::Function && overloads[0].returns_collection() {
            for parameter in query_options() {
                if command.parameter(&parameter.name).is_some() {
                    debug!(
                        command = %command.name,
                        parameter = %parameter.name,
                        "query option shadowed by a function argument"
                    );
                    continue;
                }
                command.add_parameter(parameter)?;
            }
        }

        command.summary = match kind {
            MethodKind::Action => format!("Invoke action {}", name),
            MethodKind::Function => format!("Invoke function {}", name),
        };
        Ok(command)
    }

    /// Add a method argument to one overload's set, merging same-named arguments
    fn merge_argument(
        &self,
        command: &mut Command,
        wire_name: &str,
        param_type: ParameterType,
        location: ParameterLocation,
        is_mandatory: bool,
        set_name: &str,
    ) -> Result<()> {
        let command_name = command.name.to_string();
        let existing = command
            .parameters
            .iter_mut()
            .find(|p| p.location == location && p.effective_wire_name() == wire_name);

        if let Some(parameter) = existing {
            parameter.join_set(set_name, is_mandatory);
            if parameter.param_type != param_type && parameter.param_type != ParameterType::Object {
                warn!(
                    command = %command_name,
                    parameter = %parameter.name,
                    "overloads disagree on argument type; widening to Object"
                );
                parameter.param_type = ParameterType::Object;
            }
            return Ok(());
        }

        let pascal = to_pascal_case(wire_name);
        let name = if command.parameter(&pascal).is_some() {
            unique_name(&format!("{}Parameter", pascal), |n| command.parameter(n).is_some())
        } else {
            pascal
        };

        let mut parameter = Parameter::new(name, param_type, location)
            .with_wire_name(wire_name)
            .in_sets([set_name]);
        if is_mandatory {
            parameter = parameter.mandatory();
        }
        command.add_parameter(parameter)
    }
}

/// `$select` and `$expand`, usable in every set
fn projection_options() -> Vec<Parameter> {
    let strings = || ParameterType::Collection(Box::new(ParameterType::string()));
    vec![
        Parameter::new("Select", strings(), ParameterLocation::Query)
            .with_wire_name("$select")
            .with_description("Select properties to be returned"),
        Parameter::new("Expand", strings(), ParameterLocation::Query)
            .with_wire_name("$expand")
            .with_description("Expand related entities"),
    ]
}

/// Collection query options
fn query_options() -> Vec<Parameter> {
    let int32 = || ParameterType::Primitive(PrimitiveType::Int32);
    vec![
        Parameter::new("Filter", ParameterType::string(), ParameterLocation::Query)
            .with_wire_name("$filter")
            .with_description("Filter items by property values"),
        Parameter::new("Search", ParameterType::string(), ParameterLocation::Query)
            .with_wire_name("$search")
            .with_description("Search items by search phrases"),
        Parameter::new(
            "OrderBy",
            ParameterType::Collection(Box::new(ParameterType::string())),
            ParameterLocation::Query,
        )
        .with_wire_name("$orderby")
        .with_description("Order items by property values"),
        Parameter::new("Skip", int32(), ParameterLocation::Query)
            .with_wire_name("$skip")
            .with_description("Skip the first n items"),
        Parameter::new("Top", int32(), ParameterLocation::Query)
            .with_wire_name("$top")
            .with_description("Show only the first n items"),
    ]
}
