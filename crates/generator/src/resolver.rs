//! Parameter resolution for create and update commands
//!
//! Every concrete type of the addressed type hierarchy gets a parameter set
//! of its own. A body property declared on a type belongs to that type's set
//! and to the sets of all its concrete descendants, so properties shared by
//! the whole hierarchy appear in every set while a derived-only property is
//! offered only where it can be sent.

use crate::overloads::{select_default, SetCandidate};
use crate::types::to_parameter_type;
use odata_cmdgen_common::naming::{to_pascal_case, unique_name};
use odata_cmdgen_common::{
    ClassId, Command, GeneratorError, OperationKind, Parameter, ParameterLocation, ParameterSet,
    ParameterType, Result, SchemaGraph, SchemaProperty,
};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Whether a property can not be sent for the given operation
///
/// Computed properties are never sent. Immutable ones may be read back but
/// are rejected on insert and delete.
pub fn is_read_only(property: &SchemaProperty, operation: OperationKind) -> bool {
    match operation {
        OperationKind::Post | OperationKind::Delete => property.is_computed || property.is_immutable,
        OperationKind::Patch => property.is_computed,
        _ => false,
    }
}

/// Adds body parameters and per-type parameter sets to a command
pub struct ParameterResolver<'a> {
    graph: &'a SchemaGraph,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(graph: &'a SchemaGraph) -> Self {
        Self { graph }
    }

    /// Resolve the body parameters of `command` for the hierarchy rooted at `base`
    ///
    /// Running this again on the same command and hierarchy changes nothing.
    pub fn resolve(&self, command: &mut Command, base: ClassId) -> Result<()> {
        let order = self.hierarchy(base)?;

        let mut set_names: HashMap<ClassId, String> = HashMap::new();
        let mut candidates_order = Vec::new();
        for &class in &order {
            let schema_class = self.graph.class(class)?;
            if schema_class.is_abstract {
                continue;
            }
            let qualified = self.graph.qualified_name(class)?;
            let set_name = self.ensure_set(command, &schema_class.name, &qualified)?;
            if class != base {
                self.ensure_switch(command, &set_name, &qualified)?;
            }
            set_names.insert(class, set_name.clone());
            candidates_order.push(set_name);
        }

        if set_names.is_empty() {
            return Err(GeneratorError::invalid_command(
                command.name.to_string(),
                format!(
                    "type '{}' has no concrete type to send",
                    self.graph.class(base)?.name
                ),
            ));
        }

        let key = self.graph.key_property(base)?;
        for &class in &order {
            let sets = self.subtree_sets(class, &set_names)?;
            if sets.is_empty() {
                continue;
            }

            let (declared, discriminator) = if class == base {
                (self.graph.all_properties(class)?, None)
            } else {
                (
                    self.graph.class(class)?.properties.clone(),
                    Some(self.graph.qualified_name(class)?),
                )
            };

            for property_id in declared {
                if Some(property_id) == key {
                    continue;
                }
                let property = self.graph.property(property_id)?;
                if !self.is_eligible(property, command.operation)? {
                    continue;
                }
                self.merge_property(command, property, &sets, discriminator.as_deref())?;
            }
        }

        let candidates = candidates_order.into_iter().map(|name| {
            let mandatory = command
                .parameters_in_set(&name)
                .filter(|p| p.is_mandatory_in(&name))
                .count();
            let total = command.parameters_in_set(&name).count();
            SetCandidate::new(name, mandatory, total)
        });
        let candidates: Vec<SetCandidate> = candidates.collect();
        if let Some(default) = select_default(candidates) {
            command.set_default_parameter_set(&default.name)?;
        }

        debug!(
            command = %command.name,
            sets = command.parameter_sets.len(),
            parameters = command.parameters.len(),
            "resolved body parameters"
        );
        Ok(())
    }

    /// The base and all its descendants, breadth first, each exactly once
    fn hierarchy(&self, base: ClassId) -> Result<Vec<ClassId>> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([base]);

        while let Some(class) = queue.pop_front() {
            if !visited.insert(class) {
                return Err(GeneratorError::schema(
                    &self.graph.class(class)?.name,
                    "type reached twice while walking derived types",
                ));
            }
            order.push(class);
            queue.extend(self.graph.derived_types(class)?.iter().copied());
        }

        Ok(order)
    }

    /// Set names of a class and its concrete descendants
    fn subtree_sets(&self, class: ClassId, set_names: &HashMap<ClassId, String>) -> Result<Vec<String>> {
        let mut sets = Vec::new();
        let mut queue = VecDeque::from([class]);
        while let Some(current) = queue.pop_front() {
            if let Some(name) = set_names.get(&current) {
                sets.push(name.clone());
            }
            queue.extend(self.graph.derived_types(current)?.iter().copied());
        }
        Ok(sets)
    }

    fn is_eligible(&self, property: &SchemaProperty, operation: OperationKind) -> Result<bool> {
        if property.is_collection || self.graph.is_entity_type(property.type_ref)? {
            return Ok(false);
        }
        Ok(!is_read_only(property, operation))
    }

    /// Find or declare the set selecting `qualified`
    fn ensure_set(&self, command: &mut Command, type_name: &str, qualified: &str) -> Result<String> {
        if let Some(existing) = command
            .parameter_sets
            .iter()
            .find(|s| s.derived_type.as_deref() == Some(qualified))
        {
            return Ok(existing.name.clone());
        }

        let name = unique_name(&to_pascal_case(type_name), |n| command.has_parameter_set(n));
        let mut set = ParameterSet::new(&name);
        set.derived_type = Some(qualified.to_string());
        command.add_parameter_set(set)?;
        Ok(name)
    }

    /// Find or declare the switch selecting a derived type
    fn ensure_switch(&self, command: &mut Command, set_name: &str, qualified: &str) -> Result<()> {
        let exists = command.parameters.iter().any(|p| {
            p.location == ParameterLocation::TypeDiscriminator
                && p.derived_type_discriminator.as_deref() == Some(qualified)
        });
        if exists {
            return Ok(());
        }

        let name = unique_name(set_name, |n| command.parameter(n).is_some());
        let mut switch = Parameter::new(name, ParameterType::Switch, ParameterLocation::TypeDiscriminator)
            .mandatory()
            .in_sets([set_name])
            .with_wire_name("@odata.type")
            .with_description(format!("Create the resource as a {}", qualified));
        switch.derived_type_discriminator = Some(qualified.to_string());
        command.add_parameter(switch)
    }

    /// Add a body property, or merge it into an existing same-named one
    fn merge_property(
        &self,
        command: &mut Command,
        property: &SchemaProperty,
        sets: &[String],
        discriminator: Option<&str>,
    ) -> Result<()> {
        let param_type = to_parameter_type(self.graph, property.type_ref, property.is_collection)?;
        let command_name = command.name.to_string();

        let existing = command.parameters.iter_mut().find(|p| {
            p.location == ParameterLocation::Body && p.effective_wire_name() == property.name
        });

        if let Some(parameter) = existing {
            for set in sets {
                parameter.membership.insert(set);
            }
            if parameter.param_type != param_type && parameter.param_type != ParameterType::Object {
                warn!(
                    command = %command_name,
                    parameter = %parameter.name,
                    first = %parameter.param_type,
                    second = %param_type,
                    "same-named properties differ in type; widening to Object"
                );
                parameter.param_type = ParameterType::Object;
            }
            if parameter.derived_type_discriminator.as_deref() != discriminator {
                parameter.derived_type_discriminator = None;
            }
            return Ok(());
        }

        let pascal = to_pascal_case(&property.name);
        let name = if command.parameter(&pascal).is_some() {
            unique_name(&format!("{}Property", pascal), |n| command.parameter(n).is_some())
        } else {
            pascal
        };

        let mut parameter = Parameter::new(name, param_type, ParameterLocation::Body)
            .with_wire_name(&property.name)
            .in_sets(sets.iter().cloned())
            .from_pipeline_by_name();
        parameter.derived_type_discriminator = discriminator.map(str::to_string);
        parameter.description = property.description.clone();
        command.add_parameter(parameter)
    }
}
