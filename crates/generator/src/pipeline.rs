//! End-to-end generation: routes, commands, validation and linking

use crate::emit::CommandEmitter;
use crate::routes::{Route, RouteBuilder};
use crate::synthesizer::CommandSynthesizer;
use odata_cmdgen_common::naming::unique_name;
use odata_cmdgen_common::{
    ClassId, Command, GeneratorConfig, GeneratorError, OperationKind, Result, SchemaGraph,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Routes and the commands synthesized for them
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationOutput {
    pub routes: Vec<Route>,
    pub commands: Vec<Command>,
}

/// Runs route building and command synthesis over a schema graph
pub struct CommandGenerator<'a> {
    graph: &'a SchemaGraph,
    config: GeneratorConfig,
}

impl<'a> CommandGenerator<'a> {
    pub fn new(graph: &'a SchemaGraph, config: GeneratorConfig) -> Self {
        Self { graph, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build every route and the commands for each
    pub fn generate(&self) -> Result<GenerationOutput> {
        self.config.validate()?;

        let tree = RouteBuilder::new(self.graph, &self.config).build()?;
        info!(routes = tree.len(), "built routes");

        let synthesizer = CommandSynthesizer::new(self.graph, &self.config);
        let mut output = GenerationOutput::default();
        let mut rendered = HashSet::new();

        for node in tree.iter() {
            let route = Route::from_node(self.graph, &self.config, node)?;
            let route_string = route.to_route_string(true);
            if !rendered.insert(route_string.clone()) {
                return Err(GeneratorError::Generation(format!(
                    "route '{}' was produced twice",
                    route_string
                )));
            }

            let commands = synthesizer
                .synthesize(&route, node.property())
                .map_err(|e| with_route(e, &route_string))?;
            for command in &commands {
                command.validate()?;
            }

            output.commands.extend(commands);
            output.routes.push(route);
        }

        dedupe_command_names(&mut output.commands);
        link_reference_targets(self.graph, &mut output.commands)?;

        info!(commands = output.commands.len(), "synthesized commands");
        Ok(output)
    }

    /// Generate, then hand the commands to an emitter
    pub fn generate_into(
        &self,
        emitter: &dyn CommandEmitter,
        output_dir: &Path,
    ) -> Result<(GenerationOutput, Vec<PathBuf>)> {
        let output = self.generate()?;
        let files = emitter.emit(&output.commands, output_dir)?;
        info!(files = files.len(), "emitted commands");
        Ok((output, files))
    }
}

/// Attach the route being processed to a schema error
fn with_route(error: GeneratorError, route: &str) -> GeneratorError {
    match error {
        GeneratorError::Schema { location, message } => GeneratorError::Schema {
            location: format!("{} (route {})", location, route),
            message,
        },
        other => other,
    }
}

/// Give every command a unique name by suffixing later duplicates
pub fn dedupe_command_names(commands: &mut [Command]) {
    let mut taken: HashSet<String> = commands.iter().map(|c| c.name.to_string()).collect();
    let mut seen = HashSet::new();

    for command in commands.iter_mut() {
        let full = command.name.to_string();
        if seen.insert(full.clone()) {
            continue;
        }

        let verb = command.name.verb;
        let noun = unique_name(&command.name.noun, |n| taken.contains(&format!("{}-{}", verb, n)));
        warn!(command = %full, renamed = %noun, "duplicate command name");
        command.name.noun = noun;
        let renamed = command.name.to_string();
        taken.insert(renamed.clone());
        seen.insert(renamed);
    }
}

/// Point each reference command at the referenceable command that lists
/// candidate targets: the one for the same type or its nearest base type
pub fn link_reference_targets(graph: &SchemaGraph, commands: &mut [Command]) -> Result<()> {
    let mut referenceable: Vec<(ClassId, String)> = Vec::new();
    for command in commands.iter().filter(|c| c.is_referenceable) {
        if let Some(class) = command.resource_type.as_deref().and_then(|t| graph.find_class(t)) {
            referenceable.push((class, command.name.to_string()));
        }
    }

    for command in commands.iter_mut() {
        if !matches!(command.operation, OperationKind::PostRef | OperationKind::DeleteRef) {
            continue;
        }
        let Some(class) = command.resource_type.as_deref().and_then(|t| graph.find_class(t)) else {
            continue;
        };

        let mut chain = vec![class];
        chain.extend(graph.ancestors(class)?);
        let target = chain.iter().find_map(|candidate| {
            referenceable
                .iter()
                .find(|(c, _)| c == candidate)
                .map(|(_, name)| name.clone())
        });

        match &target {
            Some(name) => debug!(command = %command.name, target = %name, "linked reference target"),
            None => debug!(command = %command.name, "no referenceable command for target type"),
        }
        command.reference_target = target;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::MockCommandEmitter;
    use odata_cmdgen_common::{
        ClassKind, CommandName, HttpMethod, PrimitiveType, SchemaClass, SchemaProperty, TypeRef,
        Verb,
    };

    fn command(verb: Verb, noun: &str) -> Command {
        Command::new(
            CommandName::new(verb, noun),
            OperationKind::Get,
            HttpMethod::Get,
            "books",
            "books",
        )
    }

    #[test]
    fn test_dedupe_command_names() {
        let mut commands = vec![
            command(Verb::Get, "Books"),
            command(Verb::Get, "Books"),
            command(Verb::Get, "Books1"),
            command(Verb::Remove, "Books"),
        ];
        dedupe_command_names(&mut commands);

        let names: Vec<String> = commands.iter().map(|c| c.name.to_string()).collect();
        assert_eq!(names, vec!["Get-Books", "Get-Books2", "Get-Books1", "Remove-Books"]);
    }

    fn shelves() -> SchemaGraph {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let mut shelf = SchemaClass::new("Shelf", ClassKind::Entity);
        shelf.key = Some("code".to_string());
        let shelf = graph.add_class(shelf).unwrap();
        graph
            .add_property(shelf, SchemaProperty::new("code", TypeRef::Primitive(PrimitiveType::String)))
            .unwrap();
        let mut shelves = SchemaProperty::new("shelves", TypeRef::Class(shelf));
        shelves.is_collection = true;
        graph.add_container_property(shelves).unwrap();
        graph
    }

    #[test]
    fn test_generate_into_hands_commands_to_emitter() {
        let graph = shelves();
        let mut emitter = MockCommandEmitter::new();
        emitter
            .expect_emit()
            .withf(|commands, _| {
                commands.iter().any(|c| c.name.to_string() == "Get-Shelves")
                    && commands.iter().any(|c| c.name.to_string() == "New-Shelves")
            })
            .times(1)
            .returning(|_, dir| Ok(vec![dir.join("commands.json")]));

        let generator = CommandGenerator::new(&graph, GeneratorConfig::default());
        let (output, files) = generator.generate_into(&emitter, Path::new("out")).unwrap();
        assert_eq!(output.routes.len(), 1);
        assert_eq!(files, vec![PathBuf::from("out/commands.json")]);
    }

    #[test]
    fn test_emitter_failure_propagates() {
        let graph = shelves();
        let mut emitter = MockCommandEmitter::new();
        emitter
            .expect_emit()
            .returning(|_, _| Err(GeneratorError::Generation("disk full".to_string())));

        let generator = CommandGenerator::new(&graph, GeneratorConfig::default());
        assert!(generator.generate_into(&emitter, Path::new("out")).is_err());
    }
}
