//! Emission backends
//!
//! The generator core hands finished commands to a [`CommandEmitter`]; it
//! knows nothing about the target shell or file layout.

use crate::templates;
use odata_cmdgen_common::naming::to_snake_case;
use odata_cmdgen_common::{Command, GeneratorError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::debug;

/// Writes finished commands somewhere under an output directory
#[cfg_attr(test, mockall::automock)]
pub trait CommandEmitter {
    /// Emit the commands and return the files written
    fn emit(&self, commands: &[Command], output_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Runs each emitter in turn
impl CommandEmitter for Vec<Box<dyn CommandEmitter>> {
    fn emit(&self, commands: &[Command], output_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for emitter in self {
            written.extend(emitter.emit(commands, output_dir)?);
        }
        Ok(written)
    }
}

fn create_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        GeneratorError::Generation(format!("Failed to create output directory {:?}: {}", dir, e))
    })
}

/// Writes the command model as `commands.json`
#[derive(Debug, Clone, Default)]
pub struct JsonEmitter;

impl JsonEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl CommandEmitter for JsonEmitter {
    fn emit(&self, commands: &[Command], output_dir: &Path) -> Result<Vec<PathBuf>> {
        create_output_dir(output_dir)?;

        let path = output_dir.join("commands.json");
        let json = serde_json::to_string_pretty(commands)?;
        fs::write(&path, json)?;

        debug!(path = ?path, commands = commands.len(), "wrote command model");
        Ok(vec![path])
    }
}

#[derive(Debug, Serialize)]
struct ParameterView {
    name: String,
    wire_name: String,
    type_name: String,
    location: String,
    mandatory: bool,
    pipeline: bool,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SetView {
    name: String,
    is_default: bool,
    derived_type: Option<String>,
    parameters: Vec<ParameterView>,
}

#[derive(Debug, Serialize)]
struct CommandView {
    name: String,
    file_name: String,
    operation: String,
    http_method: String,
    url: String,
    route: String,
    resource_type: Option<String>,
    summary: String,
    description: Option<String>,
    reference_target: Option<String>,
    sets: Vec<SetView>,
}

impl CommandView {
    fn new(command: &Command) -> Self {
        let name = command.name.to_string();
        let sets = command
            .parameter_sets
            .iter()
            .map(|set| SetView {
                name: set.name.clone(),
                is_default: set.is_default,
                derived_type: set.derived_type.clone(),
                parameters: command
                    .parameters_in_set(&set.name)
                    .map(|p| ParameterView {
                        name: p.name.clone(),
                        wire_name: p.effective_wire_name().to_string(),
                        type_name: p.param_type.to_string(),
                        location: format!("{:?}", p.location),
                        mandatory: p.is_mandatory_in(&set.name),
                        pipeline: p.from_pipeline_value || p.from_pipeline_by_name,
                        description: p.description.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            file_name: format!("{}.md", to_snake_case(&name)),
            name,
            operation: format!("{:?}", command.operation),
            http_method: command.http_method.to_string(),
            url: command.call_url_template.clone(),
            route: command.route.clone(),
            resource_type: command.resource_type.clone(),
            summary: command.summary.clone(),
            description: command.description.clone(),
            reference_target: command.reference_target.clone(),
            sets,
        }
    }
}

/// Renders one markdown page per command plus an index
pub struct TemplateEmitter {
    tera: Tera,
}

impl TemplateEmitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tera: templates::load_templates()?,
        })
    }

    fn render(&self, template: &str, context: &Context) -> Result<String> {
        self.tera
            .render(template, context)
            .map_err(|e| GeneratorError::Generation(format!("Template error: {:?}", e)))
    }
}

impl CommandEmitter for TemplateEmitter {
    fn emit(&self, commands: &[Command], output_dir: &Path) -> Result<Vec<PathBuf>> {
        let commands_dir = output_dir.join("commands");
        create_output_dir(&commands_dir)?;

        let views: Vec<CommandView> = commands.iter().map(CommandView::new).collect();
        let mut written = Vec::with_capacity(views.len() + 1);

        for view in &views {
            let mut context = Context::new();
            context.insert("command", view);
            let rendered = self.render("command.md", &context)?;

            let path = commands_dir.join(&view.file_name);
            fs::write(&path, rendered).map_err(|e| {
                GeneratorError::Generation(format!("Failed to write {}: {}", view.file_name, e))
            })?;
            written.push(path);
        }

        let mut context = Context::new();
        context.insert("commands", &views);
        let rendered = self.render("README.md", &context)?;
        let index = output_dir.join("README.md");
        fs::write(&index, rendered)
            .map_err(|e| GeneratorError::Generation(format!("Failed to write README.md: {}", e)))?;
        written.push(index);

        debug!(files = written.len(), "rendered command documentation");
        Ok(written)
    }
}
