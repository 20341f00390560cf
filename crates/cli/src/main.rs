//! odata-cmdgen CLI
//!
//! Command-line interface for generating command models from OData schemas.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use odata_cmdgen_common::{Command, GeneratorConfig, SchemaGraph};
use odata_cmdgen_generator::{
    write_route_list, CommandEmitter, CommandGenerator, GenerationOutput, JsonEmitter, Route,
    TemplateEmitter,
};
use odata_cmdgen_parser::{DocumentFormat, SchemaLoader};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "odata-cmdgen")]
#[command(version, about = "Generate command models from OData service schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Generator configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every route of a schema
    #[command(after_help = "EXAMPLES:\n  \
        odata-cmdgen routes --schema schemas/library.yaml\n\n  \
        # Only routes two levels deep\n  \
        odata-cmdgen routes --schema schemas/library.yaml --config shallow.yaml")]
    Routes {
        /// Path to the schema document
        #[arg(short, long)]
        schema: PathBuf,

        /// Schema format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<SchemaFormat>,
    },

    /// List the commands synthesized for a schema
    #[command(after_help = "EXAMPLES:\n  \
        odata-cmdgen commands --schema schemas/library.yaml\n\n  \
        # Commands of one route, with parameter sets\n  \
        odata-cmdgen commands --schema schemas/library.yaml --route books --verbose")]
    Commands {
        /// Path to the schema document
        #[arg(short, long)]
        schema: PathBuf,

        /// Schema format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<SchemaFormat>,

        /// Only show commands whose route starts with this file path
        #[arg(short, long)]
        route: Option<String>,
    },

    /// Generate the command model into a directory
    #[command(after_help = "EXAMPLES:\n  \
        odata-cmdgen generate \\\n    \
        --schema schemas/library.yaml \\\n    \
        --output ./out\n\n  \
        # Markdown reference pages only\n  \
        odata-cmdgen generate --schema schemas/library.yaml --emit docs --output ./docs")]
    Generate {
        /// Path to the schema document
        #[arg(short, long)]
        schema: PathBuf,

        /// Schema format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<SchemaFormat>,

        /// What to write
        #[arg(short, long, value_enum, default_value_t = EmitKind::All)]
        emit: EmitKind,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaFormat {
    Json,
    Yaml,
}

impl From<SchemaFormat> for DocumentFormat {
    fn from(format: SchemaFormat) -> Self {
        match format {
            SchemaFormat::Json => DocumentFormat::Json,
            SchemaFormat::Yaml => DocumentFormat::Yaml,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmitKind {
    /// commands.json
    Json,
    /// Markdown page per command plus README.md
    Docs,
    /// Everything, plus routes.txt
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Routes { schema, format } => {
            routes_command(&schema, format, config)?;
        }
        Commands::Commands {
            schema,
            format,
            route,
        } => {
            commands_command(&schema, format, config, route.as_deref(), cli.verbose)?;
        }
        Commands::Generate {
            schema,
            format,
            emit,
            output,
        } => {
            generate_command(&schema, format, config, emit, &output)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    match path {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(GeneratorConfig::default()),
    }
}

fn load_graph(schema: &Path, format: Option<SchemaFormat>) -> Result<SchemaGraph> {
    println!("{} Loading schema: {}", "→".cyan(), schema.display());

    let loader = SchemaLoader::from_file(schema, format.map(Into::into))
        .context("Failed to load schema document")?;
    let graph = loader.parse().context("Failed to resolve schema")?;

    println!(
        "{} Loaded {} types from namespace {}",
        "✓".green(),
        graph.class_count(),
        graph.namespace().yellow()
    );
    Ok(graph)
}

fn run_generator(graph: &SchemaGraph, config: GeneratorConfig) -> Result<GenerationOutput> {
    CommandGenerator::new(graph, config)
        .generate()
        .context("Failed to generate commands")
}

fn routes_command(schema: &Path, format: Option<SchemaFormat>, config: GeneratorConfig) -> Result<()> {
    let graph = load_graph(schema, format)?;
    let output = run_generator(&graph, config)?;

    println!("\n{}", format!("Routes ({}):", output.routes.len()).bold());
    for route in &output.routes {
        let indent = "  ".repeat(route.depth());
        println!("{}{}", indent, route.to_route_string(true).cyan());
    }

    Ok(())
}

fn commands_command(
    schema: &Path,
    format: Option<SchemaFormat>,
    config: GeneratorConfig,
    route_filter: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let graph = load_graph(schema, format)?;
    let output = run_generator(&graph, config)?;

    let mut shown = 0;
    for (route, commands) in commands_by_route(&output) {
        if let Some(filter) = route_filter {
            let file_path = route.to_file_path_string();
            if !(file_path == filter || file_path.starts_with(&format!("{}/", filter))) {
                continue;
            }
        }

        println!("\n{}", route.to_route_string(true).bold());
        for command in commands {
            shown += 1;
            println!(
                "  • {} {} {}",
                command.name.to_string().cyan(),
                command.http_method.to_string().yellow(),
                command.call_url_template
            );
            if verbose {
                print_parameter_sets(command);
            }
        }
    }

    println!("\n{} {} commands", "✓".green(), shown);
    Ok(())
}

/// Pair each route with the commands built from it
fn commands_by_route(output: &GenerationOutput) -> Vec<(&Route, Vec<&Command>)> {
    output
        .routes
        .iter()
        .map(|route| {
            let rendered = route.to_route_string(true);
            let commands = output
                .commands
                .iter()
                .filter(|c| c.route == rendered)
                .collect();
            (route, commands)
        })
        .collect()
}

fn print_parameter_sets(command: &Command) {
    for set in &command.parameter_sets {
        let marker = if set.is_default { " (default)" } else { "" };
        println!("      {}{}", set.name.bold(), marker);
        for parameter in command.parameters_in_set(&set.name) {
            let mandatory = if parameter.is_mandatory_in(&set.name) { "*" } else { "" };
            println!(
                "        -{}{} [{}]",
                parameter.name,
                mandatory.red(),
                parameter.param_type
            );
        }
    }
}

fn generate_command(
    schema: &Path,
    format: Option<SchemaFormat>,
    config: GeneratorConfig,
    emit: EmitKind,
    output_dir: &Path,
) -> Result<()> {
    let graph = load_graph(schema, format)?;

    let mut emitters: Vec<Box<dyn CommandEmitter>> = Vec::new();
    if matches!(emit, EmitKind::Json | EmitKind::All) {
        emitters.push(Box::new(JsonEmitter::new()));
    }
    if matches!(emit, EmitKind::Docs | EmitKind::All) {
        emitters.push(Box::new(
            TemplateEmitter::new().context("Failed to load templates")?,
        ));
    }

    println!("{} Generating commands...", "→".cyan());
    let (output, mut written) = CommandGenerator::new(&graph, config)
        .generate_into(&emitters, output_dir)
        .context("Failed to generate commands")?;
    println!(
        "{} {} routes, {} commands",
        "✓".green(),
        output.routes.len(),
        output.commands.len()
    );

    if emit == EmitKind::All {
        written.push(write_route_list(&output, output_dir).context("Failed to write routes")?);
    }

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("\n{}", "Generated files:".bold());
    println!("  {} files in {}", written.len(), output_dir.display());
    for path in written.iter().filter(|p| p.parent() == Some(output_dir)) {
        println!("  📄 {}", path.display());
    }

    Ok(())
}
