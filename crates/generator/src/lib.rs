//! Command generation for OData-style schema graphs
//!
//! This crate turns a [`SchemaGraph`](odata_cmdgen_common::SchemaGraph) into
//! routes and commands:
//! - the route builder walks navigation properties into a route tree
//! - the synthesizer decides which operations each route supports
//! - the parameter resolver builds per-type parameter sets for writes
//! - emitters write the finished command model to disk

pub mod emit;
pub mod overloads;
pub mod pipeline;
pub mod resolver;
pub mod routes;
pub mod synthesizer;
mod templates;
pub mod types;

pub use emit::{CommandEmitter, JsonEmitter, TemplateEmitter};
pub use overloads::{select_default, DefaultSetSelector, SetCandidate};
pub use pipeline::{CommandGenerator, GenerationOutput};
pub use resolver::{is_read_only, ParameterResolver};
pub use routes::{
    build_routes, IdPlaceholder, Route, RouteBuilder, RouteNode, RouteNodeId, RouteSegment,
    RouteTree, SegmentCast, TerminalId, TypecastPlaceholder,
};
pub use synthesizer::CommandSynthesizer;

use odata_cmdgen_common::{GeneratorError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Write the route list as `routes.txt`, one rendered route per line
pub fn write_route_list(output: &GenerationOutput, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|e| {
        GeneratorError::Generation(format!("Failed to create output directory: {}", e))
    })?;

    let mut content = String::new();
    for route in &output.routes {
        content.push_str(&route.to_route_string(true));
        content.push('\n');
    }

    let path = output_dir.join("routes.txt");
    fs::write(&path, content)
        .map_err(|e| GeneratorError::Generation(format!("Failed to write routes.txt: {}", e)))?;
    Ok(path)
}
