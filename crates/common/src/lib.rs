//! Common types and utilities for odata-cmdgen
//!
//! This crate contains the schema graph consumed by the generator, the
//! command model it produces, configuration, naming helpers and the shared
//! error type used across the parser, generator, and CLI components.

pub mod command;
pub mod config;
pub mod naming;
pub mod schema;

pub use command::{
    Command, CommandName, HttpMethod, OperationKind, Parameter, ParameterLocation, ParameterSet,
    ParameterType, SetMembership, Verb,
};
pub use config::GeneratorConfig;
pub use schema::{
    Capabilities, ClassId, ClassKind, EntityContainer, EnumId, MethodId, MethodKind,
    MethodParameter, MethodReturn, PrimitiveType, PropertyId, PropertyOwner, SchemaClass,
    SchemaEnum, SchemaGraph, SchemaMethod, SchemaProperty, TypeRef,
};

use thiserror::Error;

/// Errors that can occur during command generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The schema graph violates the input contract. Always fatal.
    #[error("Schema error at {location}: {message}")]
    Schema { location: String, message: String },

    /// A synthesized command breaks a command-model invariant.
    #[error("Invalid command {command}: {message}")]
    InvalidCommand { command: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GeneratorError {
    /// Build a schema-shape error attached to a class, property or route identity
    pub fn schema(location: impl Into<String>, message: impl Into<String>) -> Self {
        GeneratorError::Schema {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Build a command-invariant error
    pub fn invalid_command(command: impl Into<String>, message: impl Into<String>) -> Self {
        GeneratorError::InvalidCommand {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;
