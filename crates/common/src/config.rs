//! Generator configuration loading from YAML files
//!
//! Naming conventions and route filters are kept in an optional YAML file
//! instead of being hardcoded in the generator.

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Settings for route building and command synthesis
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Prefix prepended to every command noun (e.g., "Lib" -> Get-LibBooks)
    pub noun_prefix: String,
    /// Routes deeper than this are not expanded
    pub max_route_depth: Option<usize>,
    /// File-path-string prefixes of routes to drop, with their descendants
    /// Format: ["books/authors", "shelves"]
    pub exclude_routes: Vec<String>,
    /// Suffix of identifier placeholders (e.g., "Id" -> BookId)
    pub id_parameter_suffix: String,
    /// Suffix of type-discriminator placeholders (e.g., "TypeCast" -> BookTypeCast)
    pub typecast_parameter_suffix: String,
    /// Name of the parameter carrying a reference URL
    pub reference_url_parameter: String,
    /// Whether methods bound to base types are invoked on derived routes too
    pub include_inherited_methods: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            noun_prefix: String::new(),
            max_route_depth: None,
            exclude_routes: Vec::new(),
            id_parameter_suffix: "Id".to_string(),
            typecast_parameter_suffix: "TypeCast".to_string(),
            reference_url_parameter: "ReferenceUrl".to_string(),
            include_inherited_methods: true,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            GeneratorError::Yaml(inner) => GeneratorError::Config(format!(
                "Failed to parse config YAML from {:?}: {}",
                path, inner
            )),
            other => other,
        })
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: GeneratorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check naming settings and route filters for consistency
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("id_parameter_suffix", &self.id_parameter_suffix),
            ("typecast_parameter_suffix", &self.typecast_parameter_suffix),
            ("reference_url_parameter", &self.reference_url_parameter),
        ] {
            if value.trim().is_empty() {
                return Err(GeneratorError::Config(format!("{} must not be empty", field)));
            }
            if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(GeneratorError::Config(format!(
                    "{} must be alphanumeric, got '{}'",
                    field, value
                )));
            }
        }

        if self.id_parameter_suffix == self.typecast_parameter_suffix {
            return Err(GeneratorError::Config(
                "id_parameter_suffix and typecast_parameter_suffix must differ".to_string(),
            ));
        }

        if self.max_route_depth == Some(0) {
            return Err(GeneratorError::Config(
                "max_route_depth must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for prefix in &self.exclude_routes {
            if !seen.insert(prefix.trim_matches('/')) {
                return Err(GeneratorError::Config(format!(
                    "duplicate route exclusion '{}'",
                    prefix
                )));
            }
        }

        Ok(())
    }

    /// Whether a route, given as its file path string, is excluded
    pub fn is_route_excluded(&self, file_path: &str) -> bool {
        self.exclude_routes.iter().any(|prefix| {
            let prefix = prefix.trim_matches('/');
            file_path == prefix
                || file_path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}
