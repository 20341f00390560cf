//! Template loading and management

use odata_cmdgen_common::naming::to_snake_case;
use odata_cmdgen_common::{GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("snake", snake_filter);
    tera.register_filter("cell", cell_filter);
    tera.register_filter("yes_no", yes_no_filter);

    tera.add_raw_template("command.md", include_str!("../templates/command.md.tera"))
        .map_err(|e| {
            GeneratorError::Generation(format!("Failed to load command.md template: {}", e))
        })?;

    tera.add_raw_template("README.md", include_str!("../templates/README.md.tera"))
        .map_err(|e| {
            GeneratorError::Generation(format!("Failed to load README.md template: {}", e))
        })?;

    Ok(tera)
}

/// Filter to convert a command or route name to snake_case
fn snake_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("snake filter expects a string"))?;

    Ok(Value::String(to_snake_case(s)))
}

/// Filter to make text safe inside a markdown table cell
fn cell_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    Ok(Value::String(s.replace('|', "\\|").replace('\n', " ")))
}

/// Filter to render a boolean as yes/no
fn yes_no_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let b = value
        .as_bool()
        .ok_or_else(|| tera::Error::msg("yes_no filter expects a boolean"))?;

    Ok(Value::String(if b { "yes" } else { "no" }.to_string()))
}
