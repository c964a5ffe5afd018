//! Builds the template model from `--modelfile`, `--modelcmd` and `--model`

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::{CliError, Result};
use super::options::TreeployCli;
use crate::template::{merge_field, TemplateValues, DEFAULT_SET};

static INTEGER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("integer pattern is valid"));

static FLOAT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+|-)?[0-9]*\.[0-9]+$").expect("float pattern is valid"));

static FIELD_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_.]*)=(.*)$").expect("field prefix pattern is valid")
});

/// Interpret a command line value: integers, floats and booleans become
/// typed values, quotes force a string
pub fn parse_scalar(raw: &str) -> Value {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Value::String(raw[1..raw.len() - 1].to_string());
        }
    }

    if INTEGER_REGEX.is_match(raw) {
        if let Ok(number) = raw.parse::<u64>() {
            return Value::from(number);
        }
    }
    if FLOAT_REGEX.is_match(raw) {
        if let Some(number) = raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return Value::Number(number);
        }
    }

    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// `FIELD=VALUE`, where FIELD is required
pub fn split_assignment(argument: &str) -> Result<(&str, &str)> {
    match argument.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field, value)),
        _ => Err(CliError::InvalidArgument {
            argument: argument.to_string(),
            reason: "expected FIELD=VALUE".to_string(),
        }),
    }
}

/// `[FIELD=]REST`; the field is empty when no valid prefix is present
pub fn split_optional_field(argument: &str) -> (&str, &str) {
    match FIELD_PREFIX_REGEX.captures(argument) {
        Some(captures) => {
            let field = captures.get(1).map_or("", |m| m.as_str());
            let rest = captures.get(2).map_or("", |m| m.as_str());
            (field, rest)
        }
        None => ("", argument),
    }
}

pub fn load_model_file(path: &Path) -> Result<Value> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let content = match extension.as_deref() {
        Some("json" | "yaml" | "yml") => {
            std::fs::read_to_string(path).map_err(|source| CliError::ModelFileRead {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => {
            return Err(CliError::UnsupportedModelFile {
                path: path.to_path_buf(),
            })
        }
    };

    let parsed = if extension.as_deref() == Some("json") {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| CliError::ModelFileParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Run `command` through `sh -c` and parse its standard output as JSON
pub async fn run_model_command(command: &str) -> Result<Value> {
    let failed = |message: String| CliError::ModelCommand {
        command: command.to_string(),
        message,
    };

    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !output.status.success() {
        return Err(failed(format!(
            "exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| failed(format!("output is not valid JSON: {e}")))
}

/// Model files first, then commands, then single fields, so that explicit
/// `--model` values win
pub async fn build_template_values(cli: &TreeployCli) -> Result<TemplateValues> {
    let mut values = TemplateValues::new();

    for argument in &cli.model_files {
        let (field, file) = split_optional_field(argument);
        debug!("Loading model file {file} at '{field}'");
        values.set_field(field, load_model_file(&PathBuf::from(file))?)?;
    }

    for argument in &cli.model_commands {
        let (field, command) = split_optional_field(argument);
        debug!("Running model command {command} for '{field}'");
        values.set_field(field, run_model_command(command).await?)?;
    }

    for argument in &cli.models {
        let (field, value) = split_assignment(argument)?;
        values.set_field(field, parse_scalar(value))?;
    }

    if values.is_empty() {
        values.insert(DEFAULT_SET, Value::Object(Map::new()));
    }
    Ok(values)
}

/// `KEY=VALUE` driver options, with dotted keys building nested objects
pub fn parse_driver_options(arguments: &[String]) -> Result<Map<String, Value>> {
    let mut options = Value::Object(Map::new());
    for argument in arguments {
        let (key, value) = split_assignment(argument)?;
        merge_field(&mut options, key, parse_scalar(value));
    }

    match options {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}
