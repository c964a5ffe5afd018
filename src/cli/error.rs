use std::path::PathBuf;
use thiserror::Error;

use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Unsupported model file '{path}': expected .json, .yaml or .yml")]
    UnsupportedModelFile { path: PathBuf },

    #[error("Failed to read model file '{path}': {source}")]
    ModelFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model file '{path}': {message}")]
    ModelFileParse { path: PathBuf, message: String },

    #[error("Model command '{command}' failed: {message}")]
    ModelCommand { command: String, message: String },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

pub type Result<T> = std::result::Result<T, CliError>;
