use std::path::PathBuf;
use thiserror::Error;

use crate::drivers::DriverError;
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Invalid tree descriptor '{file}' for directory '{directory}': {reason}")]
    Malformed {
        file: PathBuf,
        directory: PathBuf,
        reason: String,
    },

    #[error("Failed to parse tree descriptor '{file}': {source}")]
    Yaml {
        file: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

pub type Result<T> = std::result::Result<T, DescriptorError>;
