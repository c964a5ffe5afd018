use std::path::PathBuf;
use thiserror::Error;

use crate::descriptor::DescriptorError;
use crate::drivers::DriverError;
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("The source path does not exist: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("The source path is neither a directory nor a file: {path}")]
    UnsupportedSourceKind { path: PathBuf },

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

pub type Result<T> = std::result::Result<T, DeployError>;
