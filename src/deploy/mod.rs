//! The deploy engine: walks a source tree and reconciles the target with it

pub mod classify;
pub mod error;
pub mod options;
pub mod orchestrator;

pub use classify::{classify, FileClass, TEMPLATE_SUFFIX};
pub use error::{DeployError, Result};
pub use options::{DeployContext, DeployOptions};
pub use orchestrator::{run, treeploy, treeploy_paths, DeploySummary};
