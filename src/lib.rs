//! Treeploy - deploys a directory tree onto a local or ssh target
//!
//! Files are copied with their ownership and permissions, `.dot` files are
//! rendered as templates, and `tree.yaml` descriptors scaffold empty files
//! and directories once the rest of their directory is in place.

pub mod cli;
pub mod deploy;
pub mod descriptor;
pub mod drivers;
pub mod template;
pub mod types;

pub use deploy::{treeploy, treeploy_paths, DeployError, DeployOptions, DeploySummary};
pub use drivers::{DriverRegistry, FileDriver, LocalFs, WritePolicy};
pub use template::TemplateValues;
pub use types::*;
