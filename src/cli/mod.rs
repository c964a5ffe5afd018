pub mod error;
pub mod model;
pub mod options;
pub mod setup;

pub use error::CliError;
pub use model::{build_template_values, parse_driver_options, parse_scalar};
pub use options::TreeployCli;
pub use setup::{init_logging, verbosity_level, warn_if_not_root};
