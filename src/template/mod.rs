//! doT-style template rendering on top of Handlebars

pub mod dot_parser;
pub mod error;
pub mod helpers;
pub mod renderer;
pub mod values;

pub use dot_parser::DotParser;
pub use error::TemplateError;
pub use renderer::TemplateRenderer;
pub use values::{merge_field, TemplateValues, DEFAULT_SET};
