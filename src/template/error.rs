use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to render template '{name}': {message}")]
    Render { name: String, message: String },

    #[error("Failed to convert template '{name}': {message}")]
    Conversion { name: String, message: String },

    #[error("Template '{name}' is not valid UTF-8")]
    InvalidUtf8 { name: String },

    #[error("Invalid template model: {message}")]
    Model { message: String },
}
