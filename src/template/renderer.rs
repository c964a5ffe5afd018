use handlebars::Handlebars;
use tracing::trace;

use super::dot_parser::{DotParser, BLOCK_MARKER};
use super::error::TemplateError;
use super::helpers::{default_helper, json_helper};
use super::values::TemplateValues;

// Private use code points stand in for escaped delimiters while the
// template goes through conversion and rendering.
const ESCAPED_OPEN: &str = "\u{E000}";
const ESCAPED_CLOSE: &str = "\u{E001}";

fn protect_escapes(raw: &str) -> String {
    raw.replace("\\{{", ESCAPED_OPEN)
        .replace("\\}}", ESCAPED_CLOSE)
}

fn restore_escapes(rendered: &str) -> String {
    rendered
        .replace(BLOCK_MARKER, "")
        .replace(ESCAPED_OPEN, "{{")
        .replace(ESCAPED_CLOSE, "}}")
}

/// Renders doT-style templates through Handlebars
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
    parser: DotParser,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_helper("default", Box::new(default_helper));
        handlebars.register_helper("json", Box::new(json_helper));

        Self {
            handlebars,
            parser: DotParser::new(),
        }
    }

    /// Render `raw` against `values`.
    ///
    /// `\{{` and `\}}` come out as literal `{{` and `}}`; the backslash is
    /// consumed exactly once. `name` only appears in error messages.
    pub fn render(
        &self,
        name: &str,
        raw: &str,
        values: &TemplateValues,
    ) -> Result<String, TemplateError> {
        trace!("Rendering template: {name}");

        let converted = self
            .parser
            .convert_to_handlebars(name, &protect_escapes(raw))?;

        let rendered = self
            .handlebars
            .render_template(&converted, &values.to_context())
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(restore_escapes(&rendered))
    }

    /// Like [`Self::render`] for raw file content
    pub fn render_bytes(
        &self,
        name: &str,
        raw: &[u8],
        values: &TemplateValues,
    ) -> Result<String, TemplateError> {
        let raw = std::str::from_utf8(raw).map_err(|_| TemplateError::InvalidUtf8 {
            name: name.to_string(),
        })?;
        self.render(name, raw, values)
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("strict_mode", &self.handlebars.strict_mode())
            .finish_non_exhaustive()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
