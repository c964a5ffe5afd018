//! Handlebars helpers available to every template.
//!
//! Comparison and boolean helpers (`eq`, `ne`, `lt`, `not`, `and`, ...) are
//! the Handlebars built-ins, which return real booleans when used as
//! subexpressions inside `#if`.

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason,
};
use serde_json::Value;

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `{{default value fallback}}`: the fallback when `value` is missing, null
/// or an empty string
pub fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let fallback = h.param(1).map(|p| display(p.value())).unwrap_or_default();

    let rendered = match h.param(0).map(|p| p.value()) {
        None | Some(Value::Null) => fallback,
        Some(Value::String(s)) if s.is_empty() => fallback,
        Some(value) => display(value),
    };

    out.write(&rendered)?;
    Ok(())
}

/// `{{json value}}` or `{{json value true}}` for indented output
pub fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h.param(0).ok_or_else(|| {
        RenderError::from(RenderErrorReason::Other(
            "json helper requires a parameter".to_string(),
        ))
    })?;
    let pretty = h
        .param(1)
        .map(|p| matches!(p.value(), Value::Bool(true)))
        .unwrap_or(false);

    let rendered = if pretty {
        serde_json::to_string_pretty(value.value())
    } else {
        serde_json::to_string(value.value())
    }
    .map_err(|e| RenderError::from(RenderErrorReason::Other(e.to_string())))?;

    out.write(&rendered)?;
    Ok(())
}
