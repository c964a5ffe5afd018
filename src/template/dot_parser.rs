//! doT template syntax to Handlebars template conversion

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::error::TemplateError;

static DEFINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{##\s*([\w.$]+)\s*(?::|=)([\s\S]+?)#\}\}").expect("define pattern is valid")
});

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([\s\S]*?)\}\}").expect("tag pattern is valid"));

static ITERATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\s\S]+?)\s*:\s*([\w$]+)\s*(?::\s*([\w$]+))?$").expect("iterate pattern is valid")
});

static PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*|\[\s*(?:\d+|'[^']*'|"[^"]*")\s*\])*$"#)
        .expect("path pattern is valid")
});

static INDEX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[\s*(?:(\d+)|'([^']*)'|"([^"]*)")\s*\]"#).expect("index pattern is valid")
});

static LITERAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:-?\d+(?:\.\d+)?|true|false|null|'[^']*'|"[^"]*")$"#)
        .expect("literal pattern is valid")
});

static PARTIAL_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$.]*$").expect("partial pattern is valid"));

/// Binary operators, loosest binding first, with the Handlebars helper each maps to
const OPERATORS: &[&[(&str, &str)]] = &[
    &[("||", "or")],
    &[("&&", "and")],
    &[("!==", "ne"), ("===", "eq"), ("!=", "ne"), ("==", "eq")],
    &[("<=", "lte"), (">=", "gte"), ("<", "lt"), (">", "gt")],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Conditional,
    Iteration,
}

impl Block {
    fn describe(self) -> &'static str {
        match self {
            Block::Conditional => "conditional",
            Block::Iteration => "iteration",
        }
    }
}

/// A converted doT expression
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expression {
    /// Path or literal, usable anywhere
    Operand(String),
    /// Helper invocation, needs parentheses when used as a parameter
    Call(String),
}

impl Expression {
    fn as_param(&self) -> String {
        match self {
            Expression::Operand(operand) => operand.clone(),
            Expression::Call(call) => format!("({call})"),
        }
    }

    fn as_tag(&self) -> &str {
        match self {
            Expression::Operand(body) | Expression::Call(body) => body,
        }
    }
}

/// Private use code point emitted after every block-level tag and removed
/// after rendering. doT keeps the newlines around a tag that sits alone on
/// its line; Handlebars would strip them unless the line holds other text.
pub(crate) const BLOCK_MARKER: &str = "\u{E002}";

fn mustache(body: &str) -> String {
    ["{{", body, "}}"].concat()
}

fn block_tag(body: &str) -> String {
    ["{{", body, "}}", BLOCK_MARKER].concat()
}

fn triple_stash(body: &str) -> String {
    ["{{{", body, "}}}"].concat()
}

/// Translates the doT delimiter family into Handlebars:
///
/// | doT                        | Handlebars                         |
/// |----------------------------|------------------------------------|
/// | `{{= expr }}`              | `{{{expr}}}`                       |
/// | `{{! expr }}`              | `{{expr}}` (HTML escaped)          |
/// | `{{? cond }}` `{{?}}`      | `{{#if cond}}` `{{/if}}`           |
/// | `{{?? cond }}` `{{??}}`    | `{{else if cond}}` `{{else}}`      |
/// | `{{~ list :v:i }}` `{{~}}` | `{{#each list as \|v i\|}}` `{{/each}}` |
/// | `{{## def.x: body #}}`     | `{{#*inline "x"}}body{{/inline}}`  |
/// | `{{# def.x }}`             | `{{> x}}`                          |
/// | `{{ expr }}`               | `{{expr}}`                         |
///
/// Expressions accept property paths, literals, `!`, comparisons, `&&`,
/// `||` and `JSON.stringify(..)`. Anything else cannot be expressed without
/// a JavaScript interpreter and is reported as a conversion error.
#[derive(Debug, Default, Clone, Copy)]
pub struct DotParser;

impl DotParser {
    pub fn new() -> Self {
        DotParser
    }

    pub fn convert_to_handlebars(&self, name: &str, template: &str) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(template.len());
        let mut last = 0;

        for caps in DEFINE_REGEX.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            output.push_str(&self.convert_tags(name, &template[last..whole.start()])?);

            let partial = caps[1].strip_prefix("def.").unwrap_or(&caps[1]);
            let body = self.convert_tags(name, &caps[2])?;
            output.push_str(&block_tag(&format!("#*inline \"{partial}\"")));
            output.push_str(&body);
            output.push_str(&block_tag("/inline"));

            last = whole.end();
        }

        output.push_str(&self.convert_tags(name, &template[last..])?);
        Ok(output)
    }

    fn convert_tags(&self, name: &str, template: &str) -> Result<String, TemplateError> {
        let conversion_error = |message: String| TemplateError::Conversion {
            name: name.to_string(),
            message,
        };

        let mut output = String::with_capacity(template.len());
        let mut open_blocks = Vec::new();
        let mut last = 0;

        for caps in TAG_REGEX.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            output.push_str(&template[last..whole.start()]);
            output.push_str(&convert_tag(&caps, &mut open_blocks).map_err(conversion_error)?);
            last = whole.end();
        }
        output.push_str(&template[last..]);

        if let Some(block) = open_blocks.last() {
            return Err(conversion_error(format!(
                "unclosed {} block",
                block.describe()
            )));
        }

        Ok(output)
    }
}

fn convert_tag(caps: &Captures, open_blocks: &mut Vec<Block>) -> Result<String, String> {
    let body = &caps[1];

    if let Some(expr) = body.strip_prefix('=') {
        return Ok(triple_stash(expression(expr)?.as_tag()));
    }

    if let Some(expr) = body.strip_prefix('!') {
        return Ok(mustache(expression(expr)?.as_tag()));
    }

    if let Some(condition) = body.strip_prefix("??") {
        if open_blocks.last() != Some(&Block::Conditional) {
            return Err(format!("'{}' outside of a conditional", &caps[0]));
        }
        let condition = condition.trim();
        return Ok(if condition.is_empty() {
            block_tag("else")
        } else {
            block_tag(&format!("else if {}", expression(condition)?.as_param()))
        });
    }

    if let Some(condition) = body.strip_prefix('?') {
        let condition = condition.trim();
        if condition.is_empty() {
            return close_block(open_blocks, Block::Conditional, "/if");
        }
        let condition = expression(condition)?.as_param();
        open_blocks.push(Block::Conditional);
        return Ok(block_tag(&format!("#if {condition}")));
    }

    if let Some(iteration) = body.strip_prefix('~') {
        let iteration = iteration.trim();
        if iteration.is_empty() {
            return close_block(open_blocks, Block::Iteration, "/each");
        }

        let parts = ITERATE_REGEX.captures(iteration).ok_or_else(|| {
            format!("invalid iteration '{iteration}', expected 'list:value[:index]'")
        })?;
        let list = expression(&parts[1])?.as_param();
        let params = match parts.get(3) {
            Some(index) => format!("{} {}", &parts[2], index.as_str()),
            None => parts[2].to_string(),
        };
        open_blocks.push(Block::Iteration);
        return Ok(block_tag(&format!("#each {list} as |{params}|")));
    }

    if let Some(partial) = body.strip_prefix('#') {
        let partial = partial.trim();
        let partial = partial.strip_prefix("def.").unwrap_or(partial);
        if !PARTIAL_NAME_REGEX.is_match(partial) {
            return Err(format!("unsupported partial reference '{}'", &caps[0]));
        }
        return Ok(block_tag(&format!("> {partial}")));
    }

    // evaluate blocks are handed to handlebars untouched
    let body = body.trim();
    if body.is_empty() {
        return Err("empty template tag".to_string());
    }
    Ok(mustache(body))
}

fn close_block(open_blocks: &mut Vec<Block>, expected: Block, close: &str) -> Result<String, String> {
    match open_blocks.pop() {
        Some(block) if block == expected => Ok(block_tag(close)),
        Some(block) => Err(format!(
            "{} block closed while a {} block is open",
            expected.describe(),
            block.describe()
        )),
        None => Err(format!("{} block closed but never opened", expected.describe())),
    }
}

fn expression(source: &str) -> Result<Expression, String> {
    let source = source.trim();
    if source.is_empty() {
        return Err("empty expression".to_string());
    }

    if let Some(inner) = strip_group(source) {
        return expression(inner);
    }

    for level in OPERATORS {
        for (operator, helper) in level.iter() {
            if let Some((left, right)) = split_operator(source, operator) {
                return Ok(Expression::Call(format!(
                    "{helper} {} {}",
                    expression(left)?.as_param(),
                    expression(right)?.as_param()
                )));
            }
        }
    }

    if let Some(negated) = source.strip_prefix('!') {
        return Ok(Expression::Call(format!(
            "not {}",
            expression(negated)?.as_param()
        )));
    }

    if let Some(inner) = source
        .strip_prefix("JSON.stringify(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return Ok(Expression::Call(format!(
            "json {}",
            expression(inner)?.as_param()
        )));
    }

    if LITERAL_REGEX.is_match(source) {
        return Ok(Expression::Operand(source.to_string()));
    }

    if PATH_REGEX.is_match(source) {
        let path = INDEX_REGEX.replace_all(source, |index: &Captures| {
            let key = index
                .get(1)
                .or_else(|| index.get(2))
                .or_else(|| index.get(3))
                .map_or("", |m| m.as_str());
            format!(".[{key}]")
        });
        return Ok(Expression::Operand(path.into_owned()));
    }

    Err(format!("unsupported expression '{source}'"))
}

/// Inner text of `( ... )` when the parentheses enclose the whole expression
fn strip_group(source: &str) -> Option<&str> {
    let inner = source.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0usize;
    for byte in inner.bytes() {
        match byte {
            b'(' => depth += 1,
            b')' => depth = depth.checked_sub(1)?,
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// Split at the first `operator` that is outside quotes and parentheses
fn split_operator<'a>(source: &'a str, operator: &str) -> Option<(&'a str, &'a str)> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut quote = None;

    for (i, &byte) in bytes.iter().enumerate() {
        match quote {
            Some(open) => {
                if byte == open {
                    quote = None;
                }
            }
            None => match byte {
                b'\'' | b'"' => quote = Some(byte),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ if depth == 0 && bytes[i..].starts_with(operator.as_bytes()) => {
                    return Some((&source[..i], &source[i + operator.len()..]));
                }
                _ => {}
            },
        }
    }
    None
}
