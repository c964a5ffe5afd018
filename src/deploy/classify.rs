//! Filename based dispatch for source files

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Suffix marking a file as a template; removed from the deployed name
pub const TEMPLATE_SUFFIX: &str = ".dot";

// emacs and vim backup/lock files
static SKIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#.*#$|^\.#|~$").expect("skip pattern is valid"));

static DESCRIPTOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^tree\.ya?ml(\.dot)?$").expect("descriptor pattern is valid"));

static TEMPLATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+\.dot$").expect("template pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// Editor artifact, never deployed
    Skip,
    /// Tree descriptor, applied after its siblings
    Descriptor { templated: bool },
    /// Rendered, then written without the template suffix
    Template,
    /// Copied byte for byte
    Plain,
}

impl FileClass {
    pub fn describe(self) -> &'static str {
        match self {
            FileClass::Skip => "skipped file",
            FileClass::Descriptor { templated: false } => "tree descriptor",
            FileClass::Descriptor { templated: true } => "templated tree descriptor",
            FileClass::Template => "template",
            FileClass::Plain => "plain file",
        }
    }
}

/// Classify a file by its name (not its full path)
pub fn classify(file_name: &str) -> FileClass {
    if SKIP_REGEX.is_match(file_name) {
        FileClass::Skip
    } else if DESCRIPTOR_REGEX.is_match(file_name) {
        FileClass::Descriptor {
            templated: file_name.ends_with(TEMPLATE_SUFFIX),
        }
    } else if TEMPLATE_REGEX.is_match(file_name) {
        FileClass::Template
    } else {
        FileClass::Plain
    }
}

/// Classify the final component of `path`
pub fn classify_path(path: &Path) -> FileClass {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    classify(&name)
}

/// Where a rendered template is written: `dst` without the template suffix
pub fn template_output_path(dst: &Path) -> PathBuf {
    let text = dst.to_string_lossy();
    match text.strip_suffix(TEMPLATE_SUFFIX) {
        Some(stripped) if !stripped.is_empty() && !stripped.ends_with('/') => {
            PathBuf::from(stripped)
        }
        _ => dst.to_path_buf(),
    }
}
