//! Parsing of tree descriptor content into [`TreeEntry`] values

use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Component, Path};

use super::error::{DescriptorError, Result};
use crate::types::{FileMode, IdSpec, PathAttributes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One item of a descriptor list
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEntry {
    /// Relative name, without leading or trailing slashes
    pub name: String,
    pub kind: EntryKind,
    /// Only the attributes written on this entry; inheritance happens when
    /// the descriptor is applied
    pub attributes: PathAttributes,
    pub children: Vec<TreeEntry>,
}

impl TreeEntry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryOptions {
    owner: Option<IdSpec>,
    group: Option<IdSpec>,
    mode: Option<FileMode>,
    children: Option<Value>,
}

fn describe(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{value:?}"))
}

/// Turns raw YAML into entries, naming the offending file and directory on error
pub(super) struct EntryParser<'a> {
    pub file: &'a Path,
}

impl EntryParser<'_> {
    fn malformed(&self, directory: &Path, reason: String) -> DescriptorError {
        DescriptorError::Malformed {
            file: self.file.to_path_buf(),
            directory: directory.to_path_buf(),
            reason,
        }
    }

    /// `value` must be a list describing the contents of `directory`
    pub fn parse_list(&self, value: Value, directory: &Path) -> Result<Vec<TreeEntry>> {
        match value {
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.parse_entry(item, directory))
                .collect(),
            other => Err(self.malformed(
                directory,
                format!(
                    "expected a list of directory contents, got: {}",
                    describe(&other)
                ),
            )),
        }
    }

    fn parse_entry(&self, item: Value, directory: &Path) -> Result<TreeEntry> {
        let (raw_name, options) = match item {
            Value::String(name) => (name, EntryOptions::default()),
            Value::Mapping(mapping) if mapping.len() == 1 => {
                let Some((key, options)) = mapping.into_iter().next() else {
                    return Err(self.malformed(directory, "empty entry".to_string()));
                };
                let name = match key {
                    Value::String(name) => name,
                    other => {
                        return Err(self.malformed(
                            directory,
                            format!("entry name must be a string, got: {}", describe(&other)),
                        ))
                    }
                };
                let options = self.parse_options(&name, options, directory)?;
                (name, options)
            }
            other => {
                return Err(self.malformed(
                    directory,
                    format!(
                        "expected a name or a single name mapped to options, got: {}",
                        describe(&other)
                    ),
                ))
            }
        };

        let name = raw_name.trim_start_matches('/');
        let kind = if name.ends_with('/') || options.children.is_some() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let name = name.trim_end_matches('/').to_string();

        if name.is_empty() {
            return Err(self.malformed(directory, format!("invalid entry name '{raw_name}'")));
        }
        if Path::new(&name)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(self.malformed(
                directory,
                format!("entry '{raw_name}' must not refer to a parent directory"),
            ));
        }

        let children = match options.children {
            Some(children) => self.parse_list(children, &directory.join(&name))?,
            None => Vec::new(),
        };

        Ok(TreeEntry {
            name,
            kind,
            attributes: PathAttributes {
                owner: options.owner,
                group: options.group,
                mode: options.mode,
            },
            children,
        })
    }

    fn parse_options(&self, name: &str, options: Value, directory: &Path) -> Result<EntryOptions> {
        match options {
            Value::Null => Ok(EntryOptions::default()),
            Value::Mapping(_) => serde_yaml::from_value(options).map_err(|e| {
                self.malformed(directory, format!("invalid options for '{name}': {e}"))
            }),
            other => Err(self.malformed(
                directory,
                format!(
                    "options for '{name}' must be a mapping, got: {}",
                    describe(&other)
                ),
            )),
        }
    }
}

/// Parse descriptor `content` read from `file`, describing `directory`
pub fn parse_entries(file: &Path, directory: &Path, content: &str) -> Result<Vec<TreeEntry>> {
    let value: Value = serde_yaml::from_str(content).map_err(|source| DescriptorError::Yaml {
        file: file.to_path_buf(),
        source,
    })?;

    EntryParser { file }.parse_list(value, directory)
}
