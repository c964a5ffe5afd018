//! Named value sets handed to templates

use serde_json::{Map, Value};

use super::error::TemplateError;

/// Name of the value set templates see when no model was supplied
pub const DEFAULT_SET: &str = "it";

/// Ordered list of named value sets.
///
/// Each set is reachable in a template by its name (`it.name`). The top-level
/// fields of every object-valued set are reachable directly as well (`name`);
/// on a clash later sets win and set names win over fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateValues {
    sets: Vec<(String, Value)>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Replace the set called `name`, keeping its position, or append it
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.sets.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.sets.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.sets
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Set a dotted field such as `web.host.port`.
    ///
    /// The first component names the value set. Missing sets and objects on
    /// the way are created; an object value is merged into an existing
    /// object rather than replacing it. An empty field merges every key of
    /// `value` (which must be an object) as a set of its own.
    pub fn set_field(&mut self, field: &str, value: Value) -> Result<(), TemplateError> {
        if field.is_empty() {
            return match value {
                Value::Object(sets) => {
                    for (name, value) in sets {
                        merge_value(self.slot(&name), value);
                    }
                    Ok(())
                }
                other => Err(TemplateError::Model {
                    message: format!("value without a field name must be an object, got: {other}"),
                }),
            };
        }

        let (set, rest) = field.split_once('.').unwrap_or((field, ""));
        merge_field(self.slot(set), rest, value);
        Ok(())
    }

    fn slot(&mut self, name: &str) -> &mut Value {
        let index = match self.sets.iter().position(|(existing, _)| existing == name) {
            Some(index) => index,
            None => {
                self.sets.push((name.to_string(), Value::Object(Map::new())));
                self.sets.len() - 1
            }
        };
        &mut self.sets[index].1
    }

    /// The data object templates are rendered against
    pub fn to_context(&self) -> Value {
        let mut context = Map::new();

        if self.sets.is_empty() {
            context.insert(DEFAULT_SET.to_string(), Value::Object(Map::new()));
            return Value::Object(context);
        }

        for (_, value) in &self.sets {
            if let Value::Object(fields) = value {
                for (key, field) in fields {
                    context.insert(key.clone(), field.clone());
                }
            }
        }
        for (name, value) in &self.sets {
            context.insert(name.clone(), value.clone());
        }

        Value::Object(context)
    }
}

/// Set the dotted `field` below `target`, creating objects as needed
pub fn merge_field(target: &mut Value, field: &str, value: Value) {
    if field.is_empty() {
        merge_value(target, value);
        return;
    }

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        let (head, rest) = field.split_once('.').unwrap_or((field, ""));
        merge_field(map.entry(head).or_insert(Value::Null), rest, value);
    }
}

/// Shallow merge for objects, replacement for anything else
fn merge_value(target: &mut Value, value: Value) {
    match (target, value) {
        (Value::Object(existing), Value::Object(fields)) => existing.extend(fields),
        (target, value) => *target = value,
    }
}
