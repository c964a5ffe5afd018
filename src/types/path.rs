//! Filesystem entity kinds and the ownership/permission metadata carried
//! between drivers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of entity found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathType {
    /// Nothing exists at the path (or, for the remote driver, we could not see it)
    Absent,
    File,
    Directory,
    /// Exists but is neither a regular file nor a directory (socket, device, ...)
    Other,
}

impl PathType {
    pub fn exists(self) -> bool {
        self != PathType::Absent
    }

    pub fn describe(self) -> &'static str {
        match self {
            PathType::Absent => "nothing",
            PathType::File => "file",
            PathType::Directory => "directory",
            PathType::Other => "unknown filesystem entity",
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Owner or group of a path, either a numeric id or a host-dependent name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdSpec {
    Id(u32),
    Name(String),
}

impl IdSpec {
    /// Numeric id if one is known without consulting the user/group database.
    ///
    /// `"root"` always maps to `0`, and names made only of digits are treated
    /// as ids.
    pub fn numeric(&self) -> Option<u32> {
        match self {
            IdSpec::Id(id) => Some(*id),
            IdSpec::Name(name) if name == "root" => Some(0),
            IdSpec::Name(name) => name.parse::<u32>().ok(),
        }
    }
}

impl fmt::Display for IdSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdSpec::Id(id) => write!(f, "{id}"),
            IdSpec::Name(name) => f.write_str(name),
        }
    }
}

impl From<u32> for IdSpec {
    fn from(id: u32) -> Self {
        IdSpec::Id(id)
    }
}

impl From<&str> for IdSpec {
    fn from(name: &str) -> Self {
        IdSpec::Name(name.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid permission mode '{mode}': expected an octal string such as \"0644\"")]
pub struct ParseModeError {
    pub mode: String,
}

/// Permission bits, written as a `0`-prefixed octal string (`"0644"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

impl FileMode {
    /// Build from a raw `st_mode`, keeping only the permission bits
    pub fn from_raw(mode: u32) -> Self {
        FileMode(mode & 0o777)
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl FromStr for FileMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('0').unwrap_or(trimmed);

        if digits.len() < 3 || digits.len() > 4 || !digits.chars().all(|c| ('0'..='7').contains(&c))
        {
            return Err(ParseModeError {
                mode: s.to_string(),
            });
        }

        u32::from_str_radix(digits, 8)
            .map(FileMode)
            .map_err(|_| ParseModeError {
                mode: s.to_string(),
            })
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0{:03o}", self.0)
    }
}

impl Serialize for FileMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // YAML authors write both `mode: "0644"` and `mode: 644`; the digits
        // are octal either way.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        let text = match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text,
            Repr::Number(number) => number.to_string(),
        };

        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Ownership and permission metadata. An unset field means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<IdSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<IdSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FileMode>,
}

impl PathAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner: impl Into<IdSpec>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<IdSpec>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_mode(mut self, mode: FileMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_none() && self.group.is_none() && self.mode.is_none()
    }

    /// Fields set on `self` win, anything unset is taken from `defaults`
    pub fn overlay(&self, defaults: &PathAttributes) -> PathAttributes {
        PathAttributes {
            owner: self.owner.clone().or_else(|| defaults.owner.clone()),
            group: self.group.clone().or_else(|| defaults.group.clone()),
            mode: self.mode.or(defaults.mode),
        }
    }
}

impl fmt::Display for PathAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "owner={} group={} mode={}",
            show(self.owner.as_ref().map(|o| o.to_string())),
            show(self.group.as_ref().map(|g| g.to_string())),
            show(self.mode.map(|m| m.to_string())),
        )
    }
}
