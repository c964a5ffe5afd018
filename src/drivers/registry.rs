//! Selection of a storage driver from a path string

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::driver::{FileDriver, WritePolicy};
use super::error::{DriverError, Result};
use super::local::LocalFs;
use super::remote::{RemoteShell, SshDriverConfig, SshSession, SshTarget};

/// Everything a factory needs to build a driver bound to one root
#[derive(Debug, Clone, Default)]
pub struct DriverRequest {
    pub path: String,
    pub writes_enabled: bool,
    pub policy: WritePolicy,
    /// Driver specific settings, deserialized into the factory's own config
    pub options: Map<String, Value>,
}

impl DriverRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn writable(mut self, writes_enabled: bool) -> Self {
        self.writes_enabled = writes_enabled;
        self
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// Deserialize the option map into a factory config, rejecting unknown keys
    pub fn config<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.options.clone()))
            .map_err(|e| DriverError::Configuration(e.to_string()))
    }
}

#[async_trait]
pub trait DriverFactory: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create(&self, request: &DriverRequest) -> Result<FileDriver>;
}

/// Local filesystem, accepts no options
pub struct LocalFactory;

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct LocalDriverConfig {}

#[async_trait]
impl DriverFactory for LocalFactory {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn create(&self, request: &DriverRequest) -> Result<FileDriver> {
        let _: LocalDriverConfig = request.config()?;
        Ok(LocalFs::driver(PathBuf::from(&request.path), request.writes_enabled)
            .with_policy(request.policy))
    }
}

/// `[user@]host:path` over the system ssh client
pub struct SshFactory;

#[async_trait]
impl DriverFactory for SshFactory {
    fn name(&self) -> &'static str {
        "ssh"
    }

    async fn create(&self, request: &DriverRequest) -> Result<FileDriver> {
        let config: SshDriverConfig = request.config()?;
        let mut target = SshTarget::parse(&request.path)?;
        if target.user.is_none() {
            target.user = local_user_name();
        }

        let root = target.path.clone();
        let session = SshSession::connect(target, &config).await?;
        Ok(RemoteShell::new(Arc::new(session), config.use_sudo)
            .driver(root, request.writes_enabled)
            .with_policy(request.policy))
    }
}

#[cfg(unix)]
fn local_user_name() -> Option<String> {
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|user| user.name)
}

#[cfg(not(unix))]
fn local_user_name() -> Option<String> {
    std::env::var("USERNAME").ok()
}

/// Ordered list of path patterns; the first match supplies the driver
pub struct DriverRegistry {
    entries: Vec<(Regex, Box<dyn DriverFactory>)>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// `ssh` for `[user@]host:path`, `local` for anything else
    pub fn with_default_drivers() -> Self {
        let mut registry = Self::new();
        registry.register(SshTarget::pattern().clone(), Box::new(SshFactory));
        registry.register(
            Regex::new(".+").expect("catch-all pattern is valid"),
            Box::new(LocalFactory),
        );
        registry
    }

    pub fn register(&mut self, pattern: Regex, factory: Box<dyn DriverFactory>) {
        self.entries.push((pattern, factory));
    }

    pub fn resolve(&self, path: &str) -> Option<&dyn DriverFactory> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.is_match(path))
            .map(|(_, factory)| factory.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&dyn DriverFactory> {
        self.entries
            .iter()
            .find(|(_, factory)| factory.name() == name)
            .map(|(_, factory)| factory.as_ref())
    }

    pub fn list_drivers(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, f)| f.name()).collect()
    }

    /// Build a driver for `request.path`.
    ///
    /// A `name` entry in the options forces that driver instead of pattern
    /// matching; it is removed before the factory sees the options.
    pub async fn create(&self, mut request: DriverRequest) -> Result<FileDriver> {
        let forced = match request.options.remove("name") {
            Some(Value::String(name)) => Some(name),
            Some(other) => {
                return Err(DriverError::Configuration(format!(
                    "driver name must be a string, got {other}"
                )))
            }
            None => None,
        };

        let factory = match &forced {
            Some(name) => self.get(name).ok_or_else(|| {
                DriverError::Configuration(format!(
                    "unknown driver '{name}', available: {}",
                    self.list_drivers().join(", ")
                ))
            })?,
            None => self
                .resolve(&request.path)
                .ok_or_else(|| DriverError::InvalidTarget {
                    target: request.path.clone(),
                    reason: "no driver accepts this path".to_string(),
                })?,
        };

        debug!("Using {} driver for {}", factory.name(), request.path);
        factory.create(&request).await
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_default_drivers()
    }
}
