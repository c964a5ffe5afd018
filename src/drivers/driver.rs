//! The storage driver handed to the deploy engine: one reader, an optional
//! writer, and the conflict policy bound at construction time.

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::error::{DriverError, Result};
use super::traits::{PathReader, PathWriter};
use crate::types::{PathAttributes, PathType};

/// What a driver may destroy in order to reach the desired state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WritePolicy {
    overwrite: bool,
    force: bool,
}

impl WritePolicy {
    /// `force` implies `overwrite`
    pub fn new(overwrite: bool, force: bool) -> Self {
        Self {
            overwrite: overwrite || force,
            force,
        }
    }

    /// Replace the content of an existing entity of the same kind
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Remove an entity of the wrong kind (file vs directory)
    pub fn force(&self) -> bool {
        self.force
    }
}

#[derive(Clone)]
pub struct FileDriver {
    name: &'static str,
    root: PathBuf,
    reader: Arc<dyn PathReader>,
    writer: Option<Arc<dyn PathWriter>>,
    policy: WritePolicy,
}

impl fmt::Debug for FileDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDriver")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("writes_enabled", &self.writes_enabled())
            .field("policy", &self.policy)
            .finish()
    }
}

impl FileDriver {
    /// Without a writer every modifying operation is silently a no-op
    pub fn new(
        name: &'static str,
        root: impl Into<PathBuf>,
        reader: Arc<dyn PathReader>,
        writer: Option<Arc<dyn PathWriter>>,
    ) -> Self {
        let root = root.into();
        if writer.is_none() {
            info!("Creating read only {} driver for {}", name, root.display());
        }

        Self {
            name,
            root,
            reader,
            writer,
            policy: WritePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Drop the writer, turning every modification into a no-op
    pub fn into_read_only(mut self) -> Self {
        if self.writer.take().is_some() {
            info!(
                "Disabling writes on {} driver for {}",
                self.name,
                self.root.display()
            );
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn writes_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub async fn path_type(&self, path: &Path) -> Result<PathType> {
        trace!("Retrieving type of path: {}", path.display());
        self.reader.path_type(path).await
    }

    pub async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        trace!("Reading file: {}", path.display());
        self.reader.read_file(path).await
    }

    pub async fn read_dir(&self, path: &Path) -> Result<Vec<String>> {
        trace!("Reading directory contents: {}", path.display());
        self.reader.read_dir(path).await
    }

    pub async fn attributes(&self, path: &Path) -> Result<PathAttributes> {
        trace!("Retrieving path attributes: {}", path.display());
        self.reader.attributes(path).await
    }

    /// Ensure `path` exists as a directory, creating parents first.
    ///
    /// A component that exists as something other than a directory is
    /// removed when the policy allows `force`, otherwise this fails.
    pub fn mkdir<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>> {
        async move {
            let path_type = self.path_type(path).await?;
            if path_type == PathType::Directory {
                return Ok(());
            }

            debug!("Creating directory: {}", path.display());

            if path_type.exists() {
                if !self.policy.force() {
                    return Err(DriverError::PathConflict {
                        operation: "create directory",
                        path: path.to_path_buf(),
                        expected: PathType::Directory,
                        actual: path_type,
                        required_flag: "force",
                    });
                }
                info!(
                    "Replacing conflicting {} with directory: {}",
                    path_type,
                    path.display()
                );
                self.remove(path).await?;
            }

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                self.mkdir(parent).await?;
            }

            match &self.writer {
                Some(writer) => writer.mkdir_component(path).await,
                None => Ok(()),
            }
        }
        .boxed()
    }

    /// Write `content` to `path`, subject to the overwrite/force policy.
    ///
    /// An existing file whose content already matches is left alone and is
    /// not treated as a conflict.
    pub async fn write_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        match self.path_type(path).await? {
            PathType::Absent => {}
            PathType::File => {
                let unchanged = matches!(
                    self.read_file(path).await,
                    Ok(existing) if existing == content
                );
                if unchanged {
                    debug!("Content unchanged, not rewriting: {}", path.display());
                    return Ok(());
                }
                if !self.policy.overwrite() {
                    return Err(DriverError::PathConflict {
                        operation: "write file",
                        path: path.to_path_buf(),
                        expected: PathType::Absent,
                        actual: PathType::File,
                        required_flag: "overwrite",
                    });
                }
                info!("Overwriting existing file: {}", path.display());
            }
            actual => {
                if !self.policy.force() {
                    return Err(DriverError::PathConflict {
                        operation: "write file",
                        path: path.to_path_buf(),
                        expected: PathType::File,
                        actual,
                        required_flag: "force",
                    });
                }
                info!(
                    "Replacing conflicting {} with file: {}",
                    actual,
                    path.display()
                );
                self.remove(path).await?;
            }
        }

        debug!("Writing file: {} ({} bytes)", path.display(), content.len());
        match &self.writer {
            Some(writer) => writer.write_file(path, content).await,
            None => Ok(()),
        }
    }

    pub async fn remove(&self, path: &Path) -> Result<()> {
        debug!("Deleting path: {}", path.display());
        match &self.writer {
            Some(writer) => writer.remove(path).await,
            None => Ok(()),
        }
    }

    pub async fn set_attributes(&self, path: &Path, attributes: &PathAttributes) -> Result<()> {
        if attributes.is_empty() {
            return Ok(());
        }

        debug!("Setting path attributes on {}: {}", path.display(), attributes);
        match &self.writer {
            Some(writer) => writer.set_attributes(path, attributes).await,
            None => Ok(()),
        }
    }
}
