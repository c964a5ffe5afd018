//! Storage backend operating directly on the local filesystem

pub mod ownership;
pub mod permissions;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

use super::driver::FileDriver;
use super::error::{DriverError, Result};
use super::traits::{PathReader, PathWriter};
use crate::types::{FileMode, PathAttributes, PathType};

pub use ownership::{resolve_group, resolve_user};
pub use permissions::{get_mode, set_mode};

/// Local filesystem backend, implements both halves of the driver contract
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl LocalFs {
    /// Driver rooted at `root`; without writes every modification is a no-op
    pub fn driver(root: impl Into<PathBuf>, writes_enabled: bool) -> FileDriver {
        let backend = Arc::new(LocalFs);
        let writer: Option<Arc<dyn PathWriter>> = if writes_enabled {
            Some(backend.clone())
        } else {
            None
        };
        FileDriver::new("local", root, backend, writer)
    }
}

/// A path below a regular file (`ENOTDIR`) cannot exist either
fn is_missing(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
    )
}

#[async_trait]
impl PathReader for LocalFs {
    async fn path_type(&self, path: &Path) -> Result<PathType> {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if is_missing(&e) => return Ok(PathType::Absent),
            Err(e) => return Err(DriverError::from_io(path, e)),
        };

        let metadata = if metadata.file_type().is_symlink() {
            match tokio::fs::metadata(path).await {
                Ok(target) => target,
                // dangling link
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PathType::Other),
                Err(e) => return Err(DriverError::from_io(path, e)),
            }
        } else {
            metadata
        };

        Ok(if metadata.is_dir() {
            PathType::Directory
        } else if metadata.is_file() {
            PathType::File
        } else {
            PathType::Other
        })
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| DriverError::from_io(path, e))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|e| DriverError::from_io(path, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DriverError::from_io(path, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn attributes(&self, path: &Path) -> Result<PathAttributes> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| DriverError::from_io(path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Ok(PathAttributes::new()
                .with_owner(metadata.uid())
                .with_group(metadata.gid())
                .with_mode(FileMode::from_raw(metadata.mode())))
        }

        #[cfg(not(unix))]
        {
            let _ = metadata;
            Ok(PathAttributes::new()
                .with_owner(0)
                .with_group(0)
                .with_mode(get_mode(path).await?))
        }
    }
}

#[async_trait]
impl PathWriter for LocalFs {
    async fn write_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        tokio::fs::write(path, content)
            .await
            .map_err(|e| DriverError::from_io(path, e))
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(DriverError::from_io(path, e)),
        };

        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        };
        removed.map_err(|e| DriverError::from_io(path, e))
    }

    async fn mkdir_component(&self, path: &Path) -> Result<()> {
        match tokio::fs::create_dir(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
            Err(e) => Err(DriverError::from_io(path, e)),
        }
    }

    async fn set_attributes(&self, path: &Path, attributes: &PathAttributes) -> Result<()> {
        if let Some(mode) = attributes.mode {
            set_mode(path, mode).await?;
        }

        if attributes.owner.is_none() && attributes.group.is_none() {
            return Ok(());
        }

        #[cfg(unix)]
        {
            use nix::unistd::{chown, Gid, Uid};
            use std::os::unix::fs::MetadataExt;

            let current = tokio::fs::metadata(path)
                .await
                .map_err(|e| DriverError::from_io(path, e))?;

            let uid = match &attributes.owner {
                Some(owner) => resolve_user(owner)?,
                None => current.uid(),
            };
            let gid = match &attributes.group {
                Some(group) => resolve_group(group)?,
                None => current.gid(),
            };

            if uid == current.uid() && gid == current.gid() {
                trace!("Ownership already {uid}:{gid}: {}", path.display());
                return Ok(());
            }

            chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid))).map_err(|errno| {
                DriverError::from_io(path, std::io::Error::from_raw_os_error(errno as i32))
            })?;
        }

        #[cfg(not(unix))]
        {
            tracing::warn!(
                "File ownership changes are not supported on this platform: {}",
                path.display()
            );
        }

        Ok(())
    }
}
