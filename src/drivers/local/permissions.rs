//! Permission bit handling for the local driver

use std::path::Path;

use crate::drivers::error::{DriverError, Result};
use crate::types::FileMode;

/// Current permission bits of `path`
pub async fn get_mode(path: &Path) -> Result<FileMode> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| DriverError::from_io(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Ok(FileMode::from_raw(metadata.permissions().mode()))
    }

    #[cfg(not(unix))]
    {
        // Only the read-only flag exists here
        if metadata.permissions().readonly() {
            Ok(FileMode::from_raw(0o444))
        } else {
            Ok(FileMode::from_raw(0o644))
        }
    }
}

/// Apply `mode` to `path`, skipping the syscall when it already matches
pub async fn set_mode(path: &Path, mode: FileMode) -> Result<()> {
    if get_mode(path).await? == mode {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(mode.bits());
        tokio::fs::set_permissions(path, permissions)
            .await
            .map_err(|e| DriverError::from_io(path, e))?;
    }

    #[cfg(not(unix))]
    {
        let mut permissions = tokio::fs::metadata(path)
            .await
            .map_err(|e| DriverError::from_io(path, e))?
            .permissions();
        permissions.set_readonly(mode.bits() & 0o200 == 0);
        tokio::fs::set_permissions(path, permissions)
            .await
            .map_err(|e| DriverError::from_io(path, e))?;
    }

    Ok(())
}
