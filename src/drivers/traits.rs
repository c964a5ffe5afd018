/// Capability traits implemented by every storage backend
use async_trait::async_trait;
use std::path::Path;

use super::error::Result;
use crate::types::{PathAttributes, PathType};

/// Queries that can be run against a filesystem-like backend
#[async_trait]
pub trait PathReader: Send + Sync {
    /// Never fails for a merely absent path; returns [`PathType::Absent`]
    async fn path_type(&self, path: &Path) -> Result<PathType>;

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Names of the entries in a directory, excluding `.` and `..`
    async fn read_dir(&self, path: &Path) -> Result<Vec<String>>;

    /// Fully populated attributes (owner, group and mode all set)
    async fn attributes(&self, path: &Path) -> Result<PathAttributes>;
}

/// Modifications that can be applied to a filesystem-like backend.
///
/// Implementations perform the raw operation only; conflict policy and
/// recursive directory creation live in [`super::FileDriver`].
#[async_trait]
pub trait PathWriter: Send + Sync {
    async fn write_file(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Recursive delete, succeeds if the path is already absent
    async fn remove(&self, path: &Path) -> Result<()>;

    /// Create a single directory whose parent already exists
    async fn mkdir_component(&self, path: &Path) -> Result<()>;

    /// Apply only the fields present in `attributes`
    async fn set_attributes(&self, path: &Path, attributes: &PathAttributes) -> Result<()>;
}
