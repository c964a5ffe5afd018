//! Tree descriptors: YAML lists of empty files and directories, with
//! ownership and permissions, materialized on the target.
//!
//! ```yaml
//! - logs/
//! - run:
//!     mode: "0700"
//!     children:
//!       - app.pid
//! - /config.yaml:
//!     owner: 1000
//! ```

pub mod entry;
pub mod error;

use futures::future::{BoxFuture, FutureExt};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::drivers::{DriverError, FileDriver};
use crate::types::{PathAttributes, PathType};

pub use entry::{parse_entries, EntryKind, TreeEntry};
pub use error::{DescriptorError, Result};

/// A parsed descriptor file
#[derive(Debug, Clone, PartialEq)]
pub struct TreeDescriptor {
    file: PathBuf,
    entries: Vec<TreeEntry>,
}

impl TreeDescriptor {
    /// Parse `content` read from `file`; `directory` is where it will apply
    pub fn parse(file: &Path, directory: &Path, content: &str) -> Result<Self> {
        Ok(Self {
            file: file.to_path_buf(),
            entries: parse_entries(file, directory, content)?,
        })
    }

    /// Create every described entry below `root` on `target`.
    ///
    /// Existing files keep their content; only their attributes are
    /// reapplied. Entries of the wrong kind are handled by the driver's
    /// overwrite/force policy.
    pub async fn apply(&self, target: &FileDriver, root: &Path) -> Result<()> {
        trace!(
            "Applying tree descriptor {} to {}",
            self.file.display(),
            root.display()
        );
        target.mkdir(root).await?;
        build(target, root, &self.entries, &PathAttributes::default()).await?;
        Ok(())
    }
}

fn build<'a>(
    target: &'a FileDriver,
    directory: &'a Path,
    entries: &'a [TreeEntry],
    defaults: &'a PathAttributes,
) -> BoxFuture<'a, std::result::Result<(), DriverError>> {
    async move {
        for entry in entries {
            let path = directory.join(&entry.name);
            let attributes = entry.attributes.overlay(defaults);

            match entry.kind {
                EntryKind::Directory => target.mkdir(&path).await?,
                EntryKind::File => {
                    if entry.name.contains('/') {
                        if let Some(parent) = path.parent() {
                            target.mkdir(parent).await?;
                        }
                    }
                    if target.path_type(&path).await? == PathType::File {
                        debug!("File already exists, keeping content: {}", path.display());
                    } else {
                        target.write_file(&path, b"").await?;
                    }
                }
            }

            target.set_attributes(&path, &attributes).await?;

            if !entry.children.is_empty() {
                build(target, &path, &entry.children, &attributes).await?;
            }
        }
        Ok(())
    }
    .boxed()
}
