//! Storage drivers: the filesystem contract the deploy engine works against,
//! and its local and remote implementations.

pub mod driver;
pub mod error;
pub mod local;
pub mod registry;
pub mod remote;
pub mod traits;

pub use driver::{FileDriver, WritePolicy};
pub use error::{DriverError, Result};
pub use local::LocalFs;
pub use registry::{DriverFactory, DriverRegistry, DriverRequest, LocalFactory, SshFactory};
pub use remote::{CommandOutput, RemoteSession, RemoteShell, SshDriverConfig, SshSession, SshTarget};
pub use traits::{PathReader, PathWriter};
