//! Storage backend that manipulates a remote filesystem by issuing shell
//! commands over an established session.
//!
//! Shell commands are used rather than a file-transfer subsystem so that a
//! non-root login can still make root-owned changes through `sudo`. The
//! login user must be allowed to run `sudo` without a password.

pub mod command;
pub mod session;
pub mod stat;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use super::driver::FileDriver;
use super::error::{DriverError, Result};
use super::traits::{PathReader, PathWriter};
use crate::types::{IdSpec, PathAttributes, PathType};

pub use session::{CommandOutput, RemoteSession, SshDriverConfig, SshSession, SshTarget};

pub struct RemoteShell {
    session: Arc<dyn RemoteSession>,
    use_sudo: bool,
    escalation_verified: AtomicBool,
}

impl RemoteShell {
    pub fn new(session: Arc<dyn RemoteSession>, use_sudo: bool) -> Self {
        Self {
            session,
            use_sudo,
            escalation_verified: AtomicBool::new(false),
        }
    }

    /// Driver rooted at `root`; without writes every modification is a no-op
    pub fn driver(self, root: impl Into<PathBuf>, writes_enabled: bool) -> FileDriver {
        let backend = Arc::new(self);
        let writer: Option<Arc<dyn PathWriter>> = if writes_enabled {
            Some(backend.clone())
        } else {
            None
        };
        FileDriver::new("ssh", root, backend, writer)
    }

    pub fn host(&self) -> &str {
        self.session.host()
    }

    // A failed sudo and a missing path both exit with status 1, so without
    // this probe every path would look absent and mkdir would never finish.
    async fn ensure_escalation(&self) -> Result<()> {
        if self.escalation_verified.load(Ordering::Acquire) {
            return Ok(());
        }

        let output = self
            .session
            .execute_command(command::ESCALATION_PROBE)
            .await?;
        if !output.success() {
            return Err(DriverError::PrivilegeEscalationFailed {
                host: self.host().to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        debug!("Privilege escalation available on {}", self.host());
        self.escalation_verified.store(true, Ordering::Release);
        Ok(())
    }

    async fn run(&self, command: &str) -> Result<CommandOutput> {
        if self.use_sudo {
            self.ensure_escalation().await?;
            self.session
                .execute_command(&command::escalate(command))
                .await
        } else {
            self.session.execute_command(command).await
        }
    }

    async fn run_with_input(&self, command: &str, input: &[u8]) -> Result<CommandOutput> {
        if self.use_sudo {
            self.ensure_escalation().await?;
            self.session
                .execute_command_with_input(&command::escalate(command), input)
                .await
        } else {
            self.session.execute_command_with_input(command, input).await
        }
    }

    /// Like [`Self::run`] but a non-zero exit status is an error
    async fn run_checked(&self, command: &str) -> Result<CommandOutput> {
        let output = self.run(command).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(self.command_failed(command, &output))
        }
    }

    fn command_failed(&self, command: &str, output: &CommandOutput) -> DriverError {
        DriverError::RemoteCommandFailed {
            host: self.host().to_string(),
            command: command.to_string(),
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        }
    }
}

fn warn_on_name(kind: &str, id: &IdSpec) {
    if id.numeric().is_none() {
        warn!(
            "{kind} ids should be preferred over names to ensure correct operation on \
             hosts where the {kind} does not exist, got: {id}"
        );
    }
}

#[async_trait]
impl PathReader for RemoteShell {
    /// Known limitation: a path that exists but cannot be seen by the
    /// current identity is reported as [`PathType::Absent`], since `stat`
    /// fails the same way in both cases.
    async fn path_type(&self, path: &Path) -> Result<PathType> {
        let output = self.run(&command::stat_type(path)).await?;
        if output.success() {
            Ok(stat::parse_file_type(&output.stdout_text()))
        } else {
            Ok(PathType::Absent)
        }
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let command = command::read_file(path);
        let output = self.run(&command).await?;
        if output.success() {
            return Ok(output.stdout);
        }

        if output.stderr.contains("No such file") {
            Err(DriverError::NotFound {
                path: path.to_path_buf(),
            })
        } else if output.stderr.contains("Permission denied") {
            Err(DriverError::AccessDenied {
                path: path.to_path_buf(),
            })
        } else {
            Err(self.command_failed(&command, &output))
        }
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>> {
        let output = self.run_checked(&command::list_dir(path)).await?;
        Ok(output
            .stdout_text()
            .lines()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .map(str::to_string)
            .collect())
    }

    async fn attributes(&self, path: &Path) -> Result<PathAttributes> {
        let output = self.run_checked(&command::stat_attributes(path)).await?;
        stat::parse_attributes(path, &output.stdout_text())
    }
}

#[async_trait]
impl PathWriter for RemoteShell {
    async fn write_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        let command = command::write_file(path);
        let output = self
            .run_with_input(&command, &command::encode_content(content))
            .await?;
        if output.success() {
            Ok(())
        } else {
            Err(self.command_failed(&command, &output))
        }
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        self.run_checked(&command::remove(path)).await.map(|_| ())
    }

    async fn mkdir_component(&self, path: &Path) -> Result<()> {
        self.run_checked(&command::make_dir(path)).await.map(|_| ())
    }

    async fn set_attributes(&self, path: &Path, attributes: &PathAttributes) -> Result<()> {
        if let Some(owner) = &attributes.owner {
            warn_on_name("user", owner);
            self.run_checked(&command::chown(owner, path)).await?;
        }
        if let Some(group) = &attributes.group {
            warn_on_name("group", group);
            self.run_checked(&command::chgrp(group, path)).await?;
        }
        if let Some(mode) = attributes.mode {
            self.run_checked(&command::chmod(mode, path)).await?;
        }
        Ok(())
    }
}
