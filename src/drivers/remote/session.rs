//! Transport used by the remote driver: anything that can run a single shell
//! command line on the remote host and report its exit status and output.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::drivers::error::{DriverError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Human readable name of the remote end, used in errors and logs
    fn host(&self) -> &str;

    /// Run one command line through the remote shell
    async fn execute_command(&self, command: &str) -> Result<CommandOutput>;

    /// Like [`Self::execute_command`], with `input` fed to the command's
    /// standard input
    async fn execute_command_with_input(
        &self,
        command: &str,
        input: &[u8],
    ) -> Result<CommandOutput>;
}

// A username must not start with '-' so that "thing/test@here.dir:name"
// style local paths are not mistaken for remote targets.
static SSH_TARGET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^-][A-Za-z0-9.@-]*\$?@)?([a-zA-Z0-9._\-]+):(/|/?[^/].*)?$")
        .expect("ssh target regex is valid")
});

/// A `[user@]host:path` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: Option<String>,
    pub host: String,
    pub path: PathBuf,
}

impl SshTarget {
    /// Pattern recognising `[user@]host:path` strings
    pub fn pattern() -> &'static Regex {
        &SSH_TARGET_REGEX
    }

    pub fn matches(target: &str) -> bool {
        SSH_TARGET_REGEX.is_match(target)
    }

    pub fn parse(target: &str) -> Result<Self> {
        let captures =
            SSH_TARGET_REGEX
                .captures(target)
                .ok_or_else(|| DriverError::InvalidTarget {
                    target: target.to_string(),
                    reason: "expected [user@]host:path".to_string(),
                })?;

        let user = captures
            .get(1)
            .map(|m| m.as_str().trim_end_matches('@').to_string());
        let host = captures[2].to_string();
        let path = captures
            .get(3)
            .map(|m| m.as_str())
            .filter(|p| !p.is_empty())
            .unwrap_or("./");

        Ok(Self {
            user,
            host,
            path: PathBuf::from(path),
        })
    }

    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

/// Options accepted by the ssh driver (`--target-driver KEY=VALUE`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshDriverConfig {
    /// Run every command under `sudo`; the login user needs passwordless sudo
    #[serde(default)]
    pub use_sudo: bool,
    pub port: Option<u16>,
    pub key_file: Option<PathBuf>,
    pub ssh_binary: Option<PathBuf>,
    /// Seconds to wait for the connection to be established
    pub connect_timeout: Option<u32>,
}

/// Session backed by the system OpenSSH client.
///
/// Connections are multiplexed through a control socket so every command of
/// a deployment reuses the same authenticated transport.
pub struct SshSession {
    target: SshTarget,
    destination: String,
    ssh_binary: PathBuf,
    base_args: Vec<String>,
}

impl SshSession {
    pub fn new(target: SshTarget, config: &SshDriverConfig) -> Result<Self> {
        let ssh_binary = match &config.ssh_binary {
            Some(binary) => binary.clone(),
            None => which::which("ssh").map_err(|e| {
                DriverError::Configuration(format!("ssh client not found in PATH: {e}"))
            })?,
        };

        let control_path = std::env::temp_dir().join(format!(
            "treeploy-{}-%r@%h:%p",
            std::process::id()
        ));

        let mut base_args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ControlMaster=auto".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", control_path.display()),
            "-o".to_string(),
            "ControlPersist=60".to_string(),
        ];
        if let Some(timeout) = config.connect_timeout {
            base_args.push("-o".to_string());
            base_args.push(format!("ConnectTimeout={timeout}"));
        }
        if let Some(port) = config.port {
            base_args.push("-p".to_string());
            base_args.push(port.to_string());
        }
        if let Some(key_file) = &config.key_file {
            base_args.push("-i".to_string());
            base_args.push(key_file.display().to_string());
        }

        Ok(Self {
            destination: target.destination(),
            target,
            ssh_binary,
            base_args,
        })
    }

    /// Open the session and check that commands can be run
    pub async fn connect(target: SshTarget, config: &SshDriverConfig) -> Result<Self> {
        let session = Self::new(target, config)?;
        let output = session.execute_command("true").await?;
        if !output.success() {
            return Err(DriverError::RemoteCommandFailed {
                host: session.destination.clone(),
                command: "true".to_string(),
                code: output.exit_code,
                stderr: format!("failed to connect: {}", output.stderr.trim()),
            });
        }

        info!("Connection to {} established", session.destination);
        Ok(session)
    }

    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    fn command(&self, command: &str) -> Command {
        let mut ssh = Command::new(&self.ssh_binary);
        ssh.args(&self.base_args).arg(&self.destination).arg(command);
        ssh
    }

    fn spawn_failed(&self, source: std::io::Error) -> DriverError {
        DriverError::Io {
            path: self.ssh_binary.clone(),
            source,
        }
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    fn host(&self) -> &str {
        &self.destination
    }

    async fn execute_command(&self, command: &str) -> Result<CommandOutput> {
        debug!("Executing command on {}: {}", self.destination, command);

        let output = self
            .command(command)
            .output()
            .await
            .map_err(|e| self.spawn_failed(e))?;

        Ok(CommandOutput::from(output))
    }

    async fn execute_command_with_input(
        &self,
        command: &str,
        input: &[u8],
    ) -> Result<CommandOutput> {
        debug!(
            "Executing command on {} with {} bytes of input: {}",
            self.destination,
            input.len(),
            command
        );

        let mut child = self
            .command(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_failed(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DriverError::Configuration("ssh stdin is not piped".to_string()))?;
        let feed = async move {
            stdin.write_all(input).await?;
            stdin.shutdown().await
        };

        // stdin is written while output is collected so neither pipe fills up
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| self.spawn_failed(e))?;
        if let Err(e) = fed {
            // the command may exit early on purpose; its status decides
            debug!("Standard input closed early on {}: {}", self.destination, e);
        }

        Ok(CommandOutput::from(output))
    }
}
