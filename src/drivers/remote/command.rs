//! Shell command lines issued by the remote driver. Pure string composition.

use base64::Engine;
use std::path::Path;

use crate::types::{FileMode, IdSpec};

/// Cheap command run once under escalation before any privileged command
pub const ESCALATION_PROBE: &str = "sudo -n /bin/true";

pub fn quote_path(path: &Path) -> String {
    shell_words::quote(&path.to_string_lossy()).into_owned()
}

/// Run the whole command line as root.
///
/// Only prefixing `sudo` would leave everything after the first pipe or
/// redirection running as the login user.
pub fn escalate(command: &str) -> String {
    format!("sudo -n /bin/sh -c {}", shell_words::quote(command))
}

pub fn read_file(path: &Path) -> String {
    format!("cat -- {}", quote_path(path))
}

pub fn list_dir(path: &Path) -> String {
    format!("ls -1a -- {}", quote_path(path))
}

/// Symlinks are followed by both `stat` queries, like the local driver does
pub fn stat_type(path: &Path) -> String {
    format!("stat -L --format=%F -- {}", quote_path(path))
}

pub fn stat_attributes(path: &Path) -> String {
    format!(
        "stat -L {} -- {}",
        shell_words::quote("--format=%u|%g|%f"),
        quote_path(path)
    )
}

pub fn make_dir(path: &Path) -> String {
    format!("mkdir -p -- {}", quote_path(path))
}

pub fn remove(path: &Path) -> String {
    format!("rm -rf -- {}", quote_path(path))
}

/// Decodes standard input into `path`; pair with [`encode_content`]
pub fn write_file(path: &Path) -> String {
    format!("base64 -d > {}", quote_path(path))
}

/// Content travels base64 encoded so any byte sequence survives the transport
pub fn encode_content(content: &[u8]) -> Vec<u8> {
    base64::engine::general_purpose::STANDARD
        .encode(content)
        .into_bytes()
}

pub fn chown(owner: &IdSpec, path: &Path) -> String {
    format!(
        "chown -- {} {}",
        shell_words::quote(&owner.to_string()),
        quote_path(path)
    )
}

pub fn chgrp(group: &IdSpec, path: &Path) -> String {
    format!(
        "chgrp -- {} {}",
        shell_words::quote(&group.to_string()),
        quote_path(path)
    )
}

pub fn chmod(mode: FileMode, path: &Path) -> String {
    format!("chmod -- {mode} {}", quote_path(path))
}
