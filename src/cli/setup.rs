use tracing::{warn, Level};

/// -v count to log level: errors only, warnings, debug, then trace
pub fn verbosity_level(count: u8) -> Level {
    match count {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_logging(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_max_level(verbosity_level(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(unix)]
pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn running_as_root() -> bool {
    false
}

/// Ownership changes generally need root; say so once unless silenced
pub fn warn_if_not_root(noroot: bool) {
    if !noroot && !running_as_root() {
        warn!("Not running as root, changing file ownership will probably fail (use --noroot to silence)");
    }
}
