//! Test suite for the deploy engine
//!
//! - Integration tests running real deployments between temporary directories
//! - Remote driver tests over a local shell session
//! - Property-based tests for filename classification and mode parsing


pub use helpers::{
    assertions::*,
    builders::TreeBuilder,
    environment::TestEnvironment,
    shell::LocalShellSession,
};
