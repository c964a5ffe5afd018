//! The `treeploy` binary end to end

use crate::suites::deploy::helpers::{assertions::*, builders::TreeBuilder, environment::TestEnvironment};
use std::process::{Command, Output};

fn treeploy(env: &TestEnvironment, extra: &[&str]) -> Output {
    let source = env.source();
    let target = env.target();
    let mut command = Command::new(env!("CARGO_BIN_EXE_treeploy"));
    command.arg("--noroot").args(extra).arg(&source).arg(&target);
    command.output().expect("Failed to run treeploy")
}

#[test]
fn test_cli_deploys_with_model() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("a.txt", "hi")
        .file("dir/b.txt.dot", "Name: {{=name}} port={{= web.port }}")
        .build();

    let output = treeploy(&env, &["--model", "name=Bob", "--model", "web.port=8080"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_file_content(env.target_path("a.txt"), "hi");
    assert_file_content(env.target_path("dir/b.txt"), "Name: Bob port=8080");
}

#[test]
fn test_cli_model_file() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("site.conf.dot", "{{= site.domain }}:{{= site.port }}")
        .build();
    let model = env.root().join("site.yaml");
    std::fs::write(&model, "domain: example.com\nport: 80\n").unwrap();

    let model_argument = format!("site={}", model.display());
    let output = treeploy(&env, &["--modelfile", &model_argument]);
    assert!(output.status.success());

    assert_file_content(env.target_path("site.conf"), "example.com:80");
}

#[test]
fn test_cli_model_command() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("release.dot", "{{= build.release }}")
        .build();

    let output = treeploy(&env, &["--modelcmd", r#"build=echo '{"release": 42}'"#]);
    assert!(output.status.success());

    assert_file_content(env.target_path("release"), "42");
}

#[test]
fn test_cli_dryrun() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("a.txt", "hi").build();

    let output = treeploy(&env, &["-n"]);
    assert!(output.status.success());
    assert_not_exists(env.target());
}

#[test]
fn test_cli_conflict_exits_with_error() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("a.txt", "new").build();
    TreeBuilder::new(env.target()).file("a.txt", "old").build();

    let output = treeploy(&env, &[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--overwrite"), "stderr: {stderr}");
    assert_file_content(env.target_path("a.txt"), "old");

    let output = treeploy(&env, &["--overwrite"]);
    assert!(output.status.success());
    assert_file_content(env.target_path("a.txt"), "new");
}

#[test]
fn test_cli_rejects_unknown_driver_option() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("a.txt", "hi").build();

    let output = treeploy(&env, &["--target-driver", "colour=blue"]);
    assert_eq!(output.status.code(), Some(1));
    assert_not_exists(env.target());
}

#[test]
fn test_cli_unsupported_model_file() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("a.txt", "hi").build();

    let output = treeploy(&env, &["--modelfile", "model.toml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("model.toml"));
}
