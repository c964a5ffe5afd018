//! The shell command driver against a real directory, through a local `sh`

use crate::suites::deploy::helpers::{
    assertions::*, builders::TreeBuilder, environment::TestEnvironment, shell::LocalShellSession,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use treeploy::deploy::{treeploy, DeployError, DeployOptions};
use treeploy::drivers::{DriverError, FileDriver, LocalFs, RemoteShell};
use treeploy::template::TemplateValues;
use treeploy::types::PathType;

fn shell_driver(session: &Arc<LocalShellSession>, root: &Path, writes_enabled: bool) -> FileDriver {
    RemoteShell::new(session.clone(), false).driver(root, writes_enabled)
}

#[tokio::test]
async fn test_deploy_onto_shell_target() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("a.txt", "hi")
        .file("bin/data.bin", [0u8, 255, b'\'', b'\n', b'$'])
        .file("dir/b.txt.dot", "Name: {{=name}}")
        .file("tree.yaml", "- logs/\n- empty.txt\n")
        .build();

    let session = Arc::new(LocalShellSession::new());
    let values = TemplateValues::new().with("it", json!({"name": "Bob"}));
    treeploy(
        env.source_driver(),
        shell_driver(&session, &env.target(), true),
        DeployOptions::new().with_template_values(values),
    )
    .await
    .unwrap();

    assert_file_content(env.target_path("a.txt"), "hi");
    assert_eq!(
        std::fs::read(env.target_path("bin/data.bin")).unwrap(),
        vec![0u8, 255, b'\'', b'\n', b'$']
    );
    assert_file_content(env.target_path("dir/b.txt"), "Name: Bob");
    assert_is_directory(env.target_path("logs"));
    assert_file_content(env.target_path("empty.txt"), "");

    let commands = session.commands();
    assert!(commands.iter().any(|c| c.starts_with("base64 -d > ")));
    assert!(!commands.iter().any(|c| c.starts_with("sudo")));
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_target_receives_modes() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file_with_mode("run.sh", "#!/bin/sh\n", 0o750)
        .file("tree.yaml", "- secret:\n    mode: \"0600\"\n")
        .build();

    let session = Arc::new(LocalShellSession::new());
    treeploy(
        env.source_driver(),
        shell_driver(&session, &env.target(), true),
        DeployOptions::new(),
    )
    .await
    .unwrap();

    assert_mode(env.target_path("run.sh"), 0o750);
    assert_mode(env.target_path("secret"), 0o600);
}

#[tokio::test]
async fn test_shell_source_onto_local_target() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("nested/deeper/file with spaces.txt", "quoted")
        .file("it's.conf", "apostrophe")
        .build();

    let session = Arc::new(LocalShellSession::new());
    treeploy(
        shell_driver(&session, &env.source(), false),
        LocalFs::driver(env.target(), true),
        DeployOptions::new(),
    )
    .await
    .unwrap();

    assert_file_content(env.target_path("nested/deeper/file with spaces.txt"), "quoted");
    assert_file_content(env.target_path("it's.conf"), "apostrophe");
}

#[tokio::test]
async fn test_shell_conflicts_follow_policy() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("app.conf", "new").build();
    TreeBuilder::new(env.target()).file("app.conf", "old").build();

    let session = Arc::new(LocalShellSession::new());
    let err = treeploy(
        env.source_driver(),
        shell_driver(&session, &env.target(), true),
        DeployOptions::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        DeployError::Driver(DriverError::PathConflict {
            required_flag: "overwrite",
            ..
        })
    ));

    treeploy(
        env.source_driver(),
        shell_driver(&session, &env.target(), true),
        DeployOptions::new().with_overwrite(true),
    )
    .await
    .unwrap();
    assert_file_content(env.target_path("app.conf"), "new");
}

#[tokio::test]
async fn test_shell_dryrun_only_reads() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("a.txt", "hi").build();

    let session = Arc::new(LocalShellSession::new());
    treeploy(
        env.source_driver(),
        shell_driver(&session, &env.target(), true),
        DeployOptions::new().with_dryrun(true),
    )
    .await
    .unwrap();

    assert_not_exists(env.target());
    for command in session.commands() {
        assert!(
            command.starts_with("stat ") || command.starts_with("cat ") || command.starts_with("ls "),
            "unexpected command in dry run: {command}"
        );
    }
}

#[tokio::test]
async fn test_shell_path_types() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("file.txt", "x")
        .dir("dir")
        .build();

    let session = Arc::new(LocalShellSession::new());
    let driver = shell_driver(&session, &env.source(), false);

    assert_eq!(
        driver.path_type(&env.source_path("file.txt")).await.unwrap(),
        PathType::File
    );
    assert_eq!(
        driver.path_type(&env.source_path("dir")).await.unwrap(),
        PathType::Directory
    );
    assert_eq!(
        driver.path_type(&env.source_path("missing")).await.unwrap(),
        PathType::Absent
    );

    let mut names = driver.read_dir(&env.source()).await.unwrap();
    names.sort();
    assert_eq!(names, vec!["dir", "file.txt"]);

    let err = driver
        .read_file(&env.source_path("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::NotFound { .. }));
}

#[tokio::test]
async fn test_shell_target_receives_large_file() {
    let env = TestEnvironment::new();
    let content: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    TreeBuilder::new(env.source())
        .file("blob.bin", &content)
        .build();

    let session = Arc::new(LocalShellSession::new());
    treeploy(
        env.source_driver(),
        shell_driver(&session, &env.target(), true),
        DeployOptions::new(),
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read(env.target_path("blob.bin")).unwrap(), content);
    assert!(session.commands().iter().all(|c| c.len() < 4096));
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_source_follows_symlinks() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file_with_mode("real.conf", "linked", 0o640)
        .build();
    std::os::unix::fs::symlink(env.source_path("real.conf"), env.source_path("alias.conf"))
        .unwrap();

    let session = Arc::new(LocalShellSession::new());
    let driver = shell_driver(&session, &env.source(), false);
    assert_eq!(
        driver.path_type(&env.source_path("alias.conf")).await.unwrap(),
        PathType::File
    );

    treeploy(driver, LocalFs::driver(env.target(), true), DeployOptions::new())
        .await
        .unwrap();
    assert_file_content(env.target_path("alias.conf"), "linked");
    assert_mode(env.target_path("alias.conf"), 0o640);
}
