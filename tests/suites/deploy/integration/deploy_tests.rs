//! Traversal, classification and conflict policy

use crate::suites::deploy::helpers::{assertions::*, builders::TreeBuilder, environment::TestEnvironment};
use serde_json::json;
use treeploy::deploy::{DeployError, DeployOptions};
use treeploy::drivers::DriverError;
use treeploy::template::TemplateValues;

fn bob() -> TemplateValues {
    TemplateValues::new().with("it", json!({"name": "Bob"}))
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("a.txt", "hi")
        .file("dir/b.txt.dot", "Name: {{=name}}")
        .build();

    let summary = env
        .deploy(DeployOptions::new().with_template_values(bob()))
        .await
        .unwrap();

    assert_file_content(env.target_path("a.txt"), "hi");
    assert_file_content(env.target_path("dir/b.txt"), "Name: Bob");
    assert_not_exists(env.target_path("dir/b.txt.dot"));
    assert_eq!(summary.files_copied, 1);
    assert_eq!(summary.templates_rendered, 1);
    assert!(!summary.dryrun);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file_with_mode("bin/run.sh", "#!/bin/sh\nexec app\n", 0o755)
        .file("etc/app.conf.dot", "user={{= it.name }}\n")
        .file("tree.yaml", "- var/log/\n- var/run/app.pid:\n    mode: \"0600\"\n")
        .build();

    let options = DeployOptions::new().with_template_values(bob());
    env.deploy(options.clone()).await.unwrap();
    let first = env.snapshot_target();

    // no --overwrite needed when nothing changed
    env.deploy(options).await.unwrap();
    let second = env.snapshot_target();

    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[tokio::test]
async fn test_changed_file_requires_overwrite() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("app.conf", "new").build();
    TreeBuilder::new(env.target()).file("app.conf", "old").build();

    let err = env.deploy_default().await.unwrap_err();
    match err {
        DeployError::Driver(DriverError::PathConflict {
            path,
            required_flag,
            ..
        }) => {
            assert_eq!(path, env.target_path("app.conf"));
            assert_eq!(required_flag, "overwrite");
        }
        other => panic!("expected a conflict, got {other:?}"),
    }
    assert_file_content(env.target_path("app.conf"), "old");

    env.deploy(DeployOptions::new().with_overwrite(true))
        .await
        .unwrap();
    assert_file_content(env.target_path("app.conf"), "new");
}

#[tokio::test]
async fn test_force_also_overwrites() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("app.conf", "new").build();
    TreeBuilder::new(env.target()).file("app.conf", "old").build();

    env.deploy(DeployOptions::new().with_force(true)).await.unwrap();
    assert_file_content(env.target_path("app.conf"), "new");
}

#[tokio::test]
async fn test_file_over_directory_requires_force() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("data", "file now").build();
    TreeBuilder::new(env.target()).file("data/old.txt", "was a dir").build();

    for options in [DeployOptions::new(), DeployOptions::new().with_overwrite(true)] {
        let err = env.deploy(options).await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::Driver(DriverError::PathConflict {
                required_flag: "force",
                ..
            })
        ));
        assert_is_directory(env.target_path("data"));
    }

    env.deploy(DeployOptions::new().with_force(true)).await.unwrap();
    assert_file_content(env.target_path("data"), "file now");
}

#[tokio::test]
async fn test_directory_over_file_requires_force() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("conf.d/a.conf", "a").build();
    TreeBuilder::new(env.target()).file("conf.d", "was a file").build();

    let err = env.deploy_default().await.unwrap_err();
    assert!(matches!(
        err,
        DeployError::Driver(DriverError::PathConflict {
            required_flag: "force",
            ..
        })
    ));

    env.deploy(DeployOptions::new().with_force(true)).await.unwrap();
    assert_file_content(env.target_path("conf.d/a.conf"), "a");
}

#[tokio::test]
async fn test_dryrun_writes_nothing() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("a.txt", "hi")
        .file("dir/b.txt.dot", "Name: {{=name}}")
        .file("tree.yaml", "- logs/\n")
        .build();

    let summary = env
        .deploy(
            DeployOptions::new()
                .with_dryrun(true)
                .with_template_values(bob()),
        )
        .await
        .unwrap();

    assert_not_exists(env.target());
    assert!(summary.dryrun);
    assert_eq!(summary.files_copied, 1);
    assert_eq!(summary.templates_rendered, 1);
    assert_eq!(summary.descriptors_applied, 1);
}

#[tokio::test]
async fn test_dryrun_leaves_existing_target_alone() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("app.conf", "new").build();
    TreeBuilder::new(env.target()).file("app.conf", "old").build();

    env.deploy(DeployOptions::new().with_dryrun(true).with_overwrite(true))
        .await
        .unwrap();
    assert_file_content(env.target_path("app.conf"), "old");
}

#[tokio::test]
async fn test_editor_artifacts_are_skipped() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("app.conf", "keep")
        .file("app.conf~", "backup")
        .file("#app.conf#", "autosave")
        .file(".#app.conf", "lock")
        .build();

    let summary = env.deploy_default().await.unwrap();

    assert_file_content(env.target_path("app.conf"), "keep");
    assert_not_exists(env.target_path("app.conf~"));
    assert_not_exists(env.target_path("#app.conf#"));
    assert_not_exists(env.target_path(".#app.conf"));
    assert_eq!(summary.entries_skipped, 3);
}

#[tokio::test]
async fn test_bare_dot_file_is_copied_verbatim() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file(".dot", "{{= not rendered }}")
        .build();

    env.deploy_default().await.unwrap();
    assert_file_content(env.target_path(".dot"), "{{= not rendered }}");
}

#[tokio::test]
async fn test_single_file_source() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("motd", "welcome\n").build();

    env.deploy_path("motd", "etc/motd", DeployOptions::new())
        .await
        .unwrap();
    assert_file_content(env.target_path("etc/motd"), "welcome\n");
}

#[tokio::test]
async fn test_single_file_below_existing_file_needs_force() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source()).file("motd", "welcome\n").build();
    TreeBuilder::new(env.target()).file("etc", "not a directory").build();

    let err = env
        .deploy_path("motd", "etc/motd", DeployOptions::new())
        .await
        .unwrap_err();
    assert!(
        matches!(err, DeployError::Driver(DriverError::PathConflict { required_flag: "force", .. })),
        "got {err:?}"
    );

    env.deploy_path("motd", "etc/motd", DeployOptions::new().with_force(true))
        .await
        .unwrap();
    assert_file_content(env.target_path("etc/motd"), "welcome\n");
}

#[tokio::test]
async fn test_single_template_source_keeps_given_name() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("motd.dot", "hello {{= it.name }}")
        .build();

    env.deploy_path(
        "motd.dot",
        "motd",
        DeployOptions::new().with_template_values(bob()),
    )
    .await
    .unwrap();
    assert_file_content(env.target_path("motd"), "hello Bob");
}

#[cfg(unix)]
#[tokio::test]
async fn test_attributes_are_copied() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .dir_with_mode("private", 0o700)
        .file_with_mode("private/key", "secret", 0o600)
        .file_with_mode("run.sh.dot", "echo {{= it.name }}", 0o755)
        .build();

    env.deploy(DeployOptions::new().with_template_values(bob()))
        .await
        .unwrap();

    assert_mode(env.target_path("private"), 0o700);
    assert_mode(env.target_path("private/key"), 0o600);
    assert_mode(env.target_path("run.sh"), 0o755);
}

#[tokio::test]
async fn test_missing_source_fails() {
    let env = TestEnvironment::new();

    let err = env
        .deploy_path("does-not-exist", "out", DeployOptions::new())
        .await
        .unwrap_err();
    match err {
        DeployError::SourceNotFound { path } => {
            assert_eq!(path, env.source_path("does-not-exist"));
        }
        other => panic!("expected SourceNotFound, got {other:?}"),
    }
    assert_not_exists(env.target_path("out"));
}

#[tokio::test]
async fn test_broken_template_aborts_deployment() {
    let env = TestEnvironment::new();
    TreeBuilder::new(env.source())
        .file("a/broken.conf.dot", "{{? it.enabled }}never closed")
        .file("b/later.txt", "not reached")
        .build();

    let err = env.deploy_default().await.unwrap_err();
    assert!(matches!(err, DeployError::Template(_)));
    assert!(err.to_string().contains("broken.conf.dot"));
    assert_not_exists(env.target_path("b/later.txt"));
}
