//! Metadata failures after the system was changed are rolled back.

use super::TestEnv;
use get_cli::config::EngineConfig;
use get_cli::core::{GetError, InstallStage, RollbackOutcome};
use get_cli::frontend::Selection;
use get_cli::test_utils::{ScriptedFrontend, deb_bytes, elf_bytes};

/// Point the metadata file below a regular file so every write fails.
fn unwritable_metadata(mut config: EngineConfig) -> EngineConfig {
    let root = config.bin_dir.parent().unwrap().to_path_buf();
    let blocker = root.join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    config.metadata_path = blocker.join("get.json");
    config
}

/// Occupy the metadata temp file path so writes from now on fail.
fn block_metadata_writes(env: &TestEnv) {
    std::fs::create_dir_all(env.manager.store().path().with_extension("tmp")).unwrap();
}

fn get_error(err: &anyhow::Error) -> &GetError {
    err.downcast_ref::<GetError>().expect("typed error")
}

#[tokio::test]
async fn test_binary_removed_when_metadata_write_fails() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new().with_selections([Selection::Chosen(0)]),
        unwritable_metadata,
    );
    env.source.publish("owner/tool", "v1.0.0", vec![("tool-linux-amd64", elf_bytes("t"))]);

    let err = env.manager.install("owner/tool", None, None).await.unwrap_err();

    assert!(matches!(
        get_error(&err),
        GetError::MetadataPersistenceFailed {
            rollback: RollbackOutcome::Succeeded,
            ..
        }
    ));
    assert_eq!(get_error(&err).stage(), Some(InstallStage::Metadata));
    assert!(!env.bin_dir().join("tool").exists());
    assert!(!env.manager.store().load().unwrap().is_installed("owner/tool"));
}

#[tokio::test]
async fn test_deb_purged_when_metadata_write_fails() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new().with_selections([Selection::Chosen(0)]),
        unwritable_metadata,
    );
    env.source.publish("owner/tool", "v1.0.0", vec![("tool_1.0.0_amd64.deb", deb_bytes("tool"))]);

    let err = env.manager.install("owner/tool", None, None).await.unwrap_err();

    assert!(matches!(
        get_error(&err),
        GetError::MetadataPersistenceFailed {
            rollback: RollbackOutcome::Succeeded,
            ..
        }
    ));
    assert!(env.frontend.installed_debs().is_empty());
    assert!(env.frontend.commands().contains(&"dpkg --remove tool".to_string()));
}

#[tokio::test]
async fn test_rollback_after_dependency_fix_is_partial() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new()
            .with_selections([Selection::Chosen(0)])
            .with_failing_command("dpkg -i"),
        unwritable_metadata,
    );
    env.source.publish("owner/tool", "v1.0.0", vec![("tool_1.0.0_amd64.deb", deb_bytes("tool"))]);

    let err = env.manager.install("owner/tool", None, None).await.unwrap_err();

    assert!(matches!(
        get_error(&err),
        GetError::MetadataPersistenceFailed {
            rollback: RollbackOutcome::Partial { .. },
            ..
        }
    ));
    assert!(env.frontend.installed_debs().is_empty());
}

#[tokio::test]
async fn test_failed_rollback_reports_both_errors() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new()
            .with_selections([Selection::Chosen(0)])
            .with_failing_command("rm"),
        unwritable_metadata,
    );
    env.source.publish("owner/tool", "v1.0.0", vec![("tool-linux-amd64", elf_bytes("t"))]);

    let err = env.manager.install("owner/tool", None, None).await.unwrap_err();

    let GetError::RollbackFailed {
        package, rollback, ..
    } = get_error(&err)
    else {
        panic!("expected a failed rollback, got {err:#}");
    };
    assert_eq!(package, "owner/tool");
    assert!(rollback.contains("rm"));
    assert!(env.bin_dir().join("tool").exists());
}

#[tokio::test]
async fn test_validation_failure_changes_nothing() {
    let env = TestEnv::new(ScriptedFrontend::new().with_selections([Selection::Chosen(0)]));
    env.source.publish("owner/tool", "v1.0.0", vec![("tool_1.0.0_amd64.deb", b"<html>404</html>".to_vec())]);

    let err = env.manager.install("owner/tool", None, None).await.unwrap_err();

    assert_eq!(get_error(&err).stage(), Some(InstallStage::Validate));
    assert!(env.frontend.installed_debs().is_empty());
    assert!(!env.manager.store().path().exists());
}

#[tokio::test]
async fn test_failed_upgrade_commit_keeps_installed_binary() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new().with_selections([Selection::Chosen(0)]),
        |config| config.with_assume_yes(true),
    );
    env.source.publish("owner/tool", "v1.0.0", vec![("tool-linux-amd64", elf_bytes("1.0"))]);
    env.manager.install("owner/tool", None, None).await.unwrap();
    env.source.publish("owner/tool", "v1.1.0", vec![("tool-linux-amd64", elf_bytes("1.1"))]);
    env.manager.update().await.unwrap();
    block_metadata_writes(&env);

    let err = env.manager.upgrade("owner/tool").await.unwrap_err();

    let GetError::MetadataPersistenceFailed { rollback, .. } = get_error(&err) else {
        panic!("expected a metadata failure, got {err:#}");
    };
    assert_eq!(
        rollback,
        &RollbackOutcome::Restored {
            previous: "owner/tool 1.0.0".to_string()
        }
    );
    assert!(!err.to_string().contains("installation was undone"));
    assert_eq!(std::fs::read(env.bin_dir().join("tool")).unwrap(), elf_bytes("1.0"));
    assert!(!env.bin_dir().join("tool.old").exists());

    let doc = env.manager.store().load().unwrap();
    assert_eq!(doc.packages["owner/tool"].version, "1.0.0");
    assert_eq!(doc.pending_updates["owner/tool"], "v1.1.0");
}

#[tokio::test]
async fn test_failed_self_upgrade_commit_keeps_running_binary() {
    let env = TestEnv::with_config(ScriptedFrontend::new().with_selections([Selection::Chosen(0)]), |config| {
        config.with_assume_yes(true).with_self_identity("tranquil-tr0/get", "get")
    });
    env.source.publish("tranquil-tr0/get", "v0.3.0", vec![("get-linux-amd64", elf_bytes("0.3"))]);
    env.manager.install("tranquil-tr0/get", None, None).await.unwrap();
    env.source.publish("tranquil-tr0/get", "v0.4.0", vec![("get-linux-amd64", elf_bytes("0.4"))]);
    env.manager.update().await.unwrap();
    block_metadata_writes(&env);

    let err = env.manager.upgrade("tranquil-tr0/get").await.unwrap_err();

    assert!(matches!(
        get_error(&err),
        GetError::MetadataPersistenceFailed {
            rollback: RollbackOutcome::Restored { .. },
            ..
        }
    ));
    assert_eq!(std::fs::read(env.bin_dir().join("get")).unwrap(), elf_bytes("0.3"));
}

#[tokio::test]
async fn test_failed_deb_upgrade_commit_names_lost_version() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new().with_selections([Selection::Chosen(0)]),
        |config| config.with_assume_yes(true),
    );
    env.source.publish("owner/tool", "v1.0.0", vec![("tool_amd64.deb", deb_bytes("tool"))]);
    env.manager.install("owner/tool", None, None).await.unwrap();
    env.source.publish("owner/tool", "v1.1.0", vec![("tool_amd64.deb", deb_bytes("tool"))]);
    env.manager.update().await.unwrap();
    block_metadata_writes(&env);

    let err = env.manager.upgrade("owner/tool").await.unwrap_err();

    let GetError::MetadataPersistenceFailed {
        rollback: RollbackOutcome::Partial { remaining },
        ..
    } = get_error(&err)
    else {
        panic!("expected a partial rollback, got {err:#}");
    };
    assert!(remaining.contains("owner/tool 1.0.0"));
    assert!(remaining.contains("get remove owner/tool"));
    assert!(env.frontend.installed_debs().is_empty());
}
