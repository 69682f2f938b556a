//! Replacing the tool's own executable.

use super::TestEnv;
use get_cli::core::GetError;
use get_cli::frontend::Selection;
use get_cli::test_utils::{ScriptedFrontend, elf_bytes};

const SELF_PACKAGE: &str = "tranquil-tr0/get";

fn env_with_running_binary(frontend: ScriptedFrontend) -> TestEnv {
    let env = TestEnv::with_config(frontend, |config| config.with_self_identity(SELF_PACKAGE, "get"));
    std::fs::write(env.bin_dir().join("get"), elf_bytes("running")).unwrap();
    env.source.publish(SELF_PACKAGE, "v0.4.0", vec![("get-linux-amd64", elf_bytes("new"))]);
    env
}

#[tokio::test]
async fn test_successful_replacement_leaves_no_backup() {
    let env = env_with_running_binary(ScriptedFrontend::new().with_selections([Selection::Chosen(0)]));

    env.manager.install(SELF_PACKAGE, None, None).await.unwrap();

    let target = env.bin_dir().join("get");
    assert_eq!(std::fs::read(&target).unwrap(), elf_bytes("new"));
    assert!(!env.bin_dir().join("get.old").exists());
    assert!(env.frontend.commands().iter().any(|c| c.starts_with("mv ")));
}

#[tokio::test]
async fn test_failed_copy_restores_original() {
    let env = env_with_running_binary(
        ScriptedFrontend::new()
            .with_selections([Selection::Chosen(0)])
            .with_failing_command("install"),
    );

    let err = env.manager.install(SELF_PACKAGE, None, None).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<GetError>(), Some(GetError::SelfUpgradeFailed { .. })));
    assert_eq!(std::fs::read(env.bin_dir().join("get")).unwrap(), elf_bytes("running"));
    assert!(!env.bin_dir().join("get.old").exists());
    assert!(!env.manager.store().load().unwrap().is_installed(SELF_PACKAGE));
}

#[tokio::test]
async fn test_undeletable_backup_only_warns() {
    let env = env_with_running_binary(
        ScriptedFrontend::new()
            .with_selections([Selection::Chosen(0)])
            .with_failing_command("rm"),
    );

    env.manager.install(SELF_PACKAGE, None, None).await.unwrap();

    assert_eq!(std::fs::read(env.bin_dir().join("get")).unwrap(), elf_bytes("new"));
    assert!(env.bin_dir().join("get.old").exists());
    assert_eq!(env.frontend.warnings().len(), 1);
}
