//! The full lifecycle of a package: install, scan, upgrade, remove.

use super::TestEnv;
use get_cli::frontend::Selection;
use get_cli::manager::InstallOutcome;
use get_cli::metadata::InstallType;
use get_cli::test_utils::{ScriptedFrontend, deb_bytes, elf_bytes, zip_bytes};
use get_cli::upgrade::UpgradeOutcome;

#[tokio::test]
async fn test_deb_install_scan_upgrade() {
    let env = TestEnv::new(
        ScriptedFrontend::new().with_selections([Selection::Chosen(0), Selection::Chosen(0)]),
    );
    env.source.publish("owner/repo", "v1.4.0", vec![("repo_1.4.0_amd64.deb", deb_bytes("repo"))]);

    let outcome = env.manager.install("owner/repo", None, None).await.unwrap();
    assert!(matches!(outcome, InstallOutcome::Installed(_)));

    let doc = env.manager.store().load().unwrap();
    let record = &doc.packages["owner/repo"];
    assert_eq!(record.install_type, Some(InstallType::Deb));
    assert_eq!(record.version, "1.4.0");
    assert!(doc.pending_updates.is_empty());

    // Nothing newer yet
    let scan = env.manager.update().await.unwrap();
    assert_eq!(scan.new_pending_count(), 0);

    env.source.publish("owner/repo", "v1.10.0", vec![("repo_1.10.0_amd64.deb", deb_bytes("repo"))]);
    let scan = env.manager.update().await.unwrap();
    assert_eq!(scan.new_pending_count(), 1);
    assert_eq!(scan.new_pending[0].package, "owner/repo");
    assert_eq!(env.manager.store().load().unwrap().pending_updates.len(), 1);

    // Debian file names carry the version without a `v`, so the previous
    // choice does not match and the user picks again
    let report = env.manager.upgrade_all().await.unwrap();
    assert_eq!(report.upgraded.len(), 1);
    assert!(!report.is_failure());
    assert_eq!(env.frontend.prompts().len(), 2);

    let doc = env.manager.store().load().unwrap();
    assert_eq!(doc.packages["owner/repo"].version, "1.10.0");
    assert!(doc.pending_updates.is_empty());
    assert_eq!(env.frontend.installed_debs(), vec!["repo"]);
}

#[tokio::test]
async fn test_binary_upgrade_matches_previous_asset() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new().with_selections([Selection::Chosen(1)]),
        |config| config.with_assume_yes(true),
    );
    env.source.publish(
        "sharkdp/tool",
        "v0.9.0",
        vec![
            ("tool-v0.9.0-aarch64-linux", elf_bytes("arm-0.9")),
            ("tool-v0.9.0-x86_64-linux", elf_bytes("x86-0.9")),
            ("checksums.txt", b"abc  tool\n".to_vec()),
        ],
    );

    env.manager.install("https://github.com/sharkdp/tool", None, None).await.unwrap();
    let binary = env.bin_dir().join("tool");
    assert_eq!(std::fs::read(&binary).unwrap(), elf_bytes("x86-0.9"));

    env.source.publish(
        "sharkdp/tool",
        "v0.10.0",
        vec![
            ("tool-v0.10.0-aarch64-linux", elf_bytes("arm-0.10")),
            ("tool-v0.10.0-x86_64-linux", elf_bytes("x86-0.10")),
        ],
    );
    env.manager.update().await.unwrap();

    let report = env.manager.upgrade_all().await.unwrap();

    assert_eq!(report.upgraded.len(), 1);
    assert_eq!(report.upgraded[0].version, "0.10.0");
    assert_eq!(env.frontend.prompts().len(), 1);
    assert_eq!(std::fs::read(&binary).unwrap(), elf_bytes("x86-0.10"));
    let doc = env.manager.store().load().unwrap();
    assert_eq!(doc.packages["sharkdp/tool"].version, "0.10.0");
    assert_eq!(doc.packages["sharkdp/tool"].chosen_asset.as_deref(), Some("tool-v0.10.0-x86_64-linux"));
    assert!(doc.pending_updates.is_empty());

    env.manager.remove("sharkdp/tool").await.unwrap();
    assert!(!binary.exists());
    assert!(env.manager.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_zip_archive_install_and_upgrade_of_one_package() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new().with_selections([Selection::Chosen(0)]),
        |config| config.with_assume_yes(true),
    );
    let zip = |marker: &str| zip_bytes(vec![("LICENSE", b"MIT".to_vec()), ("bin/fd", elf_bytes(marker))]);
    env.source.publish("sharkdp/fd", "v8.0.0", vec![("fd-v8.0.0-linux.zip", zip("8"))]);

    env.manager.install("sharkdp/fd", None, None).await.unwrap();
    assert_eq!(std::fs::read(env.bin_dir().join("fd")).unwrap(), elf_bytes("8"));

    env.source.publish("sharkdp/fd", "v9.0.0", vec![("fd-v9.0.0-linux.zip", zip("9"))]);
    env.manager.update().await.unwrap();

    let outcome = env.manager.upgrade("sharkdp/fd").await.unwrap();

    assert!(matches!(outcome, UpgradeOutcome::Upgraded(ref r) if r.version == "9.0.0"));
    assert_eq!(std::fs::read(env.bin_dir().join("fd")).unwrap(), elf_bytes("9"));
}

#[tokio::test]
async fn test_tag_prefix_follows_one_product_line() {
    let env = TestEnv::with_config(
        ScriptedFrontend::new().with_selections([Selection::Chosen(0)]),
        |config| config.with_assume_yes(true),
    );
    env.source.publish("org/mono", "auth-v1.0.0", vec![("auth-v1.0.0-linux", elf_bytes("a1"))]);
    env.source.publish("org/mono", "web-v3.0.0", vec![("web-v3.0.0-linux", elf_bytes("w3"))]);

    env.manager.install("org/mono", None, Some("auth-")).await.unwrap();
    assert_eq!(env.manager.list().unwrap()[0].record.version, "1.0.0");

    env.source.publish("org/mono", "auth-v1.1.0", vec![("auth-v1.1.0-linux", elf_bytes("a2"))]);
    env.source.publish("org/mono", "web-v3.1.0", vec![("web-v3.1.0-linux", elf_bytes("w4"))]);
    let scan = env.manager.update().await.unwrap();
    assert_eq!(scan.new_pending[0].tag, "auth-v1.1.0");

    env.manager.upgrade_all().await.unwrap();
    let record = &env.manager.list().unwrap()[0].record;
    assert_eq!(record.version, "1.1.0");
    assert_eq!(record.tag_prefix.as_deref(), Some("auth-"));
}
