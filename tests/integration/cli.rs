//! The `get` binary: argument parsing, configuration, output and errors.
//!
//! Every test writes its own configuration file and points `GET_CONFIG_PATH` at
//! it, so the user's real metadata is never touched. None of these commands
//! reach the network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct CliEnv {
    temp: TempDir,
    config_path: PathBuf,
}

impl CliEnv {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        let config = format!(
            "metadata_path = {:?}\nbin_dir = {:?}\ngithub_api_url = \"http://127.0.0.1:9\"\nsniff_timeout_secs = 1\n",
            temp.path().join("get.json"),
            temp.path().join("bin"),
        );
        std::fs::write(&config_path, config).unwrap();
        Self { temp, config_path }
    }

    fn metadata_path(&self) -> PathBuf {
        self.temp.path().join("get.json")
    }

    fn write_metadata(&self, json: &str) {
        std::fs::write(self.metadata_path(), json).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("get").unwrap();
        cmd.env("GET_CONFIG_PATH", &self.config_path)
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .current_dir(self.temp.path());
        cmd
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_help_lists_commands() {
    let env = CliEnv::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("update-upgrade"));
}

#[test]
fn test_list_without_metadata() {
    let env = CliEnv::new();
    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages installed"));
    assert!(!env.metadata_path().exists());
}

#[test]
fn test_list_shows_records_sorted() {
    let env = CliEnv::new();
    env.write_metadata(
        r#"{
  "packages": {
    "sharkdp/bat": {
      "version": "0.24.0",
      "installed_at": "2023-10-08T00:00:00Z",
      "install_type": "binary",
      "binary_path": "/usr/local/bin/bat"
    },
    "cli/cli": {
      "version": "2.40.0",
      "installed_at": "2024-01-15T12:00:00Z",
      "apt_name": "gh"
    }
  },
  "pending_updates": {}
}"#,
    );

    let output = env.cmd().arg("list").assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();

    let cli = stdout.find("cli/cli").unwrap();
    let bat = stdout.find("sharkdp/bat").unwrap();
    assert!(cli < bat);
    assert!(stdout.contains("2.40.0  2024-01-15  deb"));
    assert!(stdout.contains("0.24.0  2023-10-08  binary"));
}

#[test]
fn test_corrupt_metadata_is_reported() {
    let env = CliEnv::new();
    env.write_metadata("{ not json");

    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
fn test_install_rejects_invalid_repository() {
    let env = CliEnv::new();
    env.cmd()
        .args(["install", "just-a-name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid GitHub repository"))
        .stderr(predicate::str::contains("owner/repo"));
}

#[test]
fn test_install_refuses_installed_package() {
    let env = CliEnv::new();
    let metadata = r#"{"packages":{"cli/cli":{"version":"2.40.0","installed_at":"2024-01-15T12:00:00Z","install_type":"deb","apt_name":"gh"}},"pending_updates":{}}"#;
    env.write_metadata(metadata);

    env.cmd()
        .args(["install", "https://github.com/cli/cli"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already installed"));
    assert_eq!(read(&env.metadata_path()), metadata);
}

#[test]
fn test_remove_unknown_package() {
    let env = CliEnv::new();
    env.cmd()
        .args(["remove", "owner/missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"))
        .stderr(predicate::str::contains("get list"));
}

#[test]
fn test_update_with_nothing_installed() {
    let env = CliEnv::new();
    env.cmd()
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked 0 packages"));
}

#[test]
fn test_upgrade_with_nothing_pending() {
    let env = CliEnv::new();
    env.cmd()
        .args(["upgrade", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending updates"));
}

#[test]
fn test_upgrade_single_package_without_pending_update() {
    let env = CliEnv::new();
    env.write_metadata(
        r#"{"packages":{"cli/cli":{"version":"2.40.0","installed_at":"2024-01-15T12:00:00Z","apt_name":"gh"}}}"#,
    );

    env.cmd()
        .args(["upgrade", "cli/cli"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pending update"));
}

#[test]
fn test_up_alias_reports_unreachable_packages() {
    let env = CliEnv::new();
    env.write_metadata(
        r#"{"packages":{"cli/cli":{"version":"2.40.0","installed_at":"2024-01-15T12:00:00Z","apt_name":"gh"}}}"#,
    );

    env.cmd()
        .args(["up", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not check 1 of 1 packages"));
}
