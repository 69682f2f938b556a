//! Installing Debian packages through dpkg.

use crate::core::GetError;
use crate::frontend::Frontend;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

/// A package dpkg accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebInstall {
    /// dpkg's name for the package.
    pub apt_name: String,
    /// Whether the dependency fix pass ran. Anything it pulled in is not
    /// undone by a rollback.
    pub fixed_dependencies: bool,
}

/// Status of a fully installed package in `dpkg -s` output.
const INSTALLED_STATUS: &str = "install ok installed";

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Whether `dpkg -i` output blames missing or broken dependencies.
fn is_dependency_failure(output: &str) -> bool {
    let output = output.to_ascii_lowercase();
    output.contains("dependency problems") || output.contains("depends on")
}

/// The `Status:` field of `dpkg -s` output.
fn status_field(output: &str) -> Option<&str> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Status:"))
        .map(str::trim)
}

/// Check that `path` is a well-formed Debian package.
///
/// # Errors
///
/// Returns [`GetError::ValidationFailed`] if `dpkg-deb --info` rejects the
/// file or cannot be run.
pub async fn validate(frontend: &dyn Frontend, path: &Path, asset_name: &str) -> Result<()> {
    let file = path.display().to_string();
    let reason = match frontend.run_command("dpkg-deb", &args(&["--info", &file])).await {
        Ok(output) if output.success => return Ok(()),
        Ok(output) => output.output.trim().to_string(),
        Err(e) => e.to_string(),
    };
    Err(GetError::ValidationFailed {
        asset: asset_name.to_string(),
        reason,
    }
    .into())
}

/// Package name from the `name_version_arch.deb` file name convention.
#[must_use]
pub fn name_from_file_name(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".deb").unwrap_or(file_name);
    stem.split('_').next().unwrap_or(stem).to_string()
}

/// dpkg's name for the package in `path`.
///
/// Asks `dpkg-deb` for the `Package` field and falls back to the file name.
pub async fn package_name(frontend: &dyn Frontend, path: &Path, asset_name: &str) -> String {
    let file = path.display().to_string();
    match frontend.run_command("dpkg-deb", &args(&["--field", &file, "Package"])).await {
        Ok(output) if output.success && !output.output.trim().is_empty() => {
            output.output.trim().to_string()
        }
        Ok(output) => {
            debug!("dpkg-deb --field failed: {}", output.output.trim());
            name_from_file_name(asset_name)
        }
        Err(e) => {
            debug!("dpkg-deb --field could not run: {e}");
            name_from_file_name(asset_name)
        }
    }
}

/// Install the package at `path`.
///
/// If `dpkg -i` fails on dependency problems, one `apt-get install -f` pass is
/// made to pull them in; the install counts only if dpkg then reports the
/// package as `install ok installed`. Any other dpkg failure is final.
///
/// # Errors
///
/// Returns [`GetError::ValidationFailed`] for a malformed package and
/// [`GetError::PrivilegedCommandFailed`] if installation fails for good.
pub async fn install(frontend: &dyn Frontend, path: &Path, asset_name: &str) -> Result<DebInstall> {
    validate(frontend, path, asset_name).await?;
    let apt_name = package_name(frontend, path, asset_name).await;
    debug!("Package {} provides {}", asset_name, apt_name);

    let file = path.display().to_string();
    let first = frontend
        .run_privileged(
            "Password required for package installation",
            "dpkg",
            &args(&["-i", &file]),
        )
        .await?;
    if first.success {
        info!("Installed {} with dpkg", apt_name);
        return Ok(DebInstall {
            apt_name,
            fixed_dependencies: false,
        });
    }
    if !is_dependency_failure(&first.output) {
        return Err(GetError::PrivilegedCommandFailed {
            command: format!("dpkg -i {file}"),
            output: first.output.trim().to_string(),
        }
        .into());
    }

    warn!("dpkg -i {} failed, fixing dependencies", asset_name);
    frontend.warn("dpkg reported a problem, attempting to fix dependencies...");
    let fix = frontend
        .run_privileged(
            "Password required to fix package dependencies",
            "apt-get",
            &args(&["install", "-f", "-y"]),
        )
        .await?;
    if !fix.success {
        return Err(GetError::PrivilegedCommandFailed {
            command: "apt-get install -f -y".to_string(),
            output: format!("{}\n{}", first.output.trim(), fix.output.trim()),
        }
        .into());
    }

    let status = frontend.run_command("dpkg", &args(&["-s", &apt_name])).await?;
    let state = status.success.then(|| status_field(&status.output)).flatten();
    if state != Some(INSTALLED_STATUS) {
        debug!("dpkg -s {} after the fix pass: {:?}", apt_name, state);
        return Err(GetError::PrivilegedCommandFailed {
            command: format!("dpkg -i {file}"),
            output: format!(
                "{}\n{apt_name} is not installed after fixing dependencies (status: {})",
                first.output.trim(),
                state.unwrap_or("unknown")
            ),
        }
        .into());
    }

    info!("Installed {} after fixing dependencies", apt_name);
    Ok(DebInstall {
        apt_name,
        fixed_dependencies: true,
    })
}

/// Uninstall `apt_name` with `apt-get remove`.
///
/// # Errors
///
/// Returns [`GetError::PrivilegedCommandFailed`] if apt fails.
pub async fn remove(frontend: &dyn Frontend, apt_name: &str) -> Result<()> {
    let output = frontend
        .run_privileged(
            "Password required for package removal",
            "apt-get",
            &args(&["remove", "-y", apt_name]),
        )
        .await?;
    if !output.success {
        return Err(GetError::PrivilegedCommandFailed {
            command: format!("apt-get remove -y {apt_name}"),
            output: output.output,
        }
        .into());
    }
    Ok(())
}

/// Take back a package this run just installed, with `dpkg --remove`.
///
/// # Errors
///
/// Returns [`GetError::PrivilegedCommandFailed`] if dpkg fails.
pub async fn purge(frontend: &dyn Frontend, apt_name: &str) -> Result<()> {
    let output = frontend
        .run_privileged(
            "Password required to undo package installation",
            "dpkg",
            &args(&["--remove", apt_name]),
        )
        .await?;
    if !output.success {
        return Err(GetError::PrivilegedCommandFailed {
            command: format!("dpkg --remove {apt_name}"),
            output: output.output,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedFrontend, deb_bytes};
    use tempfile::TempDir;

    fn write_deb(temp: &TempDir, file_name: &str, package: &str) -> std::path::PathBuf {
        let path = temp.path().join(file_name);
        std::fs::write(&path, deb_bytes(package)).unwrap();
        path
    }

    #[test]
    fn test_name_from_file_name() {
        assert_eq!(name_from_file_name("gh_2.40.0_linux_amd64.deb"), "gh");
        assert_eq!(name_from_file_name("tool.deb"), "tool");
    }

    #[tokio::test]
    async fn test_install_uses_package_field() {
        let temp = TempDir::new().unwrap();
        let path = write_deb(&temp, "gh_2.40.0_linux_amd64.deb", "github-cli");
        let frontend = ScriptedFrontend::new();

        let installed = install(&frontend, &path, "gh_2.40.0_linux_amd64.deb").await.unwrap();

        assert_eq!(installed.apt_name, "github-cli");
        assert!(!installed.fixed_dependencies);
        assert_eq!(frontend.installed_debs(), vec!["github-cli"]);
    }

    #[tokio::test]
    async fn test_name_falls_back_to_file_name() {
        let temp = TempDir::new().unwrap();
        let path = write_deb(&temp, "tool_1.0.0_amd64.deb", "tool");
        let frontend = ScriptedFrontend::new().with_failing_command("dpkg-deb --field");

        let installed = install(&frontend, &path, "tool_1.0.0_amd64.deb").await.unwrap();
        assert_eq!(installed.apt_name, "tool");
    }

    #[tokio::test]
    async fn test_invalid_package_fails_validation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.deb");
        std::fs::write(&path, b"not a package").unwrap();
        let frontend = ScriptedFrontend::new();

        let err = install(&frontend, &path, "broken.deb").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<GetError>(), Some(GetError::ValidationFailed { .. })));
        assert!(frontend.installed_debs().is_empty());
    }

    #[tokio::test]
    async fn test_dependency_fix_pass() {
        let temp = TempDir::new().unwrap();
        let path = write_deb(&temp, "tool_1.0.0_amd64.deb", "tool");
        let frontend = ScriptedFrontend::new().with_failing_command("dpkg -i");

        let installed = install(&frontend, &path, "tool_1.0.0_amd64.deb").await.unwrap();

        assert!(installed.fixed_dependencies);
        assert_eq!(frontend.installed_debs(), vec!["tool"]);
        let fixes = frontend.commands().iter().filter(|c| c.contains("apt-get install -f")).count();
        assert_eq!(fixes, 1);
    }

    #[test]
    fn test_is_dependency_failure() {
        assert!(is_dependency_failure(
            "dpkg: dependency problems prevent configuration of tool:\n tool depends on libfoo1; however:\n"
        ));
        assert!(!is_dependency_failure(
            "dpkg: error processing archive tool.deb (--install):\n trying to overwrite '/usr/bin/tool', which is also in package other 1.0\n"
        ));
    }

    #[test]
    fn test_status_field() {
        assert_eq!(
            status_field("Package: tool\nStatus: install ok installed\nVersion: 1.0\n"),
            Some("install ok installed")
        );
        assert_eq!(
            status_field("Package: tool\nStatus: deinstall ok config-files\n"),
            Some("deinstall ok config-files")
        );
        assert_eq!(status_field("Package: tool\n"), None);
    }

    #[tokio::test]
    async fn test_other_dpkg_failure_skips_fix_pass() {
        let temp = TempDir::new().unwrap();
        let path = write_deb(&temp, "tool_1.0.0_amd64.deb", "tool");
        let frontend = ScriptedFrontend::new().with_dpkg_install_error(
            "dpkg: error processing archive (--install):\n trying to overwrite '/usr/bin/tool', which is also in package other 1.0\n",
        );

        let err = install(&frontend, &path, "tool_1.0.0_amd64.deb").await.unwrap_err();

        let Some(GetError::PrivilegedCommandFailed { command, output }) = err.downcast_ref::<GetError>() else {
            panic!("expected a failed dpkg command, got {err:#}");
        };
        assert!(command.starts_with("dpkg -i"));
        assert!(output.contains("trying to overwrite"));
        assert!(!frontend.commands().iter().any(|c| c.starts_with("apt-get")));
        assert!(frontend.installed_debs().is_empty());
    }

    #[tokio::test]
    async fn test_fix_pass_leaving_only_config_files_fails() {
        let temp = TempDir::new().unwrap();
        let path = write_deb(&temp, "tool_1.0.0_amd64.deb", "tool");
        let frontend = ScriptedFrontend::new()
            .with_failing_command("dpkg -i")
            .with_fix_pass_removing_packages();

        let err = install(&frontend, &path, "tool_1.0.0_amd64.deb").await.unwrap_err();

        let Some(GetError::PrivilegedCommandFailed { output, .. }) = err.downcast_ref::<GetError>() else {
            panic!("expected a failed install, got {err:#}");
        };
        assert!(output.contains("deinstall ok config-files"));
        assert!(frontend.installed_debs().is_empty());
        assert!(frontend.commands().contains(&"dpkg -s tool".to_string()));
    }

    #[tokio::test]
    async fn test_failed_fix_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = write_deb(&temp, "tool_1.0.0_amd64.deb", "tool");
        let frontend = ScriptedFrontend::new()
            .with_failing_command("dpkg -i")
            .with_failing_command("apt-get install");

        let err = install(&frontend, &path, "tool_1.0.0_amd64.deb").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GetError>(),
            Some(GetError::PrivilegedCommandFailed { .. })
        ));
        let fixes = frontend.commands().iter().filter(|c| c.contains("apt-get install -f")).count();
        assert_eq!(fixes, 1);
    }
}
