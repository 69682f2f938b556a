//! Installing standalone executables into the binary directory.

use super::backup::BinaryBackup;
use crate::config::EngineConfig;
use crate::core::GetError;
use crate::frontend::Frontend;
use crate::utils::fs::set_mode;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extensions dropped from the installed name.
const STRIPPED_EXTENSIONS: &[&str] = &[".exe", ".bin", ".run", ".appimage"];

/// Name tokens describing the build target rather than the program.
const PLATFORM_TOKENS: &[&str] = &[
    "linux", "gnu", "musl", "unknown", "static", "pc", "amd64", "x64", "x86", "64bit", "aarch64",
    "arm64", "armv7", "armv7l", "armhf", "arm", "i386", "i686", "386", "gnueabihf", "portable",
];

fn is_version_token(token: &str) -> bool {
    let digits = token.strip_prefix('v').unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Name a binary asset is installed under.
///
/// Drops executable extensions, version numbers and platform or architecture
/// tokens. The repository name wins when the cleaned name already resembles
/// it, and is used outright when nothing is left.
///
/// ```rust
/// use get_cli::installer::binary_name;
///
/// assert_eq!(binary_name("sharkdp/bat", "bat-v0.24.0-x86_64-unknown-linux-gnu"), "bat");
/// assert_eq!(binary_name("cli/cli", "gh_2.40.0_linux_amd64"), "gh");
/// assert_eq!(binary_name("owner/tool", "linux-amd64"), "tool");
/// ```
#[must_use]
pub fn binary_name(package: &str, asset_name: &str) -> String {
    let repo = package.rsplit('/').next().unwrap_or(package);

    let lower = asset_name.to_ascii_lowercase();
    let mut name = asset_name;
    if let Some(ext) = STRIPPED_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext)) {
        name = &asset_name[..asset_name.len() - ext.len()];
    }
    let normalized = name.replace("x86_64", "amd64").replace("x86-64", "amd64");

    let kept: Vec<&str> = normalized
        .split(['-', '_', '.'])
        .filter(|token| !token.is_empty())
        .filter(|token| !is_version_token(token))
        .filter(|token| !PLATFORM_TOKENS.contains(&token.to_ascii_lowercase().as_str()))
        .collect();
    let cleaned = kept.join("-");

    if cleaned.is_empty() {
        return repo.to_string();
    }
    let (cleaned_lower, repo_lower) = (cleaned.to_ascii_lowercase(), repo.to_ascii_lowercase());
    if cleaned_lower.starts_with(&repo_lower) || repo_lower.starts_with(&cleaned_lower) {
        repo.to_string()
    } else {
        cleaned
    }
}

/// A binary copied into place.
#[derive(Debug, Clone)]
pub struct PlacedBinary {
    pub path: PathBuf,
    /// The binary that was at `path` before, moved aside. The caller discards
    /// it once the install is recorded, or restores it.
    pub backup: Option<BinaryBackup>,
}

/// Copy the executable at `source_path` into the binary directory.
///
/// An existing file at the target, including the tool's own binary, is moved
/// aside first and put back if the copy fails.
///
/// # Errors
///
/// Returns [`GetError::InstallFailed`] if the download cannot be made
/// executable, [`GetError::PrivilegedCommandFailed`] if the copy fails, or
/// [`GetError::SelfUpgradeFailed`] if it fails while replacing the tool itself.
pub async fn install(
    frontend: &dyn Frontend,
    config: &EngineConfig,
    package: &str,
    source_path: &Path,
    asset_name: &str,
) -> Result<PlacedBinary> {
    set_mode(source_path, 0o755).map_err(|e| GetError::InstallFailed {
        asset: asset_name.to_string(),
        reason: format!("cannot make it executable: {e:#}"),
    })?;

    let name = binary_name(package, asset_name);
    let target = config.bin_dir.join(&name);
    debug!("Installing {} as {}", asset_name, target.display());

    if !target.exists() {
        copy_into_place(frontend, source_path, &target).await?;
        info!("Installed binary {}", target.display());
        return Ok(PlacedBinary {
            path: target,
            backup: None,
        });
    }

    let backup = BinaryBackup::new(&target);
    backup.move_aside(frontend).await?;

    if let Err(e) = copy_into_place(frontend, source_path, &target).await {
        let restore = match backup.restore(frontend).await {
            Ok(()) => "the previous binary was restored".to_string(),
            Err(restore_err) => format!(
                "restoring the previous binary from {} also failed: {restore_err}",
                backup.backup_path().display()
            ),
        };
        if config.is_self(package, &name) {
            return Err(GetError::SelfUpgradeFailed {
                path: target.display().to_string(),
                reason: e.to_string(),
                restore,
            }
            .into());
        }
        warn!("Copy over {} failed, {}", target.display(), restore);
        return Err(e);
    }

    info!("Replaced binary {}", target.display());
    Ok(PlacedBinary {
        path: target,
        backup: Some(backup),
    })
}

async fn copy_into_place(frontend: &dyn Frontend, source_path: &Path, target: &Path) -> Result<()> {
    let args = vec![
        "-m".to_string(),
        "0755".to_string(),
        source_path.display().to_string(),
        target.display().to_string(),
    ];
    let output = frontend
        .run_privileged("Password required for binary installation", "install", &args)
        .await?;
    if !output.success {
        return Err(GetError::PrivilegedCommandFailed {
            command: format!("install {}", args.join(" ")),
            output: output.output,
        }
        .into());
    }
    Ok(())
}

/// Delete an installed binary.
///
/// A binary that is already gone counts as removed.
///
/// # Errors
///
/// Returns [`GetError::PrivilegedCommandFailed`] if `rm` fails.
pub async fn remove(frontend: &dyn Frontend, path: &Path) -> Result<()> {
    let args = vec!["-f".to_string(), path.display().to_string()];
    let output = frontend
        .run_privileged("Password required for binary removal", "rm", &args)
        .await?;
    if !output.success {
        return Err(GetError::PrivilegedCommandFailed {
            command: format!("rm {}", args.join(" ")),
            output: output.output,
        }
        .into());
    }
    Ok(())
}
