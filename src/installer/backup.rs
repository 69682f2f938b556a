//! Moving an installed binary aside while it is replaced.
//!
//! The old binary is renamed to `<name>.old` before the new one is copied in.
//! Renaming also sidesteps "text file busy" when the binary is the running
//! `get` itself. The backup stays until the new version is recorded in the
//! metadata file, so a failed commit can put the old binary back. The binary
//! directory is root-owned, so every step is a privileged command.

use crate::constants::BACKUP_SUFFIX;
use crate::core::GetError;
use crate::frontend::Frontend;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Backup of a binary that is about to be replaced.
#[derive(Debug, Clone)]
pub struct BinaryBackup {
    /// Path of the binary being replaced.
    original_path: PathBuf,
    /// Where the original is moved while the new binary is installed.
    backup_path: PathBuf,
}

impl BinaryBackup {
    /// Backup location for `target`: the same path with `.old` appended.
    #[must_use]
    pub fn new(target: &Path) -> Self {
        let mut backup_path = target.as_os_str().to_owned();
        backup_path.push(BACKUP_SUFFIX);
        Self {
            original_path: target.to_path_buf(),
            backup_path: PathBuf::from(backup_path),
        }
    }

    #[must_use]
    pub fn original_path(&self) -> &Path {
        &self.original_path
    }

    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Move the original out of the way.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::PrivilegedCommandFailed`] if the move fails; the
    /// original is then still in place.
    pub async fn move_aside(&self, frontend: &dyn Frontend) -> Result<()> {
        info!(
            "Moving {} aside to {}",
            self.original_path.display(),
            self.backup_path.display()
        );
        let prompt = format!("Password required to replace {}", self.original_path.display());
        self.mv(frontend, &self.original_path, &self.backup_path, &prompt).await
    }

    /// Put the original back after a failed install or commit.
    ///
    /// Overwrites whatever is at the original path.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::PrivilegedCommandFailed`] if the move fails.
    pub async fn restore(&self, frontend: &dyn Frontend) -> Result<()> {
        warn!("Restoring {} from {}", self.original_path.display(), self.backup_path.display());
        let prompt = format!("Password required to restore {}", self.original_path.display());
        self.mv(frontend, &self.backup_path, &self.original_path, &prompt).await
    }

    /// Delete the backup once the new binary is recorded.
    ///
    /// Failure only warns: the new binary is already in place.
    pub async fn discard(&self, frontend: &dyn Frontend) {
        debug!("Removing backup {}", self.backup_path.display());
        let args = vec!["-f".to_string(), self.backup_path.display().to_string()];
        let result = frontend
            .run_privileged("Password required to remove the old binary", "rm", &args)
            .await;

        let problem = match result {
            Ok(output) if output.success => return,
            Ok(output) => output.output,
            Err(e) => e.to_string(),
        };
        let message = format!(
            "Could not remove backup {}: {}",
            self.backup_path.display(),
            problem.trim()
        );
        warn!("{}", message);
        frontend.warn(&message);
    }

    async fn mv(&self, frontend: &dyn Frontend, from: &Path, to: &Path, prompt: &str) -> Result<()> {
        let args = vec![from.display().to_string(), to.display().to_string()];
        let output = frontend.run_privileged(prompt, "mv", &args).await?;
        if !output.success {
            return Err(GetError::PrivilegedCommandFailed {
                command: format!("mv {}", args.join(" ")),
                output: output.output,
            }
            .into());
        }
        Ok(())
    }
}
