//! Undoing an install whose metadata commit failed.
//!
//! A fresh install is taken off the system again. On an upgrade the record of
//! the previous version is still in the metadata file, so the previous
//! artifact has to stay installed: a replaced binary is moved back from its
//! `.old` backup. A replaced Debian package cannot be reinstalled, so its
//! stale record is dropped and the outcome is partial.

use super::backup::BinaryBackup;
use super::{binary, deb};
use crate::core::{GetError, RollbackOutcome};
use crate::frontend::Frontend;
use crate::metadata::{InstalledArtifact, MetadataStore, PackageRecord};
use anyhow::Result;
use tracing::{error, info, warn};

/// What a failed commit left on the system.
#[derive(Debug, Clone, Copy)]
pub struct Undo<'a> {
    pub package: &'a str,
    /// The artifact the failed install placed.
    pub artifact: &'a InstalledArtifact,
    /// The deb install needed the dependency fix pass; whatever it pulled in
    /// stays installed.
    pub fixed_dependencies: bool,
    /// The binary the new one replaced.
    pub backup: Option<&'a BinaryBackup>,
    /// The record of the version being upgraded from.
    pub previous: Option<&'a PackageRecord>,
}

impl Undo<'_> {
    /// Whether the new package took the place of the previously recorded one.
    fn replaced_previous_deb(&self) -> bool {
        match (self.artifact, self.previous.and_then(PackageRecord::artifact)) {
            (InstalledArtifact::Deb { apt_name }, Some(InstalledArtifact::Deb { apt_name: old })) => {
                *apt_name == old
            }
            _ => false,
        }
    }
}

/// Revert the system change described by `undo` and build the error to report.
pub async fn rollback(
    frontend: &dyn Frontend,
    store: &MetadataStore,
    undo: &Undo<'_>,
    cause: &anyhow::Error,
) -> anyhow::Error {
    let package = undo.package;
    frontend.warn(&format!("Could not record {package}; undoing the installation of {}", undo.artifact));

    if let Err(rollback_err) = revert(frontend, undo).await {
        error!("Rollback of {} failed: {:#}", package, rollback_err);
        return GetError::RollbackFailed {
            package: package.to_string(),
            original: format!("{cause:#}"),
            rollback: format!("{rollback_err:#}"),
        }
        .into();
    }

    let previous = undo.previous.map(|record| format!("{package} {}", record.version));
    let mut remaining = Vec::new();
    if undo.replaced_previous_deb() {
        remaining.push(drop_stale_record(store, package, previous.as_deref()));
    }
    if undo.fixed_dependencies {
        remaining.push("dependencies installed by `apt-get install -f` were left in place".to_string());
    }

    let rollback = if !remaining.is_empty() {
        RollbackOutcome::Partial {
            remaining: remaining.join("; "),
        }
    } else if let Some(previous) = previous {
        RollbackOutcome::Restored { previous }
    } else if let Some(backup) = undo.backup {
        RollbackOutcome::Restored {
            previous: backup.original_path().display().to_string(),
        }
    } else {
        RollbackOutcome::Succeeded
    };
    info!("Rolled back {} ({})", package, rollback);

    GetError::MetadataPersistenceFailed {
        package: package.to_string(),
        reason: format!("{cause:#}"),
        rollback,
    }
    .into()
}

async fn revert(frontend: &dyn Frontend, undo: &Undo<'_>) -> Result<()> {
    match (undo.artifact, undo.backup) {
        (InstalledArtifact::Binary { .. }, Some(backup)) => backup.restore(frontend).await,
        (InstalledArtifact::Binary { path }, None) => binary::remove(frontend, path).await,
        (InstalledArtifact::Deb { apt_name }, _) => deb::purge(frontend, apt_name).await,
    }
}

/// Remove the record of a Debian package that is no longer installed.
///
/// Returns the description of what is left behind.
fn drop_stale_record(store: &MetadataStore, package: &str, previous: Option<&str>) -> String {
    let lost = previous.unwrap_or(package);
    match store.update(|doc| doc.remove_package(package)) {
        Ok(_) => format!("{lost} was replaced by the new package and is no longer installed; its record was removed"),
        Err(e) => {
            warn!("Could not drop the record of {}: {:#}", package, e);
            format!(
                "{lost} was replaced by the new package and is no longer installed; its record could not be removed ({e:#}), run 'get remove {package}'"
            )
        }
    }
}
