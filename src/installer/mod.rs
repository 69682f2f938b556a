//! The install router.
//!
//! Takes one package, release and selected asset through
//! download → validate → privileged install → metadata commit, and undoes the
//! system change if the commit fails.
//!
//! # Routes
//!
//! - **deb** ([`deb`]) - validated with `dpkg-deb`, installed with `dpkg -i`,
//!   with one `apt-get install -f` pass if dpkg reports dependency problems
//! - **binary** ([`binary`]) - made executable and copied into the binary
//!   directory under a cleaned-up name; a binary already at that path is moved
//!   to a `.old` backup ([`backup`]) until the install is recorded
//! - **archive** ([`archive`]) - extracted to scratch space; the first
//!   Debian package (or else the first executable) inside is routed again, one
//!   level deep
//!
//! Downloads and extracted files live in a temporary directory that is
//! removed on every exit path.
//!
//! # Rollback
//!
//! Once the system has been changed, a failed metadata commit triggers
//! [`rollback`]: `dpkg --remove` for packages, and for binaries deleting the
//! file or moving the replaced one back. The returned error says whether the
//! rollback succeeded, put the previous version back, partially succeeded, or
//! failed as well.

pub mod archive;
pub mod backup;
pub mod binary;
pub mod deb;
pub mod rollback;

pub use binary::binary_name;

use backup::BinaryBackup;
use rollback::Undo;
use crate::assets::{AssetKind, SelectedAsset};
use crate::config::EngineConfig;
use crate::core::GetError;
use crate::frontend::Frontend;
use crate::github::{Release, ReleaseSource};
use crate::metadata::{InstalledArtifact, MetadataStore, PackageRecord};
use crate::utils::progress::ProgressBar;
use crate::version::VersionComparator;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything the router needs to install one asset.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    pub package: &'a str,
    pub release: &'a Release,
    pub selected: &'a SelectedAsset,
    /// Stored on the record; `None` keeps whatever prefix the record has.
    pub tag_prefix: Option<&'a str>,
}

/// A committed install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub package: String,
    pub version: String,
    pub artifact: InstalledArtifact,
}

/// A file on local disk standing in for an asset.
#[derive(Debug, Clone)]
struct LocalArtifact {
    name: String,
    path: PathBuf,
}

/// What a route left on the system.
#[derive(Debug, Clone)]
struct Placed {
    artifact: InstalledArtifact,
    fixed_dependencies: bool,
    /// The binary the new one replaced, kept until the commit.
    backup: Option<BinaryBackup>,
}

/// Installs assets and commits them to the metadata store.
pub struct Installer<'a> {
    source: &'a dyn ReleaseSource,
    frontend: &'a dyn Frontend,
    config: &'a EngineConfig,
    store: &'a MetadataStore,
}

impl<'a> Installer<'a> {
    pub fn new(
        source: &'a dyn ReleaseSource,
        frontend: &'a dyn Frontend,
        config: &'a EngineConfig,
        store: &'a MetadataStore,
    ) -> Self {
        Self {
            source,
            frontend,
            config,
            store,
        }
    }

    fn step(&self, message: &str) {
        debug!("{}", message);
        if self.config.verbose {
            self.frontend.info(message);
        }
    }

    /// Download, install and record the selected asset.
    ///
    /// On success the package has a record with the release's version and no
    /// pending update. When the package already has a record, that version
    /// stays installed if the commit fails.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error. A failure after the system was
    /// changed is [`GetError::MetadataPersistenceFailed`] or
    /// [`GetError::RollbackFailed`].
    pub async fn install_release(&self, request: &InstallRequest<'_>) -> Result<InstallReport> {
        let asset = &request.selected.asset;
        let previous = self.store.load()?.packages.get(request.package).cloned();
        let scratch = tempfile::Builder::new()
            .prefix("get-")
            .tempdir()
            .context("Failed to create temporary directory")?;

        let download_path = scratch.path().join(local_file_name(&asset.name));
        self.frontend.status(&format!("Downloading {}", asset.name));
        self.source.download(asset, &download_path).await?;
        self.step(&format!("Downloaded {} to {}", asset.name, download_path.display()));

        let downloaded = LocalArtifact {
            name: asset.name.clone(),
            path: download_path,
        };
        let placed = self
            .install_artifact(request.package, &downloaded, request.selected.route, scratch.path(), 0)
            .await?;

        self.commit(request, placed, previous.as_ref()).await
    }

    /// Install a local file by `route`. Archives recurse once into their
    /// installable member.
    async fn install_artifact(
        &self,
        package: &str,
        local: &LocalArtifact,
        route: AssetKind,
        scratch: &Path,
        depth: usize,
    ) -> Result<Placed> {
        match route {
            AssetKind::Deb => {
                self.frontend.status(&format!("Installing {} with dpkg", local.name));
                let installed = deb::install(self.frontend, &local.path, &local.name).await?;
                Ok(Placed {
                    artifact: InstalledArtifact::Deb {
                        apt_name: installed.apt_name,
                    },
                    fixed_dependencies: installed.fixed_dependencies,
                    backup: None,
                })
            }
            AssetKind::Binary | AssetKind::Other => {
                self.frontend.status(&format!("Installing binary {}", local.name));
                let placed =
                    binary::install(self.frontend, self.config, package, &local.path, &local.name)
                        .await?;
                Ok(Placed {
                    artifact: InstalledArtifact::Binary { path: placed.path },
                    fixed_dependencies: false,
                    backup: placed.backup,
                })
            }
            AssetKind::Archive if depth > 0 => Err(GetError::NoInstallableInArchive {
                archive: local.name.clone(),
            }
            .into()),
            AssetKind::Archive => {
                let extracted = scratch.join("extracted");
                self.frontend.status(&format!("Extracting {}", local.name));
                let spinner = ProgressBar::new_spinner(format!("Extracting {}", local.name));
                let extracted_result = archive::extract(&local.path, &local.name, &extracted).await;
                spinner.finish_and_clear();
                extracted_result?;

                let member = archive::find_installable(&extracted, &local.name)?;
                self.step(&format!("Found {} {} in {}", member.kind, member.file_name(), local.name));
                let nested = LocalArtifact {
                    name: member.file_name(),
                    path: member.path,
                };
                Box::pin(self.install_artifact(package, &nested, member.kind, scratch, depth + 1))
                    .await
            }
        }
    }

    async fn commit(
        &self,
        request: &InstallRequest<'_>,
        placed: Placed,
        previous: Option<&PackageRecord>,
    ) -> Result<InstallReport> {
        let version = VersionComparator::normalize_tag(&request.release.tag_name, request.tag_prefix);
        let installed_at = request
            .release
            .published_at
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        let asset_name = &request.selected.asset.name;

        let result = self.store.update(|doc| {
            let mut record = doc.packages.get(request.package).cloned().unwrap_or_default();
            record.version.clone_from(&version);
            record.installed_at = installed_at;
            record.set_artifact(&placed.artifact);
            record.original_name = Some(asset_name.clone());
            record.chosen_asset = Some(asset_name.clone());
            if let Some(prefix) = request.tag_prefix.filter(|p| !p.is_empty()) {
                record.tag_prefix = Some(prefix.to_string());
            }
            doc.record_install(request.package, record);
        });

        if let Err(e) = result {
            let undo = Undo {
                package: request.package,
                artifact: &placed.artifact,
                fixed_dependencies: placed.fixed_dependencies,
                backup: placed.backup.as_ref(),
                previous,
            };
            return Err(rollback::rollback(self.frontend, self.store, &undo, &e).await);
        }

        if let Some(backup) = &placed.backup {
            backup.discard(self.frontend).await;
        }

        self.step(&format!("Recorded {} {} in {}", request.package, version, self.store.path().display()));
        Ok(InstallReport {
            package: request.package.to_string(),
            version,
            artifact: placed.artifact,
        })
    }
}

/// Uninstall what a record points at: `apt-get remove` for packages, file
/// deletion for binaries.
///
/// # Errors
///
/// Returns [`GetError::PrivilegedCommandFailed`] if the removal fails.
pub async fn uninstall(frontend: &dyn Frontend, artifact: &InstalledArtifact) -> Result<()> {
    match artifact {
        InstalledArtifact::Deb { apt_name } => deb::remove(frontend, apt_name).await,
        InstalledArtifact::Binary { path } => binary::remove(frontend, path).await,
    }
}

/// File name to download an asset to.
fn local_file_name(asset_name: &str) -> String {
    Path::new(asset_name)
        .file_name()
        .map_or_else(|| "asset".to_string(), |name| name.to_string_lossy().into_owned())
}
