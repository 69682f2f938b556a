//! The package lifecycle engine behind every command.
//!
//! [`PackageManager`] owns the collaborators for one invocation (the release
//! source, the frontend, the engine configuration and the metadata store) and
//! exposes one method per command. The CLI builds it once and calls into it;
//! tests build it with fakes.

use crate::assets::{AssetChoice, classify_release, select_asset};
use crate::config::EngineConfig;
use crate::core::GetError;
use crate::frontend::Frontend;
use crate::github::{ReleaseSource, parse_package_id};
use crate::installer::{InstallReport, InstallRequest, Installer, uninstall};
use crate::metadata::{MetadataStore, PackageRecord};
use crate::update::{ScanReport, UpdateScanner};
use crate::upgrade::{UpgradeOrchestrator, UpgradeOutcome, UpgradeReport};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of installing a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(InstallReport),
    /// The user backed out of asset selection; nothing changed.
    Cancelled,
}

/// An installed package as listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub package: String,
    pub record: PackageRecord,
}

/// Installs, removes, lists and upgrades packages.
pub struct PackageManager {
    source: Arc<dyn ReleaseSource>,
    frontend: Arc<dyn Frontend>,
    config: EngineConfig,
    store: MetadataStore,
}

impl PackageManager {
    pub fn new(
        source: Arc<dyn ReleaseSource>,
        frontend: Arc<dyn Frontend>,
        config: EngineConfig,
    ) -> Self {
        let store = MetadataStore::new(&config.metadata_path);
        Self {
            source,
            frontend,
            config,
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Install a package from its latest release, or from `release_tag`.
    ///
    /// `input` is a GitHub URL or `owner/repo`. With `tag_prefix`, the latest
    /// release is the newest one whose tag starts with the prefix, and the
    /// prefix is remembered for later update checks.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::InvalidPackageId`] for a malformed identifier,
    /// [`GetError::AlreadyInstalled`] if the package has a record, and otherwise
    /// the error of the first failing step.
    pub async fn install(
        &self,
        input: &str,
        release_tag: Option<&str>,
        tag_prefix: Option<&str>,
    ) -> Result<InstallOutcome> {
        let package = parse_package_id(input)?;
        let tag_prefix = tag_prefix.filter(|prefix| !prefix.is_empty());

        if self.store.load()?.is_installed(&package) {
            return Err(GetError::AlreadyInstalled { package }.into());
        }

        self.frontend.status(&format!("Fetching release information for {package}"));
        let release = match release_tag {
            Some(tag) => self.source.release_by_tag(&package, tag).await?,
            None => self.source.latest_release(&package, tag_prefix).await?,
        };
        debug!("Resolved {} to release {}", package, release.tag_name);

        let assets = classify_release(self.source.as_ref(), &release).await;
        let choice =
            select_asset(self.frontend.as_ref(), &package, &release, &assets, None, self.config.assume_yes)
                .await?;
        let AssetChoice::Selected(selected) = choice else {
            info!("Install of {} cancelled", package);
            return Ok(InstallOutcome::Cancelled);
        };

        let report = self
            .installer()
            .install_release(&InstallRequest {
                package: &package,
                release: &release,
                selected: &selected,
                tag_prefix,
            })
            .await?;

        info!("Installed {} {}", package, report.version);
        Ok(InstallOutcome::Installed(report))
    }

    /// Uninstall a package and forget it.
    ///
    /// Both the record and any pending update are removed.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::NotInstalled`] if there is no record, or the error of
    /// the uninstall command. The record is kept if uninstalling fails.
    pub async fn remove(&self, input: &str) -> Result<PackageRecord> {
        let package = parse_package_id(input)?;
        let document = self.store.load()?;
        let record = document.packages.get(&package).ok_or_else(|| GetError::NotInstalled {
            package: package.clone(),
        })?;

        let artifact = record.artifact().ok_or_else(|| GetError::Other {
            message: format!("The record of {package} names neither a package nor a binary"),
        })?;

        self.frontend.status(&format!("Removing {package} ({artifact})"));
        uninstall(self.frontend.as_ref(), &artifact).await?;

        let removed = self.store.update(|doc| doc.remove_package(&package))?;
        info!("Removed {}", package);
        Ok(removed.unwrap_or_else(|| record.clone()))
    }

    /// Installed packages, sorted by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata file is corrupt.
    pub fn list(&self) -> Result<Vec<InstalledPackage>> {
        let document = self.store.load()?;
        Ok(document
            .packages
            .into_iter()
            .map(|(package, record)| InstalledPackage { package, record })
            .collect())
    }

    /// Check every installed package for a newer release.
    ///
    /// # Errors
    ///
    /// See [`UpdateScanner::scan_all`].
    pub async fn update(&self) -> Result<ScanReport> {
        UpdateScanner::new(self.source.as_ref(), &self.store).scan_all().await
    }

    /// Apply the pending update of one package.
    ///
    /// # Errors
    ///
    /// See [`UpgradeOrchestrator::upgrade_package`].
    pub async fn upgrade(&self, input: &str) -> Result<UpgradeOutcome> {
        let package = parse_package_id(input)?;
        self.orchestrator().upgrade_package(&package).await
    }

    /// Apply every pending update.
    ///
    /// # Errors
    ///
    /// See [`UpgradeOrchestrator::upgrade_all`].
    pub async fn upgrade_all(&self) -> Result<UpgradeReport> {
        self.orchestrator().upgrade_all().await
    }

    fn installer(&self) -> Installer<'_> {
        Installer::new(self.source.as_ref(), self.frontend.as_ref(), &self.config, &self.store)
    }

    fn orchestrator(&self) -> UpgradeOrchestrator<'_> {
        UpgradeOrchestrator::new(self.source.as_ref(), self.frontend.as_ref(), &self.config, &self.store)
    }
}
