//! The upgrade orchestrator.
//!
//! Applies the pending updates recorded by the scanner. For each package the
//! release at the pending tag is fetched, the previously chosen asset is looked
//! up in it (falling back to the asset prompt), and the install router installs
//! it over the existing package.
//!
//! ```text
//! pending tag ──> release_by_tag ──> select (automatic, else prompt)
//!                                          │
//!                       cancelled <────────┤
//!                                          v
//!                        persist chosen asset ──> install router
//! ```

use crate::assets::{AssetChoice, classify_release, select_asset};
use crate::config::EngineConfig;
use crate::core::GetError;
use crate::frontend::Frontend;
use crate::github::ReleaseSource;
use crate::installer::{InstallReport, InstallRequest, Installer};
use crate::metadata::MetadataStore;
use anyhow::Result;
use tracing::{debug, info, warn};

/// Outcome of upgrading one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Upgraded(InstallReport),
    /// The user backed out of asset selection; nothing changed.
    Cancelled,
}

/// A package whose upgrade failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeFailure {
    pub package: String,
    pub reason: String,
    /// Whether the update was still pending after the pass.
    pub still_pending: bool,
}

/// Result of upgrading every pending package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    pub upgraded: Vec<InstallReport>,
    pub cancelled: Vec<String>,
    pub failed: Vec<UpgradeFailure>,
}

impl UpgradeReport {
    /// The pass failed if some package failed and its update is still pending.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.failed.iter().any(|failure| failure.still_pending)
    }
}

/// Applies pending updates.
pub struct UpgradeOrchestrator<'a> {
    source: &'a dyn ReleaseSource,
    frontend: &'a dyn Frontend,
    config: &'a EngineConfig,
    store: &'a MetadataStore,
}

impl<'a> UpgradeOrchestrator<'a> {
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

    /// Upgrade `package` to its pending release.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::NotInstalled`] or [`GetError::NoPendingUpdate`] if
    /// there is nothing to upgrade, or the install router's error.
    pub async fn upgrade_package(&self, package: &str) -> Result<UpgradeOutcome> {
        let document = self.store.load()?;
        let record = document.packages.get(package).ok_or_else(|| GetError::NotInstalled {
            package: package.to_string(),
        })?;
        let tag = document.pending_updates.get(package).ok_or_else(|| GetError::NoPendingUpdate {
            package: package.to_string(),
        })?;

        self.frontend.status(&format!("Upgrading {package} {} -> {tag}", record.version));
        let release = self.source.release_by_tag(package, tag).await?;
        let assets = classify_release(self.source, &release).await;

        let choice = select_asset(
            self.frontend,
            package,
            &release,
            &assets,
            record.chosen_asset.as_deref(),
            self.config.assume_yes,
        )
        .await?;
        let selected = match choice {
            AssetChoice::Selected(selected) => selected,
            AssetChoice::Cancelled => {
                info!("Upgrade of {} cancelled", package);
                return Ok(UpgradeOutcome::Cancelled);
            }
        };

        if record.chosen_asset.as_deref() != Some(selected.asset.name.as_str()) {
            debug!("Remembering {} as the asset of {}", selected.asset.name, package);
            self.store.update(|doc| {
                if let Some(existing) = doc.packages.get_mut(package) {
                    existing.chosen_asset = Some(selected.asset.name.clone());
                }
            })?;
        }

        let installer = Installer::new(self.source, self.frontend, self.config, self.store);
        let report = installer
            .install_release(&InstallRequest {
                package,
                release: &release,
                selected: &selected,
                tag_prefix: record.tag_prefix.as_deref(),
            })
            .await?;

        info!("Upgraded {} to {}", package, report.version);
        Ok(UpgradeOutcome::Upgraded(report))
    }

    /// Upgrade every package with a pending update.
    ///
    /// Failures are collected and do not stop the pass.
    ///
    /// # Errors
    ///
    /// Returns an error only if the metadata file cannot be read at the start.
    pub async fn upgrade_all(&self) -> Result<UpgradeReport> {
        let pending: Vec<String> = self.store.load()?.pending_updates.into_keys().collect();
        let mut report = UpgradeReport::default();

        for package in pending {
            match self.upgrade_package(&package).await {
                Ok(UpgradeOutcome::Upgraded(installed)) => {
                    self.frontend.success(&format!("Upgraded {package} to {}", installed.version));
                    report.upgraded.push(installed);
                }
                Ok(UpgradeOutcome::Cancelled) => {
                    self.frontend.info(&format!("Skipped {package}"));
                    report.cancelled.push(package);
                }
                Err(e) => {
                    warn!("Upgrade of {} failed: {:#}", package, e);
                    self.frontend.error(&format!("Failed to upgrade {package}: {e:#}"));
                    report.failed.push(UpgradeFailure {
                        package,
                        reason: format!("{e:#}"),
                        still_pending: true,
                    });
                }
            }
        }

        if !report.failed.is_empty() {
            match self.store.load() {
                Ok(document) => {
                    for failure in &mut report.failed {
                        failure.still_pending = document.pending_updates.contains_key(&failure.package);
                    }
                }
                Err(e) => warn!("Could not re-read metadata after upgrades: {:#}", e),
            }
        }

        Ok(report)
    }
}
