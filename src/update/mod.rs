//! The update scanner.
//!
//! Checks every installed package against its latest release and records a
//! pending update for each one with a newer version. Nothing is installed;
//! the upgrade orchestrator consumes what the scan records.
//!
//! A package whose release cannot be fetched, or whose versions cannot be
//! compared, is reported as a failure and the scan moves on.

use crate::github::ReleaseSource;
use crate::metadata::MetadataStore;
use crate::version::VersionComparator;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// A newer release found by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub package: String,
    pub installed_version: String,
    /// Tag of the newer release, as published.
    pub tag: String,
}

/// A package the scan could not check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub package: String,
    pub reason: String,
}

/// Result of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of packages looked at.
    pub checked: usize,
    /// Updates recorded by this scan. Updates already pending at the same tag
    /// are not repeated here.
    pub new_pending: Vec<PendingUpdate>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    #[must_use]
    pub fn new_pending_count(&self) -> usize {
        self.new_pending.len()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Finds newer releases of installed packages.
pub struct UpdateScanner<'a> {
    source: &'a dyn ReleaseSource,
    store: &'a MetadataStore,
}

impl<'a> UpdateScanner<'a> {
    pub fn new(source: &'a dyn ReleaseSource, store: &'a MetadataStore) -> Self {
        Self { source, store }
    }

    /// Scan every installed package.
    ///
    /// Each new pending update is written to the metadata file as soon as it
    /// is found.
    ///
    /// # Errors
    ///
    /// Returns an error only if the metadata file cannot be read or written;
    /// per-package failures are collected in the report.
    pub async fn scan_all(&self) -> Result<ScanReport> {
        let document = self.store.load()?;
        let mut report = ScanReport::default();

        for (package, record) in &document.packages {
            report.checked += 1;
            let tag_prefix = record.tag_prefix.as_deref();

            let newer = match self.newer_release(package, &record.version, tag_prefix).await {
                Ok(newer) => newer,
                Err(e) => {
                    warn!("Could not check {} for updates: {:#}", package, e);
                    report.failures.push(ScanFailure {
                        package: package.clone(),
                        reason: format!("{e:#}"),
                    });
                    continue;
                }
            };

            let Some(tag) = newer else {
                debug!("{} {} is up to date", package, record.version);
                continue;
            };

            let recorded = self.store.update(|doc| doc.set_pending(package, &tag))?;
            if recorded {
                info!("Update available for {}: {} -> {}", package, record.version, tag);
                report.new_pending.push(PendingUpdate {
                    package: package.clone(),
                    installed_version: record.version.clone(),
                    tag,
                });
            } else {
                debug!("Update {} for {} is already pending", tag, package);
            }
        }

        Ok(report)
    }

    /// The tag of the latest release if it is newer than `installed`.
    async fn newer_release(
        &self,
        package: &str,
        installed: &str,
        tag_prefix: Option<&str>,
    ) -> Result<Option<String>> {
        let release = self.source.latest_release(package, tag_prefix).await?;
        let latest = VersionComparator::normalize_tag(&release.tag_name, tag_prefix);
        let newer = VersionComparator::is_newer(&latest, installed).with_context(|| {
            format!("Cannot compare {installed} with release {}", release.tag_name)
        })?;
        Ok(newer.then_some(release.tag_name))
    }
}
