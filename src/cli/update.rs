//! Check installed packages for newer releases.

use crate::manager::PackageManager;
use crate::update::ScanReport;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Arguments of `get update`.
#[derive(Args, Debug)]
pub struct UpdateCommand {}

impl UpdateCommand {
    pub async fn execute(self, manager: &PackageManager) -> Result<()> {
        let report = manager.update().await?;
        print_scan(&report);
        check_scan(&report)
    }
}

pub(super) fn print_scan(report: &ScanReport) {
    for update in &report.new_pending {
        println!(
            "{} {} {} -> {}",
            "Update available:".cyan().bold(),
            update.package,
            update.installed_version,
            update.tag
        );
    }
    for failure in &report.failures {
        eprintln!("{} {}: {}", "Could not check".yellow(), failure.package, failure.reason);
    }
    if report.new_pending.is_empty() && report.failures.is_empty() {
        println!("{}", format!("Checked {} packages, no new updates", report.checked).dimmed());
    }
}

/// Fail the command if any package could not be checked.
pub(super) fn check_scan(report: &ScanReport) -> Result<()> {
    if report.has_failures() {
        bail!(
            "Could not check {} of {} packages for updates",
            report.failures.len(),
            report.checked
        );
    }
    Ok(())
}
