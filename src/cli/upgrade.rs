//! Install pending updates.

use crate::manager::PackageManager;
use crate::upgrade::{UpgradeOutcome, UpgradeReport};
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Arguments of `get upgrade`.
///
/// Without a package, every pending update is installed. The asset chosen for
/// the previous install is matched in the new release; the match is confirmed
/// unless `--yes` is given.
#[derive(Args, Debug)]
pub struct UpgradeCommand {
    /// Upgrade only this package.
    #[arg(value_name = "PACKAGE")]
    pub package: Option<String>,

    /// Accept matched assets without asking.
    #[arg(short, long)]
    pub yes: bool,
}

impl UpgradeCommand {
    pub async fn execute(self, manager: &PackageManager) -> Result<()> {
        match self.package {
            Some(package) => match manager.upgrade(&package).await? {
                UpgradeOutcome::Upgraded(report) => {
                    println!("{} {} to {}", "Upgraded".green().bold(), report.package, report.version);
                    Ok(())
                }
                UpgradeOutcome::Cancelled => {
                    println!("{}", "Upgrade cancelled".yellow());
                    Ok(())
                }
            },
            None => upgrade_all(manager).await,
        }
    }
}

pub(super) async fn upgrade_all(manager: &PackageManager) -> Result<()> {
    let report = manager.upgrade_all().await?;
    print_summary(&report);
    check_upgrades(&report)
}

fn print_summary(report: &UpgradeReport) {
    if report.upgraded.is_empty() && report.cancelled.is_empty() && report.failed.is_empty() {
        println!("{}", "No pending updates".dimmed());
        return;
    }
    println!(
        "{} upgraded, {} skipped, {} failed",
        report.upgraded.len(),
        report.cancelled.len(),
        report.failed.len()
    );
}

/// Fail the command if an update failed and is still pending.
fn check_upgrades(report: &UpgradeReport) -> Result<()> {
    if report.is_failure() {
        let packages: Vec<&str> = report
            .failed
            .iter()
            .filter(|failure| failure.still_pending)
            .map(|failure| failure.package.as_str())
            .collect();
        bail!("Failed to upgrade {}", packages.join(", "));
    }
    Ok(())
}
