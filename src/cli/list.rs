//! List installed packages.

use crate::manager::{InstalledPackage, PackageManager};
use anyhow::Result;
use chrono::DateTime;
use clap::Args;
use colored::Colorize;

/// Arguments of `get list`.
#[derive(Args, Debug)]
pub struct ListCommand {}

impl ListCommand {
    pub fn execute(self, manager: &PackageManager) -> Result<()> {
        let packages = manager.list()?;
        if packages.is_empty() {
            println!("{}", "No packages installed".dimmed());
            return Ok(());
        }

        let width = packages.iter().map(|p| p.package.len()).max().unwrap_or(0);
        for package in &packages {
            println!("{}", format_row(package, width));
        }
        Ok(())
    }
}

/// The date part of an RFC 3339 timestamp, or the timestamp unchanged.
fn display_date(installed_at: &str) -> String {
    DateTime::parse_from_rfc3339(installed_at)
        .map_or_else(|_| installed_at.to_string(), |date| date.format("%Y-%m-%d").to_string())
}

fn format_row(package: &InstalledPackage, width: usize) -> String {
    let record = &package.record;
    let kind = record
        .artifact()
        .map_or_else(|| "unknown".to_string(), |artifact| artifact.install_type().to_string());
    format!(
        "{:<width$}  {}  {}  {}",
        package.package,
        record.version,
        display_date(&record.installed_at),
        kind,
    )
}
