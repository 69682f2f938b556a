//! Check for updates, then install them.

use super::update::{check_scan, print_scan};
use super::upgrade::upgrade_all;
use crate::manager::PackageManager;
use anyhow::Result;
use clap::Args;

/// Arguments of `get update-upgrade` (`get up`).
#[derive(Args, Debug)]
pub struct UpdateUpgradeCommand {
    /// Accept matched assets without asking.
    #[arg(short, long)]
    pub yes: bool,
}

impl UpdateUpgradeCommand {
    /// Packages that could not be checked do not stop the upgrade; the command
    /// still fails afterwards.
    pub async fn execute(self, manager: &PackageManager) -> Result<()> {
        let scan = manager.update().await?;
        print_scan(&scan);
        upgrade_all(manager).await?;
        check_scan(&scan)
    }
}
