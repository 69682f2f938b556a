//! get - a personal package manager for GitHub releases
//!
//! get installs software published as GitHub release assets, records what it
//! installed, and keeps it up to date. Three kinds of assets are handled:
//!
//! - Debian packages, installed with `dpkg` (with one `apt-get install -f` pass
//!   to pull in missing dependencies)
//! - Standalone executables, copied into a binary directory
//! - Archives (`.zip`, `.tar`, `.tar.gz`, `.gz`), whose first package or
//!   executable is installed
//!
//! # Architecture Overview
//!
//! ```text
//!   cli ──> manager ──┬──> assets (classify, select) ──> frontend (prompts)
//!                     ├──> installer (deb | binary | archive, rollback)
//!                     ├──> update (scanner) ──> version (ordering keys)
//!                     └──> upgrade (orchestrator)
//!                               │
//!          github (ReleaseSource) + metadata (JSON store)
//! ```
//!
//! The engine reaches the outside world through two traits:
//! [`github::ReleaseSource`] for releases and downloads, and
//! [`frontend::Frontend`] for notifications, prompts and (privileged) commands.
//! Everything else is explicit configuration ([`config::EngineConfig`]).
//!
//! # Core Modules
//!
//! - [`assets`] - Asset classification and selection
//! - [`cli`] - Command-line interface
//! - [`config`] - Global configuration file and engine settings
//! - [`core`] - Error taxonomy and user-facing error rendering
//! - [`frontend`] - Presentation and command execution interface
//! - [`github`] - Release types, the release-source trait, and the GitHub client
//! - [`installer`] - The install router and rollback
//! - [`manager`] - One entry point per command
//! - [`metadata`] - Package records and pending updates in a JSON file
//! - [`update`] - Scanning for newer releases
//! - [`upgrade`] - Applying pending updates
//! - [`utils`] - File system, archive and progress helpers
//! - [`version`] - Release tag ordering
//!
//! # Command-Line Usage
//!
//! ```bash
//! get install https://github.com/cli/cli
//! get list
//! get update
//! get upgrade --yes
//! get remove cli/cli
//! ```

pub mod assets;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod frontend;
pub mod github;
pub mod installer;
pub mod manager;
pub mod metadata;
pub mod update;
pub mod upgrade;
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
