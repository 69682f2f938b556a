//! Global constants used throughout the get codebase.
//!
//! This module contains the tool's own identity, default locations, and the
//! timeouts and sizes used by the release source and asset classifier.

use std::time::Duration;

/// Package identifier of get itself.
///
/// Installing or upgrading this package replaces the running executable, which
/// needs the move-aside handling in the binary installer.
pub const SELF_PACKAGE_ID: &str = "tranquil-tr0/get";

/// File name of get's own executable.
pub const SELF_BINARY_NAME: &str = "get";

/// Directory binaries are installed into unless configured otherwise.
pub const DEFAULT_BIN_DIR: &str = "/usr/local/bin";

/// Base URL of the GitHub REST API.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Number of leading bytes fetched to sniff an asset's type (`bytes=0-261`).
///
/// 262 bytes covers the ustar magic at offset 257.
pub const SNIFF_LEN: usize = 262;

/// Default timeout for the ranged sniff request (15 seconds).
///
/// Full downloads are not bounded.
pub const DEFAULT_SNIFF_TIMEOUT: Duration = Duration::from_secs(15);

/// Number of releases listed when searching for a tag prefix.
pub const RELEASES_PAGE_SIZE: usize = 100;

/// Suffix of the moved-aside copy of a running binary during self-upgrade.
pub const BACKUP_SUFFIX: &str = ".old";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "GET_CONFIG_PATH";

/// Environment variable holding an optional GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable that hides progress bars when set.
pub const NO_PROGRESS_ENV: &str = "GET_NO_PROGRESS";
