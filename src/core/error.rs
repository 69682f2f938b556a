//! Error handling for get
//!
//! This module provides the error taxonomy of the package lifecycle engine and the
//! user-facing rendering of those errors. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can react to specific failures
//! 2. **User-friendly messages** that say which stage failed and what to do next
//!
//! # Architecture
//!
//! - [`GetError`] - Enumerated error types for every failure the engine reports
//! - [`InstallStage`] - The install stage (download, validate, install, metadata) an
//!   error belongs to; recovery actions differ per stage
//! - [`RollbackOutcome`] - What happened to system state after a metadata write failed
//! - [`ErrorContext`] - Wrapper adding suggestions and details for CLI display
//!
//! Engine functions return [`anyhow::Result`]. Typed errors are recovered with
//! `downcast_ref::<GetError>()`, which is what [`user_friendly_error`] does.
//!
//! Cancelling an asset selection is not an error: it is reported through the
//! outcome enums of the engine (for example `InstallOutcome::Cancelled`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use get_cli::core::{GetError, user_friendly_error};
//!
//! let error = GetError::NotInstalled {
//!     package: "owner/repo".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The stage of an installation at which an error occurred.
///
/// Install errors are reported with their stage because the recovery action is
/// different for each: a download failure can simply be retried, a validation
/// failure means the asset itself is bad, an install failure needs a look at the
/// package tool output, and a metadata failure may have left system state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    /// Fetching the asset body.
    Download,
    /// Checking that the downloaded artifact is well-formed.
    Validate,
    /// Handing the artifact to the package tool or placing the binary.
    Install,
    /// Committing the package record to the metadata file.
    Metadata,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Download => "download",
            Self::Validate => "validate",
            Self::Install => "install",
            Self::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// Result of undoing a system-level install after the metadata commit failed.
///
/// A fully failed rollback is not represented here; it is reported as
/// [`GetError::RollbackFailed`] because the operator has to intervene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The installed package or binary was removed again.
    Succeeded,
    /// The new artifact was taken back and the one it replaced is in place again.
    Restored {
        /// What is installed again, for example `owner/tool 1.0.0`
        previous: String,
    },
    /// The main artifact was removed but something remains on the system.
    Partial {
        /// What was left behind
        remaining: String,
    },
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("rollback succeeded, the installation was undone"),
            Self::Restored { previous } => write!(f, "rollback succeeded, {previous} is back in place"),
            Self::Partial { remaining } => write!(f, "rollback partially succeeded: {remaining}"),
        }
    }
}

/// The main error type for get operations.
///
/// # Error Categories
///
/// ## Package state
/// - [`AlreadyInstalled`] - install requested for a tracked package
/// - [`NotInstalled`] - remove or upgrade requested for an untracked package
/// - [`NoPendingUpdate`] - upgrade requested but the scanner recorded nothing
/// - [`InvalidPackageId`] - input is not an `owner/repo` identifier
///
/// ## Release contents
/// - [`NoAssetFound`] - the release has nothing installable
/// - [`NoInstallableInArchive`] - an archive holds neither a `.deb` nor an executable
///
/// ## Install stages
/// - [`DownloadFailed`] - the asset body could not be fetched
/// - [`ValidationFailed`] - the artifact is not a well-formed package
/// - [`PrivilegedCommandFailed`] - an elevated command exited unsuccessfully
/// - [`InstallFailed`] - preparing or placing the artifact failed locally
/// - [`SelfUpgradeFailed`] - replacing the running binary failed
/// - [`MetadataPersistenceFailed`] - the metadata write failed and rollback ran
/// - [`RollbackFailed`] - the metadata write failed and so did the rollback
///
/// ## Other
/// - [`InvalidVersionFormat`] - a version string cannot be ordered
/// - [`NetworkFailure`] - the release source could not be reached
/// - [`MetadataCorrupt`] - the metadata file cannot be parsed
/// - [`Other`] - anything without a dedicated variant
///
/// [`AlreadyInstalled`]: GetError::AlreadyInstalled
/// [`NotInstalled`]: GetError::NotInstalled
/// [`NoPendingUpdate`]: GetError::NoPendingUpdate
/// [`InvalidPackageId`]: GetError::InvalidPackageId
/// [`NoAssetFound`]: GetError::NoAssetFound
/// [`NoInstallableInArchive`]: GetError::NoInstallableInArchive
/// [`DownloadFailed`]: GetError::DownloadFailed
/// [`ValidationFailed`]: GetError::ValidationFailed
/// [`PrivilegedCommandFailed`]: GetError::PrivilegedCommandFailed
/// [`InstallFailed`]: GetError::InstallFailed
/// [`SelfUpgradeFailed`]: GetError::SelfUpgradeFailed
/// [`MetadataPersistenceFailed`]: GetError::MetadataPersistenceFailed
/// [`RollbackFailed`]: GetError::RollbackFailed
/// [`InvalidVersionFormat`]: GetError::InvalidVersionFormat
/// [`NetworkFailure`]: GetError::NetworkFailure
/// [`MetadataCorrupt`]: GetError::MetadataCorrupt
/// [`Other`]: GetError::Other
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GetError {
    /// The package already has a record in the metadata file.
    #[error("Package {package} is already installed")]
    AlreadyInstalled {
        /// Package identifier (`owner/repo`)
        package: String,
    },

    /// The package has no record in the metadata file.
    #[error("Package {package} is not installed")]
    NotInstalled {
        /// Package identifier (`owner/repo`)
        package: String,
    },

    /// The given string is not a GitHub `owner/repo` identifier.
    #[error("Invalid GitHub repository '{input}': expected owner/repo or a github.com URL")]
    InvalidPackageId {
        /// The rejected input
        input: String,
    },

    /// The release contains no asset that can be installed.
    #[error("No installable asset found in release {tag} of {package}")]
    NoAssetFound {
        /// Package identifier
        package: String,
        /// Release tag that was inspected
        tag: String,
    },

    /// An upgrade was requested but no pending update is recorded.
    #[error("No pending update found for package {package}")]
    NoPendingUpdate {
        /// Package identifier
        package: String,
    },

    /// The asset body could not be downloaded.
    #[error("[download] Failed to download {asset}: {reason}")]
    DownloadFailed {
        /// Asset file name
        asset: String,
        /// Underlying failure
        reason: String,
    },

    /// The downloaded artifact failed package-format validation.
    #[error("[validate] {asset} is not a valid package: {reason}")]
    ValidationFailed {
        /// Asset file name
        asset: String,
        /// Output of the validation command
        reason: String,
    },

    /// An elevated command exited with a failure status.
    #[error("[install] Command `{command}` failed: {output}")]
    PrivilegedCommandFailed {
        /// The command line that was run
        command: String,
        /// Combined stdout/stderr of the command
        output: String,
    },

    /// A local step of the install failed, such as marking a file executable.
    #[error("[install] Failed to install {asset}: {reason}")]
    InstallFailed {
        /// Asset or member file name
        asset: String,
        /// Underlying failure
        reason: String,
    },

    /// An archive was extracted but contained nothing installable.
    #[error("[install] No .deb package or executable found inside archive {archive}")]
    NoInstallableInArchive {
        /// Archive file name
        archive: String,
    },

    /// Replacing the tool's own running binary failed.
    #[error("[install] Failed to replace running binary {path}: {reason} ({restore})")]
    SelfUpgradeFailed {
        /// Target binary path
        path: String,
        /// Why the copy failed
        reason: String,
        /// Whether the moved-aside original was put back
        restore: String,
    },

    /// Writing the metadata file failed after the system was changed; rollback ran.
    #[error("[metadata] Failed to record {package} in metadata: {reason}; {rollback}")]
    MetadataPersistenceFailed {
        /// Package identifier
        package: String,
        /// Why the write failed
        reason: String,
        /// What the rollback achieved
        rollback: RollbackOutcome,
    },

    /// Writing the metadata file failed and undoing the install failed too.
    #[error(
        "[metadata] Failed to record {package} in metadata: {original}; rollback also failed: {rollback}. The package is installed but not tracked"
    )]
    RollbackFailed {
        /// Package identifier
        package: String,
        /// The metadata write failure
        original: String,
        /// The rollback failure
        rollback: String,
    },

    /// A version string could not be turned into an ordering key.
    #[error("Invalid version format: {version} ({reason})")]
    InvalidVersionFormat {
        /// The version string as given
        version: String,
        /// Which part was rejected
        reason: String,
    },

    /// The release source could not be reached or answered with an error.
    #[error("Network error during {operation}: {reason}")]
    NetworkFailure {
        /// What was being fetched
        operation: String,
        /// Underlying failure
        reason: String,
    },

    /// The metadata file exists but cannot be parsed.
    #[error("Metadata file {path} is corrupt: {reason}")]
    MetadataCorrupt {
        /// Metadata file path
        path: String,
        /// Parser message
        reason: String,
    },

    /// Any other failure, shown as-is.
    #[error("{message}")]
    Other {
        /// Full error message including its cause chain
        message: String,
    },
}

impl GetError {
    /// The install stage this error belongs to, if it is an install-path error.
    #[must_use]
    pub const fn stage(&self) -> Option<InstallStage> {
        match self {
            Self::DownloadFailed { .. } => Some(InstallStage::Download),
            Self::ValidationFailed { .. } => Some(InstallStage::Validate),
            Self::PrivilegedCommandFailed { .. }
            | Self::InstallFailed { .. }
            | Self::NoInstallableInArchive { .. }
            | Self::SelfUpgradeFailed { .. } => Some(InstallStage::Install),
            Self::MetadataPersistenceFailed { .. }
            | Self::RollbackFailed { .. } => Some(InstallStage::Metadata),
            _ => None,
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// Pairs a [`GetError`] with an optional suggestion and additional details, and
/// renders them with colors for terminal output.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: GetError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: GetError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for how to resolve the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining why the error occurred.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for display.
///
/// Typed [`GetError`]s anywhere in the chain get tailored suggestions. I/O
/// permission problems are recognised as well. Anything else is shown with its
/// full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(get_error) = cause.downcast_ref::<GetError>() {
            return create_error_context(get_error.clone());
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(GetError::PrivilegedCommandFailed {
            command: "file access".to_string(),
            output: io_error.to_string(),
        })
        .with_suggestion("Check file ownership, or that the elevation tool (sudo/pkexec) is available")
        .with_details("get needs elevated permissions to install into system directories");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(GetError::Other { message })
}

fn create_error_context(error: GetError) -> ErrorContext {
    match &error {
        GetError::AlreadyInstalled { package } => {
            let suggestion = format!(
                "Run 'get update' to check for a newer release, or 'get remove {package}' first"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        GetError::NotInstalled { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'get list' to see the packages installed through get"),
        GetError::InvalidPackageId { .. } => ErrorContext::new(error).with_suggestion(
            "Use the form owner/repo, for example 'get install cli/cli' or 'get install https://github.com/cli/cli'",
        ),
        GetError::NoAssetFound { .. } => ErrorContext::new(error)
            .with_details("The release has no .deb package, executable, or archive containing one"),
        GetError::NoPendingUpdate { .. } => ErrorContext::new(error).with_suggestion("Run 'get update' to check for updates first"),
        GetError::DownloadFailed { .. }
        | GetError::NetworkFailure { .. } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection and retry. Set GITHUB_TOKEN if you are rate limited")
            .with_details("Nothing was installed; retrying is safe"),
        GetError::ValidationFailed { .. } => ErrorContext::new(error)
            .with_details("The downloaded file was rejected before installation; the system was not changed")
            .with_suggestion("Choose a different asset, or report the broken asset to the project"),
        GetError::PrivilegedCommandFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Check the command output above. For dependency problems try 'sudo apt-get install -f'"),
        GetError::InstallFailed { .. } => ErrorContext::new(error)
            .with_details("The failure happened before anything was copied into place")
            .with_suggestion("Check free space in the temporary directory and retry"),
        GetError::NoInstallableInArchive { .. } => ErrorContext::new(error)
            .with_suggestion("Choose a different asset, or install the archive contents manually"),
        GetError::SelfUpgradeFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Retry the upgrade; if the binary is missing, reinstall get manually"),
        GetError::MetadataPersistenceFailed { rollback, .. } => {
            let ctx = ErrorContext::new(error.clone())
                .with_suggestion("Check that the metadata directory is writable, then install again");
            match rollback {
                RollbackOutcome::Succeeded => {
                    ctx.with_details("The installation was rolled back; the system is unchanged")
                }
                RollbackOutcome::Restored { .. } => ctx.with_details(
                    "The new version was rolled back and the previously installed version is in use again",
                ),
                RollbackOutcome::Partial { remaining } => ctx.with_details(format!(
                    "The new package was removed but the system is not back to its earlier state: {remaining}"
                )),
            }
        }
        GetError::RollbackFailed { .. } => ErrorContext::new(error)
            .with_details("The package is installed on the system but get does not track it")
            .with_suggestion("Remove the package manually (dpkg --remove or delete the binary) and install again"),
        GetError::InvalidVersionFormat { .. } => ErrorContext::new(error)
            .with_details("Versions are compared as MAJOR.MINOR.PATCH with numeric components"),
        GetError::MetadataCorrupt { path, .. } => {
            let suggestion = format!("Fix or move away {path}; it will be recreated on the next install");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        GetError::Other { .. } => ErrorContext::new(error),
    }
}
