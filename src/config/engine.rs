//! Runtime configuration threaded into the engine.

use super::global::GlobalConfig;
use crate::constants::{SELF_BINARY_NAME, SELF_PACKAGE_ID};
use std::path::PathBuf;

/// Explicit settings for one invocation of the package lifecycle engine.
///
/// Built once from [`GlobalConfig`] and the command line, then handed to
/// [`PackageManager`](crate::manager::PackageManager). Nothing in the engine
/// reads process-wide flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path of the JSON metadata file.
    pub metadata_path: PathBuf,
    /// Directory standalone binaries are installed into.
    pub bin_dir: PathBuf,
    /// Report each step to the frontend, not only to the log.
    pub verbose: bool,
    /// Accept automatically matched assets without asking.
    pub assume_yes: bool,
    /// Package identifier of the running tool.
    pub self_package: String,
    /// File name of the running tool's executable.
    pub self_binary: String,
}

impl EngineConfig {
    /// Engine settings for the given metadata file and binary directory.
    pub fn new(metadata_path: impl Into<PathBuf>, bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata_path: metadata_path.into(),
            bin_dir: bin_dir.into(),
            verbose: false,
            assume_yes: false,
            self_package: SELF_PACKAGE_ID.to_string(),
            self_binary: SELF_BINARY_NAME.to_string(),
        }
    }

    /// Engine settings taken from the user's configuration file.
    #[must_use]
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self::new(global.metadata_path.clone(), global.bin_dir.clone())
    }

    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub const fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Override the tool's own identity.
    #[must_use]
    pub fn with_self_identity(
        mut self,
        package: impl Into<String>,
        binary: impl Into<String>,
    ) -> Self {
        self.self_package = package.into();
        self.self_binary = binary.into();
        self
    }

    /// Whether installing `package` as `binary_name` replaces the running tool.
    #[must_use]
    pub fn is_self(&self, package: &str, binary_name: &str) -> bool {
        package == self.self_package && binary_name == self.self_binary
    }
}
