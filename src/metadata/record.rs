//! Metadata document and package record types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Mechanism a package was installed by, independent of the asset's container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallType {
    /// Installed through dpkg; tracked by its package name.
    Deb,
    /// Copied into the binary directory; tracked by its path.
    Binary,
}

impl fmt::Display for InstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deb => "deb",
            Self::Binary => "binary",
        })
    }
}

/// What an install left on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledArtifact {
    /// A dpkg package with the given name.
    Deb { apt_name: String },
    /// An executable at the given absolute path.
    Binary { path: PathBuf },
}

impl InstalledArtifact {
    #[must_use]
    pub const fn install_type(&self) -> InstallType {
        match self {
            Self::Deb { .. } => InstallType::Deb,
            Self::Binary { .. } => InstallType::Binary,
        }
    }
}

impl fmt::Display for InstalledArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deb { apt_name } => write!(f, "package {apt_name}"),
            Self::Binary { path } => write!(f, "binary {}", path.display()),
        }
    }
}

/// An installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PackageRecord {
    /// Installed version, without tag prefix or leading `v`.
    pub version: String,

    /// Publish date of the installed release.
    pub installed_at: String,

    /// Missing in records written before binaries were supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_type: Option<InstallType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apt_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_path: Option<PathBuf>,

    /// Asset file name as published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,

    /// Asset name used to re-select automatically on upgrade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_asset: Option<String>,

    /// Tag prefix used for every release lookup of this package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_prefix: Option<String>,
}

impl PackageRecord {
    /// Record for a fresh install of `artifact`.
    #[must_use]
    pub fn new(
        version: impl Into<String>,
        installed_at: impl Into<String>,
        artifact: &InstalledArtifact,
    ) -> Self {
        let mut record = Self {
            version: version.into(),
            installed_at: installed_at.into(),
            ..Self::default()
        };
        record.set_artifact(artifact);
        record
    }

    /// Point the record at `artifact`, clearing the field of the other type.
    pub fn set_artifact(&mut self, artifact: &InstalledArtifact) {
        self.install_type = Some(artifact.install_type());
        match artifact {
            InstalledArtifact::Deb { apt_name } => {
                self.apt_name = Some(apt_name.clone());
                self.binary_path = None;
            }
            InstalledArtifact::Binary { path } => {
                self.binary_path = Some(path.clone());
                self.apt_name = None;
            }
        }
    }

    /// The installed artifact, if the record identifies one.
    ///
    /// Legacy records without `install_type` but with `apt_name` are deb installs.
    #[must_use]
    pub fn artifact(&self) -> Option<InstalledArtifact> {
        let install_type = self
            .install_type
            .or_else(|| self.apt_name.as_ref().map(|_| InstallType::Deb))?;
        match install_type {
            InstallType::Deb => self.apt_name.as_ref().map(|apt_name| InstalledArtifact::Deb {
                apt_name: apt_name.clone(),
            }),
            InstallType::Binary => self.binary_path.as_ref().map(|path| InstalledArtifact::Binary {
                path: path.clone(),
            }),
        }
    }

    #[must_use]
    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_chosen_asset(mut self, name: impl Into<String>) -> Self {
        self.chosen_asset = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_tag_prefix(mut self, prefix: Option<String>) -> Self {
        self.tag_prefix = prefix.filter(|p| !p.is_empty());
        self
    }
}

/// The whole metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MetadataDocument {
    #[serde(default)]
    pub packages: BTreeMap<String, PackageRecord>,

    /// Package identifier to the tag of the newer release.
    #[serde(default)]
    pub pending_updates: BTreeMap<String, String>,
}

impl MetadataDocument {
    #[must_use]
    pub fn is_installed(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    /// Store `record` for `package` and clear its pending update.
    pub fn record_install(&mut self, package: &str, record: PackageRecord) {
        self.packages.insert(package.to_string(), record);
        self.pending_updates.remove(package);
    }

    /// Forget `package` entirely. Returns the removed record.
    pub fn remove_package(&mut self, package: &str) -> Option<PackageRecord> {
        self.pending_updates.remove(package);
        self.packages.remove(package)
    }

    /// Record a pending update unless the same one is already recorded.
    ///
    /// Returns whether the document changed. Packages without a record never
    /// get a pending update.
    pub fn set_pending(&mut self, package: &str, tag: &str) -> bool {
        if !self.is_installed(package) {
            return false;
        }
        if self.pending_updates.get(package).is_some_and(|existing| existing == tag) {
            return false;
        }
        self.pending_updates.insert(package.to_string(), tag.to_string());
        true
    }

    /// Drop pending updates whose package has no record. Returns how many went.
    pub fn prune_orphaned_pending(&mut self) -> usize {
        let before = self.pending_updates.len();
        let packages = &self.packages;
        self.pending_updates.retain(|package, _| packages.contains_key(package));
        before - self.pending_updates.len()
    }
}
