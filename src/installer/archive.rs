//! Finding the installable member of an extracted archive.

use crate::assets::AssetKind;
use crate::assets::classify::{kind_from_mime, sniff_mime};
use crate::constants::SNIFF_LEN;
use crate::core::GetError;
use crate::utils::archive::{self, ArchiveFormat};
use crate::utils::fs::{read_prefix, regular_files_sorted};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file found inside an archive, and how to install it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub path: PathBuf,
    /// `Deb` or `Binary`.
    pub kind: AssetKind,
}

impl ArchiveMember {
    /// File name of the member.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Extract the archive at `path` into `dest_dir`.
///
/// The format comes from the asset name, or from the leading bytes when the
/// name has no archive suffix.
///
/// # Errors
///
/// Returns [`GetError::ValidationFailed`] if the format is unknown or the
/// archive cannot be unpacked, and [`GetError::InstallFailed`] if the
/// download cannot be read.
pub async fn extract(path: &Path, asset_name: &str, dest_dir: &Path) -> Result<()> {
    let install_failed = |reason: String| GetError::InstallFailed {
        asset: asset_name.to_string(),
        reason,
    };

    let format = match ArchiveFormat::from_name(asset_name) {
        Some(format) => format,
        None => {
            let prefix = read_prefix(path, SNIFF_LEN).map_err(|e| install_failed(format!("{e:#}")))?;
            ArchiveFormat::from_prefix(&prefix).ok_or_else(|| GetError::ValidationFailed {
                asset: asset_name.to_string(),
                reason: "not a zip, tar or gzip archive".to_string(),
            })?
        }
    };
    debug!("Extracting {} as {:?}", asset_name, format);

    let (path, name, dest) = (path.to_path_buf(), asset_name.to_string(), dest_dir.to_path_buf());
    tokio::task::spawn_blocking(move || archive::extract(&path, &name, format, &dest))
        .await
        .map_err(|e| install_failed(format!("extraction task failed: {e}")))?
        .map_err(|e| {
            GetError::ValidationFailed {
                asset: asset_name.to_string(),
                reason: format!("{e:#}"),
            }
            .into()
        })
}

/// The member of an extracted archive to install.
///
/// Files are sniffed in sorted path order. The first Debian package wins over
/// any executable; otherwise the first executable is used.
///
/// # Errors
///
/// Returns [`GetError::NoInstallableInArchive`] if neither is present.
pub fn find_installable(extracted: &Path, archive_name: &str) -> Result<ArchiveMember> {
    let mut first_binary = None;

    for path in regular_files_sorted(extracted) {
        let prefix = match read_prefix(&path, SNIFF_LEN) {
            Ok(prefix) => prefix,
            Err(e) => {
                debug!("Skipping unreadable {}: {e}", path.display());
                continue;
            }
        };
        match sniff_mime(&prefix).and_then(kind_from_mime) {
            Some(AssetKind::Deb) => {
                debug!("Found package {} in {}", path.display(), archive_name);
                return Ok(ArchiveMember {
                    path,
                    kind: AssetKind::Deb,
                });
            }
            Some(AssetKind::Binary) if first_binary.is_none() => first_binary = Some(path),
            _ => {}
        }
    }

    first_binary
        .map(|path| ArchiveMember {
            path,
            kind: AssetKind::Binary,
        })
        .ok_or_else(|| {
            GetError::NoInstallableInArchive {
                archive: archive_name.to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{deb_bytes, elf_bytes, tar_gz_bytes, zip_bytes};
    use tempfile::TempDir;

    #[test]
    fn test_deb_wins_over_binary() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::write(temp.path().join("a/tool"), elf_bytes("x")).unwrap();
        std::fs::write(temp.path().join("b_pkg.deb"), deb_bytes("pkg")).unwrap();

        let member = find_installable(temp.path(), "bundle.tar.gz").unwrap();
        assert_eq!(member.kind, AssetKind::Deb);
        assert_eq!(member.file_name(), "b_pkg.deb");
    }

    #[test]
    fn test_first_binary_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("README"), b"read me").unwrap();
        std::fs::write(temp.path().join("zeta"), elf_bytes("z")).unwrap();
        std::fs::write(temp.path().join("alpha"), elf_bytes("a")).unwrap();

        let member = find_installable(temp.path(), "bundle.zip").unwrap();
        assert_eq!(member.kind, AssetKind::Binary);
        assert_eq!(member.file_name(), "alpha");
    }

    #[test]
    fn test_nothing_installable() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("README.md"), b"docs").unwrap();

        let err = find_installable(temp.path(), "docs.zip").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GetError>(),
            Some(GetError::NoInstallableInArchive { .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_by_name_and_by_content() {
        let temp = TempDir::new().unwrap();

        let tarball = temp.path().join("tool.tar.gz");
        std::fs::write(&tarball, tar_gz_bytes(vec![("tool-1.0/tool", elf_bytes("t"))])).unwrap();
        extract(&tarball, "tool.tar.gz", &temp.path().join("out1")).await.unwrap();
        assert!(temp.path().join("out1/tool-1.0/tool").exists());

        // no archive suffix: detected from the zip signature
        let zipped = temp.path().join("download");
        std::fs::write(&zipped, zip_bytes(vec![("tool", elf_bytes("t"))])).unwrap();
        extract(&zipped, "tool-linux", &temp.path().join("out2")).await.unwrap();
        assert!(temp.path().join("out2/tool").exists());
    }

    #[tokio::test]
    async fn test_corrupt_archive_fails_validation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tool.tar.gz");
        let mut truncated = tar_gz_bytes(vec![("tool", elf_bytes("t"))]);
        truncated.truncate(20);
        std::fs::write(&path, truncated).unwrap();

        let err = extract(&path, "tool.tar.gz", &temp.path().join("out")).await.unwrap_err();

        let get_err = err.downcast_ref::<GetError>().unwrap();
        assert!(matches!(get_err, GetError::ValidationFailed { .. }));
        assert_eq!(get_err.stage(), Some(crate::core::InstallStage::Validate));
    }

    #[tokio::test]
    async fn test_unknown_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob");
        std::fs::write(&path, b"plain text").unwrap();

        let err = extract(&path, "blob", &temp.path().join("out")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<GetError>(), Some(GetError::ValidationFailed { .. })));
    }
}
