//! Archive extraction for release assets.
//!
//! Supports `.zip`, `.tar`, `.tar.gz`/`.tgz` and single-file `.gz`. All
//! extraction is done in Rust; entries whose paths would land outside the
//! destination directory are rejected.

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tar::Archive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const USTAR_MAGIC: &[u8] = b"ustar";
const USTAR_OFFSET: usize = 257;

/// Container formats get can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    /// A single gzip-compressed file, which may itself turn out to be a tarball.
    Gz,
}

impl ArchiveFormat {
    /// Format implied by a file name suffix (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar") {
            Some(Self::Tar)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".gz") {
            Some(Self::Gz)
        } else {
            None
        }
    }

    /// Format implied by the leading bytes of a file.
    #[must_use]
    pub fn from_prefix(prefix: &[u8]) -> Option<Self> {
        if prefix.starts_with(ZIP_MAGIC) {
            Some(Self::Zip)
        } else if prefix.starts_with(GZIP_MAGIC) {
            Some(Self::Gz)
        } else if is_tar(prefix) {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

fn is_tar(prefix: &[u8]) -> bool {
    prefix
        .get(USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len())
        .is_some_and(|magic| magic == USTAR_MAGIC)
}

/// Extract `archive_path` into `dest_dir` using `format`.
///
/// `display_name` is the published asset name; it names the output of a
/// single-file `.gz`.
///
/// # Errors
///
/// Returns an error if the archive is malformed, an entry escapes `dest_dir`,
/// or a file cannot be written.
pub fn extract(
    archive_path: &Path,
    display_name: &str,
    format: ArchiveFormat,
    dest_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create {}", dest_dir.display()))?;

    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
        ArchiveFormat::Tar => {
            let file = open(archive_path)?;
            unpack_tar(BufReader::new(file), dest_dir)
        }
        ArchiveFormat::TarGz => {
            let file = open(archive_path)?;
            unpack_tar(GzDecoder::new(BufReader::new(file)), dest_dir)
        }
        ArchiveFormat::Gz => extract_gz(archive_path, display_name, dest_dir),
    }
    .with_context(|| format!("Failed to extract {display_name}"))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open archive: {}", path.display()))
}

fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<()> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);

    for entry in archive.entries().context("Failed to read tar entries")? {
        let mut entry = entry.context("Failed to read tar entry")?;
        let path = entry.path().context("Invalid tar entry path")?.into_owned();
        if !entry.unpack_in(dest_dir).with_context(|| format!("Failed to unpack {}", path.display()))? {
            bail!("Archive entry escapes extraction directory: {}", path.display());
        }
    }

    Ok(())
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).context("Failed to read ZIP archive")?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("Failed to read ZIP entry")?;
        let Some(relative) = entry.enclosed_name() else {
            bail!("Archive entry escapes extraction directory: {}", entry.name());
        };
        let outpath = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)
            .with_context(|| format!("Failed to create {}", outpath.display()))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to write {}", outpath.display()))?;

        if let Some(mode) = entry.unix_mode() {
            crate::utils::fs::set_mode(&outpath, mode & 0o7777)?;
        }
    }

    Ok(())
}

/// Decompress a `.gz` into `dest_dir`; a decompressed tarball is unpacked in place.
fn extract_gz(archive_path: &Path, display_name: &str, dest_dir: &Path) -> Result<()> {
    let output = dest_dir.join(gz_output_name(display_name));
    {
        let file = open(archive_path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut outfile = File::create(&output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        std::io::copy(&mut decoder, &mut outfile).context("Failed to decompress gzip stream")?;
    }

    let prefix = crate::utils::fs::read_prefix(&output, USTAR_OFFSET + USTAR_MAGIC.len())?;
    if is_tar(&prefix) {
        let file = open(&output)?;
        unpack_tar(BufReader::new(file), dest_dir)?;
        fs::remove_file(&output)
            .with_context(|| format!("Failed to remove {}", output.display()))?;
    }

    Ok(())
}

fn gz_output_name(display_name: &str) -> PathBuf {
    let base = Path::new(display_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("asset");
    let stem = base
        .strip_suffix(".gz")
        .or_else(|| base.strip_suffix(".GZ"))
        .filter(|stem| !stem.is_empty())
        .unwrap_or("asset");
    PathBuf::from(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(ArchiveFormat::from_name("tool-linux.tar.gz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_name("tool.TGZ"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_name("tool.tar"), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::from_name("tool.zip"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_name("tool.gz"), Some(ArchiveFormat::Gz));
        assert_eq!(ArchiveFormat::from_name("tool.deb"), None);
    }

    #[test]
    fn test_format_from_prefix() {
        assert_eq!(ArchiveFormat::from_prefix(b"PK\x03\x04rest"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_prefix(&[0x1f, 0x8b, 8]), Some(ArchiveFormat::Gz));
        assert_eq!(ArchiveFormat::from_prefix(&tar_bytes(&[("a", b"x")])), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::from_prefix(b"\x7fELF"), None);
    }

    #[test]
    fn test_extract_tar_gz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tool.tar.gz");
        fs::write(&archive, gzip(&tar_bytes(&[("tool-1.0/bin/tool", b"#!bin")]))).unwrap();

        let dest = temp.path().join("out");
        extract(&archive, "tool.tar.gz", ArchiveFormat::TarGz, &dest).unwrap();

        assert_eq!(fs::read(dest.join("tool-1.0/bin/tool")).unwrap(), b"#!bin");
    }

    #[test]
    fn test_extract_single_gz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("download");
        fs::write(&archive, gzip(b"binary-data")).unwrap();

        let dest = temp.path().join("out");
        extract(&archive, "tool-linux-amd64.gz", ArchiveFormat::Gz, &dest).unwrap();

        assert_eq!(fs::read(dest.join("tool-linux-amd64")).unwrap(), b"binary-data");
    }

    #[test]
    fn test_gz_containing_tar_is_unpacked() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("download");
        fs::write(&archive, gzip(&tar_bytes(&[("tool", b"bin")]))).unwrap();

        let dest = temp.path().join("out");
        extract(&archive, "tool.gz", ArchiveFormat::Gz, &dest).unwrap();

        assert_eq!(fs::read(dest.join("tool")).unwrap(), b"bin");
        assert_eq!(crate::utils::fs::regular_files_sorted(&dest).len(), 1);
    }

    #[test]
    fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tool.zip");
        {
            let file = File::create(&archive).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
            writer.start_file("dist/tool", options).unwrap();
            writer.write_all(b"zipped").unwrap();
            writer.finish().unwrap();
        }

        let dest = temp.path().join("out");
        extract(&archive, "tool.zip", ArchiveFormat::Zip, &dest).unwrap();

        assert_eq!(fs::read(dest.join("dist/tool")).unwrap(), b"zipped");
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"not a zip").unwrap();

        assert!(extract(&archive, "broken.zip", ArchiveFormat::Zip, &temp.path().join("out")).is_err());
    }
}
