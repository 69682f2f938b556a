//! Asset classification.
//!
//! An asset is classified from two signals:
//!
//! 1. **Sniffed bytes** - the first 262 bytes of the body, matched against a
//!    magic-byte table that yields a MIME type
//! 2. **File name** - used when the sniff is unavailable or its MIME type does not
//!    map to an install route
//!
//! | MIME type                                 | Kind      |
//! |-------------------------------------------|-----------|
//! | `application/vnd.debian.binary-package`   | `Deb`     |
//! | `application/x-executable`                | `Binary`  |
//! | `application/gzip`, `application/x-tar`, `application/zip` | `Archive` |
//!
//! Recognised but unmapped types (rpm, xz, Windows executables, ...) fall back to
//! the file name like an unknown sniff does.

use std::fmt;

/// Install route of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Debian package, installed through dpkg.
    Deb,
    /// Standalone executable, or an asset that may be one.
    Binary,
    /// Archive that may contain a `.deb` or an executable.
    Archive,
    /// Anything else. Installable only as a manual binary override.
    Other,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deb => "deb",
            Self::Binary => "binary",
            Self::Archive => "archive",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

pub const MIME_DEB: &str = "application/vnd.debian.binary-package";
pub const MIME_EXECUTABLE: &str = "application/x-executable";
pub const MIME_GZIP: &str = "application/gzip";
pub const MIME_TAR: &str = "application/x-tar";
pub const MIME_ZIP: &str = "application/zip";

struct Magic {
    offset: usize,
    bytes: &'static [u8],
    mime: &'static str,
}

/// Checked in order; the debian `ar` signature precedes any plain `ar` match.
const MAGIC_TABLE: &[Magic] = &[
    Magic { offset: 0, bytes: b"!<arch>\ndebian-binary", mime: MIME_DEB },
    Magic { offset: 0, bytes: b"\x7fELF", mime: MIME_EXECUTABLE },
    Magic { offset: 0, bytes: &[0x1f, 0x8b, 0x08], mime: MIME_GZIP },
    Magic { offset: 0, bytes: b"PK\x03\x04", mime: MIME_ZIP },
    Magic { offset: 257, bytes: b"ustar", mime: MIME_TAR },
    Magic { offset: 0, bytes: &[0xed, 0xab, 0xee, 0xdb], mime: "application/x-rpm" },
    Magic { offset: 0, bytes: &[0xfd, b'7', b'z', b'X', b'Z', 0x00], mime: "application/x-xz" },
    Magic { offset: 0, bytes: b"BZh", mime: "application/x-bzip2" },
    Magic { offset: 0, bytes: &[0x28, 0xb5, 0x2f, 0xfd], mime: "application/zstd" },
    Magic { offset: 0, bytes: &[b'7', b'z', 0xbc, 0xaf, 0x27, 0x1c], mime: "application/x-7z-compressed" },
    Magic { offset: 0, bytes: b"MZ", mime: "application/vnd.microsoft.portable-executable" },
];

/// MIME type of a byte prefix, if the magic table knows it.
#[must_use]
pub fn sniff_mime(prefix: &[u8]) -> Option<&'static str> {
    MAGIC_TABLE
        .iter()
        .find(|magic| {
            prefix
                .get(magic.offset..magic.offset + magic.bytes.len())
                .is_some_and(|window| window == magic.bytes)
        })
        .map(|magic| magic.mime)
}

/// Install route for a sniffed MIME type.
#[must_use]
pub fn kind_from_mime(mime: &str) -> Option<AssetKind> {
    match mime {
        MIME_DEB => Some(AssetKind::Deb),
        MIME_EXECUTABLE => Some(AssetKind::Binary),
        MIME_GZIP | MIME_TAR | MIME_ZIP => Some(AssetKind::Archive),
        _ => None,
    }
}

const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz", ".tar", ".zip", ".gz"];

const EXECUTABLE_EXTENSIONS: &[&str] = &["run", "bin", "exe"];

const NON_BINARY_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "sig", "asc", "sha256", "sha512", "sha1", "md5", "pem", "crt", "pub",
    "sbom", "spdx", "intoto", "jsonl", "yml", "yaml", "toml", "xml", "html", "pdf", "log",
];

const NON_BINARY_STEMS: &[&str] = &[
    "checksums", "sha256sums", "sha512sums", "license", "readme", "changelog", "notice",
];

/// Extension of a file name, if its last dot segment looks like one.
///
/// `tool-1.2.3` has no extension (the segment `3` has no letter), and neither
/// has `tool-v1.2.3-linux` (the segment contains `-`).
fn extension(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    let looks_like_extension = (1..=8).contains(&ext.len())
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
        && ext.chars().any(|c| c.is_ascii_alphabetic());
    looks_like_extension.then_some(ext)
}

fn is_denied(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if let Some(ext) = extension(&lower)
        && NON_BINARY_EXTENSIONS.contains(&ext)
    {
        return true;
    }
    let stem = lower.split('.').next().unwrap_or_default();
    NON_BINARY_STEMS.contains(&stem)
}

/// Whether a file name could be a standalone executable.
///
/// True for names without an extension or with `.run`, `.bin` or `.exe`, unless
/// the name is on the deny-list of documentation and checksum files.
#[must_use]
pub fn is_binary_candidate(name: &str) -> bool {
    if is_denied(name) {
        return false;
    }
    match extension(name) {
        None => true,
        Some(ext) => EXECUTABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
    }
}

/// Classification from the file name alone.
#[must_use]
pub fn kind_from_name(name: &str) -> AssetKind {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".deb") {
        AssetKind::Deb
    } else if ARCHIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
        AssetKind::Archive
    } else if is_binary_candidate(name) {
        AssetKind::Binary
    } else {
        AssetKind::Other
    }
}

/// Whether the file name alone settles the classification.
///
/// The selector skips the network sniff for these names.
#[must_use]
pub fn name_is_conclusive(name: &str) -> bool {
    matches!(kind_from_name(name), AssetKind::Deb | AssetKind::Archive) || is_denied(name)
}

/// Classify an asset from its name and optional sniffed prefix.
///
/// A sniff that maps to an install route wins; anything else falls back to the
/// file name.
///
/// # Examples
///
/// ```rust
/// use get_cli::assets::{AssetKind, classify};
///
/// assert_eq!(classify("tool.deb", None), AssetKind::Deb);
/// assert_eq!(classify("tool", None), AssetKind::Binary);
/// assert_eq!(classify("tool.AppImage", None), AssetKind::Other);
/// assert_eq!(classify("tool.AppImage", Some(b"\x7fELF\x02\x01")), AssetKind::Binary);
/// ```
#[must_use]
pub fn classify(name: &str, sniffed: Option<&[u8]>) -> AssetKind {
    sniffed
        .and_then(sniff_mime)
        .and_then(kind_from_mime)
        .unwrap_or_else(|| kind_from_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tar_prefix() -> Vec<u8> {
        let mut bytes = vec![0u8; 262];
        bytes[257..262].copy_from_slice(b"ustar");
        bytes
    }

    #[test]
    fn test_sniff_mime_table() {
        assert_eq!(sniff_mime(b"!<arch>\ndebian-binary   "), Some(MIME_DEB));
        assert_eq!(sniff_mime(b"\x7fELF\x02\x01\x01"), Some(MIME_EXECUTABLE));
        assert_eq!(sniff_mime(&[0x1f, 0x8b, 0x08, 0x00]), Some(MIME_GZIP));
        assert_eq!(sniff_mime(b"PK\x03\x04\x14"), Some(MIME_ZIP));
        assert_eq!(sniff_mime(&tar_prefix()), Some(MIME_TAR));
        assert_eq!(sniff_mime(b"MZ\x90\x00"), Some("application/vnd.microsoft.portable-executable"));
        assert_eq!(sniff_mime(b"#!/bin/sh\n"), None);
        assert_eq!(sniff_mime(b""), None);
    }

    #[test]
    fn test_plain_ar_is_not_deb() {
        assert_eq!(sniff_mime(b"!<arch>\nlibfoo.o/      "), None);
    }

    #[test]
    fn test_classify_without_sniff() {
        assert_eq!(classify("tool.deb", None), AssetKind::Deb);
        assert_eq!(classify("tool.AppImage", None), AssetKind::Other);
        assert_eq!(classify("tool", None), AssetKind::Binary);
        assert_eq!(classify("tool-linux-amd64.tar.gz", None), AssetKind::Archive);
        assert_eq!(classify("tool.tgz", None), AssetKind::Archive);
        assert_eq!(classify("tool.zip", None), AssetKind::Archive);
        assert_eq!(classify("tool.gz", None), AssetKind::Archive);
        assert_eq!(classify("installer.run", None), AssetKind::Binary);
        assert_eq!(classify("tool.exe", None), AssetKind::Binary);
    }

    #[test]
    fn test_sniff_overrides_name() {
        let elf = b"\x7fELF\x02\x01\x01".as_slice();
        assert_eq!(classify("tool.AppImage", Some(elf)), AssetKind::Binary);
        assert_eq!(classify("download", Some(b"!<arch>\ndebian-binary")), AssetKind::Deb);
        assert_eq!(classify("tool.bin", Some(b"PK\x03\x04")), AssetKind::Archive);
    }

    #[test]
    fn test_unmapped_sniff_falls_back_to_name() {
        let rpm = [0xed, 0xab, 0xee, 0xdb, 0x03];
        assert_eq!(classify("tool.rpm", Some(&rpm)), AssetKind::Other);
        assert_eq!(classify("tool", Some(b"#!/bin/sh")), AssetKind::Binary);
    }

    #[test]
    fn test_versioned_names_are_binary_candidates() {
        assert!(is_binary_candidate("tool-1.2.3"));
        assert!(is_binary_candidate("tool-v1.2.3-linux-amd64"));
        assert!(is_binary_candidate("tool_linux_x86_64"));
    }

    #[test]
    fn test_deny_list() {
        assert!(!is_binary_candidate("checksums.txt"));
        assert!(!is_binary_candidate("tool.sha256"));
        assert!(!is_binary_candidate("tool.tar.gz.sig"));
        assert!(!is_binary_candidate("SHA256SUMS"));
        assert!(!is_binary_candidate("LICENSE"));
        assert!(!is_binary_candidate("README.md"));
        assert_eq!(classify("checksums.txt", None), AssetKind::Other);
    }

    #[test]
    fn test_name_is_conclusive() {
        assert!(name_is_conclusive("tool.deb"));
        assert!(name_is_conclusive("tool.tar.gz"));
        assert!(name_is_conclusive("checksums.txt"));
        assert!(!name_is_conclusive("tool"));
        assert!(!name_is_conclusive("tool.AppImage"));
    }
}
