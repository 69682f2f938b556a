//! Builders for release assets and the bytes behind them.

use crate::github::{Asset, Release};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{Cursor, Write};

/// Publish date given to every fake release.
pub const FAKE_PUBLISHED_AT: &str = "2024-01-15T12:00:00Z";

/// An asset with a download URL under `example.invalid`.
pub fn asset(name: &str) -> Asset {
    Asset {
        name: name.to_string(),
        browser_download_url: format!("https://example.invalid/download/{name}"),
        size: 0,
        content_type: None,
    }
}

/// A release with the given tag and assets.
pub fn release(tag: &str, assets: Vec<Asset>) -> Release {
    Release {
        tag_name: tag.to_string(),
        name: Some(tag.to_string()),
        published_at: Some(FAKE_PUBLISHED_AT.to_string()),
        assets,
    }
}

/// Bytes that sniff as a Debian package and carry a `Package:` field.
///
/// Not a real `ar` archive; the scripted frontend reads the field back out.
pub fn deb_bytes(package: &str) -> Vec<u8> {
    let mut bytes = b"!<arch>\ndebian-binary   1700000000  0     0     100644  4         `\n2.0\n"
        .to_vec();
    bytes.extend_from_slice(format!("Package: {package}\nVersion: 1.0\n").as_bytes());
    bytes
}

/// Bytes that sniff as an ELF executable, with `marker` appended.
pub fn elf_bytes(marker: &str) -> Vec<u8> {
    let mut bytes = b"\x7fELF\x02\x01\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00".to_vec();
    bytes.extend_from_slice(marker.as_bytes());
    bytes
}

/// A gzip-compressed tarball holding `files`.
pub fn tar_gz_bytes(files: Vec<(&str, Vec<u8>)>) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_slice()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A zip archive holding `files`.
pub fn zip_bytes(files: Vec<(&str, Vec<u8>)>) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
    for (name, data) in files {
        writer.start_file(name, options).unwrap();
        writer.write_all(&data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
