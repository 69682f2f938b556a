//! Loading and rewriting the metadata file.
//!
//! Every operation re-reads the file and rewrites it whole. There is no file
//! locking: a single running instance per metadata path is assumed, and
//! concurrent instances can lose each other's updates.

use super::record::MetadataDocument;
use crate::core::GetError;
use crate::utils::fs::atomic_write;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owner of the on-disk metadata document.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. A missing file is an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::MetadataCorrupt`] if the file is not valid metadata
    /// JSON, or an I/O error if it exists but cannot be read.
    pub fn load(&self) -> Result<MetadataDocument> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                debug!("No metadata at {}, starting empty", self.path.display());
                return Ok(MetadataDocument::default());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read metadata from {}", self.path.display())
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(MetadataDocument::default());
        }

        let mut document: MetadataDocument =
            serde_json::from_str(&content).map_err(|e| GetError::MetadataCorrupt {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let pruned = document.prune_orphaned_pending();
        if pruned > 0 {
            warn!("Ignoring {} pending update(s) for packages that are not installed", pruned);
        }

        Ok(document)
    }

    /// Write the document as pretty-printed JSON, creating the directory first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, document: &MetadataDocument) -> Result<()> {
        let mut json =
            serde_json::to_string_pretty(document).context("Failed to serialize metadata")?;
        json.push('\n');
        atomic_write(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to write metadata to {}", self.path.display()))
    }

    /// Load, apply `change`, and save.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails; nothing is written when
    /// loading fails.
    pub fn update<T>(&self, change: impl FnOnce(&mut MetadataDocument) -> T) -> Result<T> {
        let mut document = self.load()?;
        let result = change(&mut document);
        self.save(&document)?;
        Ok(result)
    }
}
