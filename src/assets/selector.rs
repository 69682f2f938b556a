//! Asset selection.
//!
//! Picks the asset of a release to install, either automatically by matching the
//! previously chosen asset name, or interactively through the [`Frontend`].
//!
//! Buckets are shown in a fixed order: Debian packages, then executables and
//! archives, then (on request) everything else.

use super::classify::{AssetKind, classify, name_is_conclusive};
use crate::core::GetError;
use crate::frontend::{AssetPrompt, Frontend, Selection};
use crate::github::{Asset, Release, ReleaseSource};
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"v[0-9]+\.[0-9]+\.[0-9]+").ok());

/// An asset together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedAsset {
    pub asset: Asset,
    pub kind: AssetKind,
}

/// The asset to install and the route to install it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedAsset {
    pub asset: Asset,
    /// `Deb`, `Binary` or `Archive`; never `Other`.
    pub route: AssetKind,
    /// Whether the asset was matched against the previous choice.
    pub automatic: bool,
}

/// Result of asset selection. Cancelling is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetChoice {
    Selected(SelectedAsset),
    Cancelled,
}

/// Release assets split into the prompt buckets.
#[derive(Debug, Clone, Default)]
pub struct AssetBuckets {
    pub debs: Vec<ClassifiedAsset>,
    /// Executables and archives.
    pub binaries: Vec<ClassifiedAsset>,
    pub others: Vec<ClassifiedAsset>,
}

impl AssetBuckets {
    #[must_use]
    pub fn new(assets: &[ClassifiedAsset]) -> Self {
        let mut buckets = Self::default();
        for classified in assets {
            let bucket = match classified.kind {
                AssetKind::Deb => &mut buckets.debs,
                AssetKind::Binary | AssetKind::Archive => &mut buckets.binaries,
                AssetKind::Other => &mut buckets.others,
            };
            bucket.push(classified.clone());
        }
        buckets
    }

    /// Whether any asset is offered without asking for all assets.
    #[must_use]
    pub fn has_installable(&self) -> bool {
        !self.debs.is_empty() || !self.binaries.is_empty()
    }

    /// Resolve a 0-based prompt index to an asset and route.
    ///
    /// Entries from the "other" bucket are installed as binaries.
    fn resolve(&self, index: usize, include_others: bool) -> Option<SelectedAsset> {
        let from_bucket = |classified: &ClassifiedAsset, route: AssetKind| SelectedAsset {
            asset: classified.asset.clone(),
            route,
            automatic: false,
        };

        let mut index = index;
        if let Some(deb) = self.debs.get(index) {
            return Some(from_bucket(deb, AssetKind::Deb));
        }
        index -= self.debs.len();
        if let Some(binary) = self.binaries.get(index) {
            return Some(from_bucket(binary, binary.kind));
        }
        index -= self.binaries.len();
        if include_others {
            return self.others.get(index).map(|other| from_bucket(other, AssetKind::Binary));
        }
        None
    }
}

/// Classify every asset of a release.
///
/// Assets whose name settles the question (`.deb`, archives, checksums and
/// documentation) are not sniffed; the rest are sniffed one at a time.
pub async fn classify_release(source: &dyn ReleaseSource, release: &Release) -> Vec<ClassifiedAsset> {
    let mut classified = Vec::with_capacity(release.assets.len());
    for asset in &release.assets {
        let sniffed = if name_is_conclusive(&asset.name) {
            None
        } else {
            source.sniff(asset).await
        };
        let kind = classify(&asset.name, sniffed.as_deref());
        debug!("Classified {} as {}", asset.name, kind);
        classified.push(ClassifiedAsset {
            asset: asset.clone(),
            kind,
        });
    }
    classified
}

/// Remove `vMAJOR.MINOR.PATCH` substrings from an asset name.
#[must_use]
pub fn strip_version(name: &str) -> String {
    match VERSION_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(name, "").into_owned(),
        None => name.to_string(),
    }
}

/// Whether two asset names are the same asset of different releases.
///
/// ```rust
/// use get_cli::assets::names_match;
///
/// assert!(names_match("tool-v1.2.0-linux-amd64", "tool-v1.3.0-linux-amd64"));
/// assert!(!names_match("tool-v1.2.0-linux-amd64", "tool-v1.3.0-linux-arm64"));
/// ```
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    strip_version(a) == strip_version(b)
}

/// The first asset matching a previously chosen asset name.
#[must_use]
pub fn find_previous_choice<'a>(
    assets: &'a [ClassifiedAsset],
    previous: &str,
) -> Option<&'a ClassifiedAsset> {
    assets.iter().find(|classified| names_match(&classified.asset.name, previous))
}

/// Select the asset to install from a classified release.
///
/// With `previous` set, the automatic path is tried first. A match is confirmed
/// with the user unless `assume_yes`; declining, or finding no match, falls
/// through to the interactive prompt.
///
/// # Errors
///
/// Returns [`GetError::NoAssetFound`] if the release has no assets at all, and
/// any error the frontend reports while prompting.
pub async fn select_asset(
    frontend: &dyn Frontend,
    package: &str,
    release: &Release,
    assets: &[ClassifiedAsset],
    previous: Option<&str>,
    assume_yes: bool,
) -> Result<AssetChoice> {
    if let Some(previous) = previous
        && let Some(matched) = find_previous_choice(assets, previous)
    {
        let accepted = assume_yes
            || frontend
                .confirm(&format!("Select {} as install asset?", matched.asset.name), true)
                .await?;
        if accepted {
            debug!("Matched previous choice {} to {}", previous, matched.asset.name);
            return Ok(AssetChoice::Selected(SelectedAsset {
                asset: matched.asset.clone(),
                route: route_for(matched.kind),
                automatic: true,
            }));
        }
    }

    select_interactively(frontend, package, release, assets).await
}

fn route_for(kind: AssetKind) -> AssetKind {
    match kind {
        AssetKind::Other => AssetKind::Binary,
        kind => kind,
    }
}

async fn select_interactively(
    frontend: &dyn Frontend,
    package: &str,
    release: &Release,
    assets: &[ClassifiedAsset],
) -> Result<AssetChoice> {
    if assets.is_empty() {
        return Err(GetError::NoAssetFound {
            package: package.to_string(),
            tag: release.tag_name.clone(),
        }
        .into());
    }

    let buckets = AssetBuckets::new(assets);
    let names = |bucket: &[ClassifiedAsset]| -> Vec<String> {
        bucket.iter().map(|c| c.asset.name.clone()).collect()
    };
    let debs = names(&buckets.debs);
    let binaries = names(&buckets.binaries);
    let others = names(&buckets.others);

    // Nothing recognisable: go straight to the full list
    let mut show_all = !buckets.has_installable();
    loop {
        let prompt = AssetPrompt {
            package,
            debs: &debs,
            binaries: &binaries,
            others: show_all.then_some(others.as_slice()),
        };

        match frontend.select_asset(prompt).await? {
            Selection::Cancelled => return Ok(AssetChoice::Cancelled),
            Selection::ShowAll => show_all = true,
            Selection::Chosen(index) => {
                return buckets
                    .resolve(index, show_all)
                    .map(AssetChoice::Selected)
                    .ok_or_else(|| anyhow::anyhow!("Asset selection {} is out of range", index + 1));
            }
        }
    }
}
