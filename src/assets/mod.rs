//! Release asset classification and selection.
//!
//! - [`classify`] - Maps an asset to deb, binary, archive or other
//! - [`selector`] - Buckets a release's assets and picks the one to install

pub mod classify;
pub mod selector;

pub use classify::{AssetKind, classify, is_binary_candidate};
pub use selector::{
    AssetBuckets, AssetChoice, ClassifiedAsset, SelectedAsset, classify_release, names_match,
    select_asset,
};
