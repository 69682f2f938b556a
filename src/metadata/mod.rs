//! Installed-package metadata.
//!
//! The metadata file is the only persistent state of get. It records every
//! installed package and every pending update:
//!
//! ```json
//! {
//!   "packages": {
//!     "cli/cli": {
//!       "version": "2.40.0",
//!       "installed_at": "2023-12-07T17:47:19Z",
//!       "install_type": "deb",
//!       "apt_name": "gh",
//!       "original_name": "gh_2.40.0_linux_amd64.deb",
//!       "chosen_asset": "gh_2.40.0_linux_amd64.deb"
//!     }
//!   },
//!   "pending_updates": {
//!     "cli/cli": "v2.41.0"
//!   }
//! }
//! ```
//!
//! A package has a record if and only if it is installed. Pending updates only
//! exist for packages with a record.
//!
//! - [`record`] - The document and record types
//! - [`store`] - Loading and atomically rewriting the file

pub mod record;
pub mod store;

pub use record::{InstallType, InstalledArtifact, MetadataDocument, PackageRecord};
pub use store::MetadataStore;
