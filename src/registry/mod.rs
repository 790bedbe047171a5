//! Async HTTP clients for the two license sources.
//!
//! - [`pypi`] — per-release metadata from the PyPI JSON API, behind [`LicenseLookup`].
//! - [`anaconda`] — the bulk name → license catalog scraped from Anaconda's
//!   legacy package lists.
//!
//! A missing package is `Ok(None)`; network failures and unexpected HTTP
//! statuses are `Err` and abort the run.

pub mod anaconda;
pub mod pypi;

use anyhow::Result;

use crate::models::ReleaseMetadata;

/// Resolves `package==version` to registry metadata.
pub trait LicenseLookup {
    async fn release_data(&self, package: &str, version: &str) -> Result<Option<ReleaseMetadata>>;
}
