//! Source trait - where external dependencies come from.

use anyhow::Result;

use crate::core::{PackageId, Summary};

/// A provider of dependency packages.
///
/// Fetching is someone else's job: a source only reports packages that are
/// already materialized on the local machine.
pub trait Source: Send + Sync {
    /// Source name for display.
    fn name(&self) -> &str;

    /// Every available version of `id`. Unknown identifiers yield an empty list.
    fn query(&self, id: PackageId) -> Result<Vec<Summary>>;
}
