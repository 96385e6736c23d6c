//! Summary - one candidate package version offered to version selection.
//!
//! Summaries are Arc-wrapped internally for cheap cloning; the chosen one
//! becomes a [`Package`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::{Version, VersionReq};

use crate::core::manifest::Manifest;
use crate::core::package::{Package, PackageOrigin};
use crate::core::PackageId;

#[derive(Debug, Clone)]
pub struct Summary {
    inner: Arc<SummaryInner>,
}

#[derive(Debug)]
struct SummaryInner {
    manifest: Manifest,
    root: PathBuf,
    origin: PackageOrigin,
}

impl Summary {
    pub fn new(manifest: Manifest, root: PathBuf, origin: PackageOrigin) -> Self {
        Summary {
            inner: Arc::new(SummaryInner {
                manifest,
                root,
                origin,
            }),
        }
    }

    pub fn package_id(&self) -> PackageId {
        self.inner.manifest.package_id
    }

    pub fn version(&self) -> &Version {
        &self.inner.manifest.version
    }

    pub fn dependencies(&self) -> &BTreeMap<PackageId, VersionReq> {
        &self.inner.manifest.dependencies
    }

    pub fn origin(&self) -> PackageOrigin {
        self.inner.origin
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Materialize the registered package.
    pub fn to_package(&self) -> Package {
        Package::new(
            self.inner.manifest.clone(),
            self.inner.root.clone(),
            self.inner.origin,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_to_package() {
        let manifest = Manifest::builtin(PackageId::parse("@std").unwrap(), Version::new(0, 3, 0));
        let summary = Summary::new(manifest, PathBuf::from("/opt/lume/std"), PackageOrigin::Builtin);
        let pkg = summary.to_package();

        assert_eq!(pkg.package_id().as_str(), "@std");
        assert_eq!(pkg.origin(), PackageOrigin::Builtin);
        assert_eq!(pkg.src_root(), PathBuf::from("/opt/lume/std/."));
    }
}
