//! Package - a registered package with its location and origin.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use semver::{Version, VersionReq};

use crate::core::manifest::{Linkage, Manifest};
use crate::core::PackageId;

/// Which registry source owns a package.
///
/// Variants are ordered by precedence: a member shadows a dependency,
/// which shadows a built-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageOrigin {
    Member,
    Dependency,
    Builtin,
}

impl std::fmt::Display for PackageOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageOrigin::Member => write!(f, "workspace"),
            PackageOrigin::Dependency => write!(f, "registry"),
            PackageOrigin::Builtin => write!(f, "built-in"),
        }
    }
}

/// A package as registered in a resolution session. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Package {
    manifest: Manifest,

    origin: PackageOrigin,

    /// Directory holding `lume.toml` (or the built-in's configured path)
    root: PathBuf,
}

impl Package {
    pub fn new(manifest: Manifest, root: PathBuf, origin: PackageOrigin) -> Self {
        Package {
            manifest,
            origin,
            root,
        }
    }

    pub fn package_id(&self) -> PackageId {
        self.manifest.package_id
    }

    pub fn version(&self) -> &Version {
        &self.manifest.version
    }

    pub fn origin(&self) -> PackageOrigin {
        self.origin
    }

    pub fn linkage(&self) -> Linkage {
        self.manifest.linkage
    }

    /// The declared parent package, if any.
    pub fn parent(&self) -> Option<PackageId> {
        self.manifest.parent
    }

    pub fn dependencies(&self) -> &BTreeMap<PackageId, VersionReq> {
        &self.manifest.dependencies
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The module source root (`root/src-dir`).
    pub fn src_root(&self) -> PathBuf {
        self.root.join(&self.manifest.src_dir)
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{}", self.package_id(), self.version())
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.package_id() == other.package_id()
    }
}

impl Eq for Package {}
