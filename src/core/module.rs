//! Module addressing.
//!
//! A module has no identity of its own: it is addressed by the package that
//! owns it plus its normalized path under that package's source root.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::path::ModulePath;
use crate::core::PackageId;

/// `package-id + module path`, e.g. `@acme/json` + `parse/mod.lume`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleKey {
    pub package: PackageId,
    pub path: ModulePath,
}

impl ModuleKey {
    pub fn new(package: PackageId, path: ModulePath) -> Self {
        ModuleKey { package, path }
    }

    /// The directory relative imports are resolved against.
    pub fn dir(&self) -> ModulePath {
        self.path.parent()
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "{}", self.package)
        } else {
            write!(f, "{}/{}", self.package, self.path)
        }
    }
}

/// A located module: its key and the concrete file backing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    pub key: ModuleKey,
    pub file: PathBuf,
}
