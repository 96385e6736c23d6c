//! Directory registry - unpacked packages on the local filesystem.
//!
//! # Layout
//!
//! ```text
//! registry/
//! ├── @acme/
//! │   └── json/
//! │       ├── 1.2.0/lume.toml
//! │       └── 1.3.1/lume.toml
//! └── strings/
//!     └── 2.0.0/lume.toml
//! ```
//!
//! Version directories whose name is not a valid semver version are skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use semver::Version;

use crate::core::manifest::{Manifest, PACKAGE_MANIFEST};
use crate::core::path::normalize_segment;
use crate::core::{PackageId, PackageOrigin, Summary};
use crate::sources::Source;

pub struct DirectoryRegistry {
    root: PathBuf,

    /// Query results by package id
    cache: Mutex<HashMap<PackageId, Vec<Summary>>>,
}

impl DirectoryRegistry {
    pub fn new(root: PathBuf) -> Self {
        DirectoryRegistry {
            root,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all versions of `id`, matched case-insensitively.
    fn package_dir(&self, id: PackageId) -> Result<Option<PathBuf>> {
        let mut dir = self.root.clone();
        let parts: Vec<String> = match id.scope() {
            Some(scope) => vec![format!("@{}", scope), id.name().to_string()],
            None => vec![id.name().to_string()],
        };

        for part in parts {
            match find_child(&dir, &part)? {
                Some(child) => dir = child,
                None => return Ok(None),
            }
        }
        Ok(Some(dir))
    }

    fn scan(&self, id: PackageId) -> Result<Vec<Summary>> {
        let Some(dir) = self.package_dir(id)? else {
            return Ok(Vec::new());
        };

        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("failed to read registry directory: {}", dir.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().to_string();
            let Ok(version) = dir_name.parse::<Version>() else {
                tracing::debug!("skipping non-version directory {}", entry.path().display());
                continue;
            };

            let manifest_path = entry.path().join(PACKAGE_MANIFEST);
            let manifest = Manifest::load(&manifest_path)?;
            if manifest.package_id != id {
                bail!(
                    "{} declares `{}` but is stored under `{}`",
                    manifest_path.display(),
                    manifest.package_id,
                    id
                );
            }
            if manifest.version != version {
                bail!(
                    "{} declares version {} but is stored under {}",
                    manifest_path.display(),
                    manifest.version,
                    version
                );
            }

            summaries.push(Summary::new(manifest, entry.path(), PackageOrigin::Dependency));
        }

        summaries.sort_by(|a, b| a.version().cmp(b.version()));
        Ok(summaries)
    }
}

/// Find the child of `dir` whose normalized name equals `part`.
fn find_child(dir: &Path, part: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let wanted = normalize_segment(part);
    let mut found: Option<PathBuf> = None;
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read registry directory: {}", dir.display()))?
    {
        let entry = entry?;
        if normalize_segment(&entry.file_name().to_string_lossy()) == wanted {
            if let Some(previous) = &found {
                bail!(
                    "registry entries {} and {} collide after normalization",
                    previous.display(),
                    entry.path().display()
                );
            }
            found = Some(entry.path());
        }
    }
    Ok(found)
}

impl Source for DirectoryRegistry {
    fn name(&self) -> &str {
        "directory"
    }

    fn query(&self, id: PackageId) -> Result<Vec<Summary>> {
        if let Some(cached) = self.cache.lock().get(&id) {
            return Ok(cached.clone());
        }

        let summaries = self.scan(id)?;
        tracing::debug!(
            "registry {} offers {} version(s) of {}",
            self.root.display(),
            summaries.len(),
            id
        );
        self.cache.lock().insert(id, summaries.clone());
        Ok(summaries)
    }
}
