//! Normalized index of a package's source tree.
//!
//! The source root is walked once. Every entry is keyed by its normalized
//! module path, so later lookups never touch the filesystem and behave the
//! same on case-sensitive and case-insensitive hosts.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::core::manifest::{ModuleManifest, MODULE_MANIFEST};
use crate::core::path::ModulePath;
use crate::core::PackageId;
use crate::resolver::errors::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Actual on-disk path
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// A module path that names more than one thing on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub path: ModulePath,
    pub candidates: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct SourceIndex {
    package: PackageId,
    root: PathBuf,
    entries: BTreeMap<ModulePath, IndexEntry>,

    /// Parsed `lume.module.toml` by the directory holding it
    module_manifests: BTreeMap<ModulePath, Result<Arc<ModuleManifest>, ResolveError>>,

    /// Keyed by the ambiguous path (extension-less for file/dir clashes)
    ambiguities: BTreeMap<ModulePath, Ambiguity>,

    /// Paths two on-disk entries normalize to
    collisions: BTreeSet<ModulePath>,
}

impl SourceIndex {
    /// Walk `root` and index everything under it.
    ///
    /// A missing source root yields an empty index.
    pub fn build(package: PackageId, root: &Path, extensions: &[String]) -> Result<Self, ResolveError> {
        let mut index = SourceIndex {
            package,
            root: root.to_path_buf(),
            entries: BTreeMap::new(),
            module_manifests: BTreeMap::new(),
            ambiguities: BTreeMap::new(),
            collisions: BTreeSet::new(),
        };

        if !root.is_dir() {
            tracing::debug!("{}: source root {} does not exist", package, root.display());
            return Ok(index);
        }

        for entry in WalkDir::new(root).min_depth(1).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                ResolveError::io(path, &e)
            })?;

            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            let Some(key) = ModulePath::from_relative(rel) else {
                continue;
            };
            let kind = if entry.file_type().is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };

            if let Some(existing) = index.entries.get(&key) {
                // `Foo.lume` and `foo.lume` on a case-sensitive host
                index.record_ambiguity(key.clone(), vec![existing.path.clone(), entry.path().to_path_buf()]);
                index.collisions.insert(key);
                continue;
            }

            if kind == EntryKind::File && is_module_manifest(&key) {
                let dir = key.parent();
                let parsed = ModuleManifest::load(entry.path())
                    .map(Arc::new)
                    .map_err(|e| ResolveError::manifest(Some(entry.path().to_path_buf()), &e));
                index.module_manifests.insert(dir, parsed);
            }

            index.entries.insert(
                key,
                IndexEntry {
                    path: entry.path().to_path_buf(),
                    kind,
                },
            );
        }

        // A file `x.<ext>` beside a directory `x`
        let clashes: Vec<(ModulePath, PathBuf, PathBuf)> = index
            .entries
            .iter()
            .filter(|(key, entry)| {
                entry.kind == EntryKind::File
                    && key.extension().is_some_and(|ext| extensions.iter().any(|e| e == ext))
            })
            .filter_map(|(key, file)| {
                let stem = key.without_extension();
                match index.entries.get(&stem) {
                    Some(dir) if dir.kind == EntryKind::Dir => {
                        Some((stem, file.path.clone(), dir.path.clone()))
                    }
                    _ => None,
                }
            })
            .collect();
        for (stem, file, dir) in clashes {
            index.record_ambiguity(stem, vec![file, dir]);
        }

        tracing::debug!(
            "{}: indexed {} entries under {} ({} ambiguous)",
            package,
            index.entries.len(),
            root.display(),
            index.ambiguities.len()
        );

        Ok(index)
    }

    fn record_ambiguity(&mut self, path: ModulePath, candidates: Vec<PathBuf>) {
        let slot = self.ambiguities.entry(path.clone()).or_insert_with(|| Ambiguity {
            path,
            candidates: Vec::new(),
        });
        for candidate in candidates {
            if !slot.candidates.contains(&candidate) {
                slot.candidates.push(candidate);
            }
        }
        slot.candidates.sort();
    }

    pub fn package(&self) -> PackageId {
        self.package
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, path: &ModulePath) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// The on-disk file for `path`, if it is a file.
    pub fn file(&self, path: &ModulePath) -> Option<&Path> {
        self.entries
            .get(path)
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.path.as_path())
    }

    /// The module manifest stored directly in directory `dir`.
    pub fn module_manifest(&self, dir: &ModulePath) -> Option<Result<Arc<ModuleManifest>, ResolveError>> {
        self.module_manifests.get(dir).cloned()
    }

    pub fn ambiguity(&self, path: &ModulePath) -> Option<&Ambiguity> {
        self.ambiguities.get(path)
    }

    /// The ambiguity that makes `path` unusable: one recorded for `path`
    /// itself, or a collision on one of its directories.
    ///
    /// Children of colliding directories are merged under one key, so any
    /// path below such a directory is ambiguous too.
    pub fn ambiguity_along(&self, path: &ModulePath) -> Option<&Ambiguity> {
        if let Some(ambiguity) = self.ambiguities.get(path) {
            return Some(ambiguity);
        }
        path.ancestors()
            .skip(1)
            .find(|dir| self.collisions.contains(dir))
            .and_then(|dir| self.ambiguities.get(&dir))
    }

    /// Every ambiguity in the package, in path order.
    pub fn ambiguities(&self) -> impl Iterator<Item = &Ambiguity> {
        self.ambiguities.values()
    }

    /// The error reported for an ambiguous path.
    pub fn ambiguity_error(&self, ambiguity: &Ambiguity) -> ResolveError {
        ResolveError::AmbiguousModulePath {
            package: self.package.to_string(),
            path: ambiguity.path.to_string(),
            candidates: ambiguity.candidates.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_module_manifest(key: &ModulePath) -> bool {
    key.segments().last().is_some_and(|s| s == MODULE_MANIFEST)
}
