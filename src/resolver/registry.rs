//! Package registry - every package a session can import from.
//!
//! Built once per session from three sources, in precedence order:
//! workspace members, registry dependencies, built-ins. Construction is
//! all-or-nothing: duplicate identifiers, unknown dependencies and version
//! conflicts abort it.
//!
//! Source indexes are built lazily through a [`MemoCache`], at most once per
//! package even when many imports ask for the same package at the same time.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use semver::Version;

use crate::core::manifest::Manifest;
use crate::core::{Package, PackageId, PackageOrigin, Summary, Workspace};
use crate::resolver::cache::MemoCache;
use crate::resolver::errors::ResolveError;
use crate::resolver::index::SourceIndex;
use crate::resolver::version::VersionSolver;
use crate::sources::Source;
use crate::util::config::ResolverConfig;

/// A registered package and its source index.
#[derive(Debug)]
pub struct PackageRecord {
    pub package: Package,
    pub index: SourceIndex,
}

pub struct PackageRegistry {
    packages: BTreeMap<PackageId, Package>,
    records: MemoCache<PackageId, PackageRecord>,
    extensions: Vec<String>,

    /// Source indexes actually built
    constructions: AtomicUsize,
}

impl PackageRegistry {
    /// Build the registry for `workspace`.
    pub fn build(
        workspace: &Workspace,
        config: &ResolverConfig,
        source: Option<&dyn Source>,
    ) -> Result<Self, ResolveError> {
        let members = load_members(workspace)?;
        let builtins = load_builtins(config)?;

        let member_ids: BTreeMap<PackageId, Summary> =
            members.iter().map(|s| (s.package_id(), s.clone())).collect();

        // Every dependency reachable from the members, with its candidates
        let mut candidates: BTreeMap<PackageId, Vec<Summary>> = BTreeMap::new();
        for member in &members {
            candidates.insert(member.package_id(), vec![member.clone()]);
        }

        let mut queue: VecDeque<Summary> = members.iter().cloned().collect();
        while let Some(summary) = queue.pop_front() {
            for (dep, req) in summary.dependencies() {
                if let Some(member) = member_ids.get(dep) {
                    if !req.matches(member.version()) {
                        return Err(ResolveError::VersionConflict {
                            package: dep.to_string(),
                            report: format!(
                                "{} v{} requires {} {}, but the workspace member is v{}",
                                summary.package_id(),
                                summary.version(),
                                dep,
                                req,
                                member.version()
                            ),
                        });
                    }
                    continue;
                }
                if candidates.contains_key(dep) {
                    continue;
                }

                let found = dependency_candidates(*dep, source, &builtins)?;
                if found.is_empty() {
                    return Err(ResolveError::UnresolvedPackage {
                        package: dep.to_string(),
                        requested_by: Some(format!("{} v{}", summary.package_id(), summary.version())),
                    });
                }
                queue.extend(found.iter().cloned());
                candidates.insert(*dep, found);
            }
        }

        let mut solver = VersionSolver::new(members.clone());
        for (id, list) in candidates {
            solver.add_candidates(id, list);
        }
        let selected = solver.solve()?;

        let mut packages: BTreeMap<PackageId, Package> = BTreeMap::new();
        for summary in selected {
            packages.insert(summary.package_id(), summary.to_package());
        }
        for (id, builtin) in &builtins {
            match packages.get(id) {
                Some(existing) => tracing::debug!(
                    "built-in {} is shadowed by {} package {}",
                    id,
                    existing.origin(),
                    existing
                ),
                None => {
                    packages.insert(*id, builtin.to_package());
                }
            }
        }

        let registry = PackageRegistry {
            packages,
            records: MemoCache::new(),
            extensions: config.source_extensions(),
            constructions: AtomicUsize::new(0),
        };

        tracing::info!(
            "registered {} package(s) ({} member(s))",
            registry.packages.len(),
            members.len()
        );
        Ok(registry)
    }

    /// Look up a package and its index, building the index on first use.
    pub fn lookup(&self, id: PackageId) -> Result<Arc<PackageRecord>, ResolveError> {
        let package = self.packages.get(&id).ok_or_else(|| ResolveError::UnresolvedPackage {
            package: id.to_string(),
            requested_by: None,
        })?;

        self.records.get_or_try_init(&id, || {
            self.constructions.fetch_add(1, Ordering::SeqCst);
            let index = SourceIndex::build(id, &package.src_root(), &self.extensions)?;
            Ok(PackageRecord {
                package: package.clone(),
                index,
            })
        })
    }

    /// Index every package in parallel; returns the records in id order.
    pub fn index_all(&self) -> Vec<Result<Arc<PackageRecord>, ResolveError>> {
        let ids: Vec<PackageId> = self.packages.keys().copied().collect();
        ids.par_iter().map(|&id| self.lookup(id)).collect()
    }

    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(&id)
    }

    pub fn contains(&self, id: PackageId) -> bool {
        self.packages.contains_key(&id)
    }

    /// All registered packages, in identifier order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// The declared parent of a registered package.
    pub fn parent_of(&self, id: PackageId) -> Option<PackageId> {
        self.packages.get(&id).and_then(Package::parent)
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Number of source indexes built so far.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Parse member manifests in parallel and reject duplicate identifiers.
fn load_members(workspace: &Workspace) -> Result<Vec<Summary>, ResolveError> {
    let mut members = Vec::new();
    let mut seen: BTreeMap<PackageId, PathBuf> = BTreeMap::new();

    for (dir, manifest) in workspace.load_members() {
        let manifest = manifest.map_err(|e| ResolveError::manifest(Some(dir.clone()), &e))?;
        let id = manifest.package_id;
        if let Some(first) = seen.get(&id) {
            return Err(ResolveError::DuplicatePackageId {
                package: id.to_string(),
                locations: vec![first.clone(), dir],
            });
        }
        seen.insert(id, dir.clone());
        members.push(Summary::new(manifest, dir, PackageOrigin::Member));
    }

    Ok(members)
}

/// Built-ins from configuration. Two entries naming the same package are an error.
fn load_builtins(config: &ResolverConfig) -> Result<BTreeMap<PackageId, Summary>, ResolveError> {
    let mut builtins: BTreeMap<PackageId, Summary> = BTreeMap::new();

    for (raw, builtin) in &config.builtins {
        let id = PackageId::parse(raw).map_err(|e| ResolveError::Manifest {
            path: None,
            message: format!("built-in: {}", e),
        })?;
        let version: Version = builtin.version.parse().map_err(|e| ResolveError::Manifest {
            path: None,
            message: format!("built-in {}: invalid version `{}`: {}", id, builtin.version, e),
        })?;

        if let Some(existing) = builtins.get(&id) {
            return Err(ResolveError::DuplicatePackageId {
                package: id.to_string(),
                locations: vec![existing.root().to_path_buf(), builtin.path.clone()],
            });
        }

        builtins.insert(
            id,
            Summary::new(Manifest::builtin(id, version), builtin.path.clone(), PackageOrigin::Builtin),
        );
    }

    Ok(builtins)
}

/// Candidates for a non-member dependency: registry versions, else the built-in.
fn dependency_candidates(
    id: PackageId,
    source: Option<&dyn Source>,
    builtins: &BTreeMap<PackageId, Summary>,
) -> Result<Vec<Summary>, ResolveError> {
    if let Some(source) = source {
        let found = source.query(id).map_err(|e| ResolveError::manifest(None, &e))?;
        if !found.is_empty() {
            tracing::debug!("{}: {} candidate(s) from {}", id, found.len(), source.name());
            return Ok(found);
        }
    }
    Ok(builtins.get(&id).cloned().into_iter().collect())
}
