//! Version selection with PubGrub.
//!
//! The solve is rooted at a virtual workspace package that depends on every
//! member at exactly its own version. Members and built-ins offer a single
//! version each; registry packages offer everything they have published,
//! newest first.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use pubgrub::{
    DefaultStringReporter, Dependencies, DependencyProvider, PackageResolutionStatistics, Range,
    Reporter,
};
use semver::{Comparator, Op, Version, VersionReq};

use crate::core::{PackageId, Summary};
use crate::resolver::errors::ResolveError;

/// A package as PubGrub sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SolverPackage {
    /// The virtual workspace root
    Root,
    Package(PackageId),
}

impl fmt::Display for SolverPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverPackage::Root => write!(f, "workspace"),
            SolverPackage::Package(id) => write!(f, "{}", id),
        }
    }
}

/// Provider failure. Candidate lists are computed up front, so this only
/// carries internal inconsistencies.
#[derive(Debug)]
pub struct SolverError(String);

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for SolverError {}

/// Dependency provider over precomputed candidate lists.
pub struct VersionSolver {
    /// Candidate versions per package, newest first
    candidates: HashMap<PackageId, Vec<Summary>>,

    /// Workspace members, pinned by the root
    members: Vec<Summary>,
}

impl VersionSolver {
    pub fn new(members: Vec<Summary>) -> Self {
        VersionSolver {
            candidates: HashMap::new(),
            members,
        }
    }

    /// Register the candidate versions for a package.
    pub fn add_candidates(&mut self, id: PackageId, mut summaries: Vec<Summary>) {
        summaries.sort_by(|a, b| b.version().cmp(a.version()));
        self.candidates.insert(id, summaries);
    }

    /// Solve, returning the selected summary for every reachable package.
    pub fn solve(self) -> Result<Vec<Summary>, ResolveError> {
        let root_version = Version::new(0, 0, 0);

        match pubgrub::resolve(&self, SolverPackage::Root, root_version) {
            Ok(solution) => {
                let mut selected = Vec::new();
                for (pkg, version) in solution {
                    let SolverPackage::Package(id) = pkg else {
                        continue;
                    };
                    if let Some(summary) = self
                        .candidates
                        .get(&id)
                        .and_then(|list| list.iter().find(|s| s.version() == &version))
                    {
                        selected.push(summary.clone());
                    }
                }
                selected.sort_by_key(|s| s.package_id());
                Ok(selected)
            }
            Err(pubgrub::PubGrubError::NoSolution(tree)) => {
                let report = DefaultStringReporter::report(&tree);
                Err(ResolveError::VersionConflict {
                    package: self.conflicting_package(&report),
                    report,
                })
            }
            Err(e) => Err(ResolveError::VersionConflict {
                package: "workspace".to_string(),
                report: format!("{:?}", e),
            }),
        }
    }

    fn constraints(summary: &Summary) -> Vec<(SolverPackage, Range<Version>)> {
        summary
            .dependencies()
            .iter()
            .map(|(id, req)| (SolverPackage::Package(*id), version_req_to_range(req)))
            .collect()
    }

    /// The candidate package mentioned earliest in a PubGrub report.
    fn conflicting_package(&self, report: &str) -> String {
        self.candidates
            .keys()
            .filter_map(|id| {
                report
                    .match_indices(id.as_str())
                    .find(|(at, _)| {
                        // whole identifiers only: `json` must not match `json-schema`
                        let end = at + id.as_str().len();
                        !report[end..].starts_with(|c: char| c.is_alphanumeric() || c == '-' || c == '_')
                    })
                    .map(|(at, _)| (at, *id))
            })
            .min_by_key(|(at, id)| (*at, *id))
            .map(|(_, id)| id.to_string())
            .unwrap_or_else(|| "workspace".to_string())
    }
}

impl DependencyProvider for VersionSolver {
    type P = SolverPackage;
    type V = Version;
    type VS = Range<Version>;
    type M = String;
    type Err = SolverError;
    type Priority = u32;

    fn prioritize(
        &self,
        package: &Self::P,
        _range: &Self::VS,
        _package_conflicts_counts: &PackageResolutionStatistics,
    ) -> Self::Priority {
        // Fewer candidates first
        match package {
            SolverPackage::Root => u32::MAX,
            SolverPackage::Package(id) => match self.candidates.get(id) {
                Some(list) => (1000 - list.len().min(1000)) as u32,
                None => 1000,
            },
        }
    }

    fn choose_version(
        &self,
        package: &Self::P,
        range: &Self::VS,
    ) -> Result<Option<Self::V>, Self::Err> {
        match package {
            SolverPackage::Root => {
                let root = Version::new(0, 0, 0);
                Ok(range.contains(&root).then_some(root))
            }
            SolverPackage::Package(id) => Ok(self.candidates.get(id).and_then(|list| {
                list.iter()
                    .find(|s| range.contains(s.version()))
                    .map(|s| s.version().clone())
            })),
        }
    }

    fn get_dependencies(
        &self,
        package: &Self::P,
        version: &Self::V,
    ) -> Result<Dependencies<Self::P, Self::VS, Self::M>, Self::Err> {
        match package {
            SolverPackage::Root => {
                let deps = self
                    .members
                    .iter()
                    .map(|m| {
                        (
                            SolverPackage::Package(m.package_id()),
                            Range::singleton(m.version().clone()),
                        )
                    })
                    .collect();
                Ok(Dependencies::Available(deps))
            }
            SolverPackage::Package(id) => {
                let summary = self
                    .candidates
                    .get(id)
                    .and_then(|list| list.iter().find(|s| s.version() == version))
                    .ok_or_else(|| SolverError(format!("no candidate {} v{}", id, version)))?;
                Ok(Dependencies::Available(
                    Self::constraints(summary).into_iter().collect(),
                ))
            }
        }
    }
}

/// Convert a semver VersionReq to a PubGrub Range.
pub fn version_req_to_range(req: &VersionReq) -> Range<Version> {
    req.comparators
        .iter()
        .fold(Range::full(), |range, comp| range.intersection(&comparator_to_range(comp)))
}

/// Convert a single semver Comparator to a PubGrub Range.
fn comparator_to_range(comp: &Comparator) -> Range<Version> {
    let major = comp.major;
    let minor = comp.minor.unwrap_or(0);
    let patch = comp.patch.unwrap_or(0);

    let version = Version::new(major, minor, patch);

    // Upper bound when only a prefix is given: `1` -> 2.0.0, `1.2` -> 1.3.0
    let prefix_upper = || match (comp.minor, comp.patch) {
        (None, _) => Version::new(major + 1, 0, 0),
        (Some(_), None) => Version::new(major, minor + 1, 0),
        (Some(_), Some(_)) => Version::new(major, minor, patch + 1),
    };

    match comp.op {
        Op::Exact | Op::Wildcard => {
            if comp.patch.is_some() {
                Range::singleton(version)
            } else {
                Range::between(version, prefix_upper())
            }
        }

        Op::Greater => {
            if comp.patch.is_some() {
                Range::strictly_higher_than(version)
            } else {
                // >1.2 means >=1.3.0
                Range::higher_than(prefix_upper())
            }
        }

        Op::GreaterEq => Range::higher_than(version),

        Op::Less => Range::strictly_lower_than(version),

        // <=1.2 means <1.3.0
        Op::LessEq => Range::strictly_lower_than(prefix_upper()),

        Op::Tilde => {
            // ~1.2.3 means >=1.2.3 <1.3.0, ~1 means >=1.0.0 <2.0.0
            let upper = if comp.minor.is_some() {
                Version::new(major, minor + 1, 0)
            } else {
                Version::new(major + 1, 0, 0)
            };
            Range::between(version, upper)
        }

        Op::Caret => {
            // Changes allowed below the left-most non-zero component
            let upper = match (comp.minor, comp.patch) {
                _ if major > 0 => Version::new(major + 1, 0, 0),
                (None, _) => Version::new(1, 0, 0),
                (Some(_), _) if minor > 0 => Version::new(0, minor + 1, 0),
                (Some(_), None) => Version::new(0, 1, 0),
                (Some(_), Some(_)) => Version::new(0, 0, patch + 1),
            };
            Range::between(version, upper)
        }

        _ => Range::full(),
    }
}
