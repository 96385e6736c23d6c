//! Resolution error types and diagnostics.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Which dependency graph a cycle was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphKind {
    Module,
    Package,
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphKind::Module => write!(f, "module"),
            GraphKind::Package => write!(f, "package"),
        }
    }
}

/// Error during module and dependency resolution.
///
/// Errors are `Clone` so that a memoized failure can be handed to every
/// caller waiting on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error("package `{package}` not found in any source")]
    #[diagnostic(code(lume::resolve::unresolved_package))]
    UnresolvedPackage {
        package: String,
        /// Who asked for it (a package or a module), if known
        requested_by: Option<String>,
    },

    #[error("package identifier `{package}` is claimed more than once")]
    #[diagnostic(code(lume::resolve::duplicate_package_id))]
    DuplicatePackageId {
        package: String,
        locations: Vec<PathBuf>,
    },

    #[error("no version of `{package}` satisfies every constraint")]
    #[diagnostic(code(lume::resolve::version_conflict))]
    VersionConflict { package: String, report: String },

    #[error("module `{path}` not found in `{package}`")]
    #[diagnostic(code(lume::resolve::module_not_found))]
    ModuleNotFound {
        package: String,
        path: String,
        /// Candidate locations probed, in order
        tried: Vec<String>,
    },

    #[error("module path `{path}` in `{package}` is ambiguous")]
    #[diagnostic(code(lume::resolve::ambiguous_module_path))]
    AmbiguousModulePath {
        package: String,
        path: String,
        candidates: Vec<PathBuf>,
    },

    #[error("`{symbol}` exported by `{module}` is not visible to `{requester}`")]
    #[diagnostic(code(lume::resolve::private_symbol))]
    PrivateSymbol {
        symbol: String,
        module: String,
        requester: String,
        visibility: String,
    },

    #[error("`{symbol}` is not exported by `{module}`")]
    #[diagnostic(code(lume::resolve::target_not_found))]
    TargetNotFound { symbol: String, module: String },

    #[error("cyclic re-export of `{symbol}`")]
    #[diagnostic(code(lume::resolve::cyclic_reexport))]
    CyclicReExport {
        symbol: String,
        /// Every `module::symbol` visited, ending with the repeated one
        chain: Vec<String>,
    },

    #[error("cyclic {kind} dependency")]
    #[diagnostic(code(lume::resolve::cyclic_dependency))]
    CyclicDependency { kind: GraphKind, cycle: Vec<String> },

    #[error("module `{module}` has more than one default export")]
    #[diagnostic(code(lume::resolve::duplicate_default_export))]
    DuplicateDefaultExport { module: String },

    #[error("invalid manifest: {message}")]
    #[diagnostic(code(lume::resolve::manifest))]
    Manifest {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("i/o error at {}: {message}", .path.display())]
    #[diagnostic(code(lume::resolve::io))]
    Io { path: PathBuf, message: String },
}

impl ResolveError {
    /// Wrap an `anyhow` error from manifest loading, keeping its context chain.
    pub fn manifest(path: Option<PathBuf>, err: &anyhow::Error) -> Self {
        ResolveError::Manifest {
            path,
            message: format!("{:#}", err),
        }
    }

    pub fn io(path: impl Into<PathBuf>, err: &dyn std::error::Error) -> Self {
        ResolveError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Errors that invalidate the whole session rather than one import.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResolveError::DuplicatePackageId { .. }
                | ResolveError::VersionConflict { .. }
                | ResolveError::Manifest { .. }
        )
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());
        if let Some(code) = MietteDiagnostic::code(self) {
            diag = diag.with_code(code.to_string());
        }

        match self {
            ResolveError::UnresolvedPackage { requested_by, .. } => {
                if let Some(by) = requested_by {
                    diag = diag.with_context(format!("required by `{}`", by));
                }
                diag.with_suggestion(suggestions::PACKAGE_NOT_FOUND)
            }

            ResolveError::DuplicatePackageId { locations, .. } => {
                for location in locations {
                    diag = diag.with_context(format!("declared at {}", location.display()));
                }
                diag.with_suggestion("give each package a distinct `name` or `scope`")
            }

            ResolveError::VersionConflict { report, .. } => {
                for line in report.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.trim());
                }
                diag.with_suggestion(suggestions::VERSION_CONFLICT)
            }

            ResolveError::ModuleNotFound { tried, .. } => {
                for candidate in tried {
                    diag = diag.with_context(format!("tried {}", candidate));
                }
                diag.with_suggestion(suggestions::MODULE_NOT_FOUND)
            }

            ResolveError::AmbiguousModulePath { candidates, .. } => {
                for candidate in candidates {
                    diag = diag.with_context(format!("candidate {}", candidate.display()));
                }
                diag.with_suggestion(suggestions::AMBIGUOUS_MODULE)
            }

            ResolveError::PrivateSymbol { visibility, .. } => diag
                .with_context(format!("declared with `{}` visibility", visibility))
                .with_suggestion(suggestions::PRIVATE_SYMBOL),

            ResolveError::TargetNotFound { .. } => diag,

            ResolveError::CyclicReExport { chain, .. } => {
                diag = diag.with_context(format!("chain: {}", chain.join(" -> ")));
                diag.with_suggestion("point one of the re-exports at the defining module")
            }

            ResolveError::CyclicDependency { cycle, .. } => diag
                .with_context(format!("cycle: {}", cycle.join(" -> ")))
                .with_suggestion(suggestions::CYCLE),

            ResolveError::DuplicateDefaultExport { .. } => {
                diag.with_suggestion("keep one `export default` and turn the others into named exports")
            }

            ResolveError::Manifest { path, .. } => match path {
                Some(path) => diag.with_location(path.clone()),
                None => diag,
            },

            ResolveError::Io { path, .. } => diag.with_location(path.clone()),
        }
    }
}

/// Non-fatal findings. Never block a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// An `excluding` entry matched nothing in the candidate set.
    UnusedExclusion {
        requester: String,
        from: String,
        selector: String,
    },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::UnusedExclusion { from, selector, .. } => {
                write!(f, "`{}` is excluded but not imported from \"{}\"", selector, from)
            }
        }
    }
}

impl ResolveWarning {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveWarning::UnusedExclusion { requester, .. } => Diagnostic::warning(self.to_string())
                .with_code("lume::resolve::unused_exclusion")
                .with_context(format!("in `{}`", requester))
                .with_suggestion("remove the entry from the `excluding` clause"),
        }
    }
}
