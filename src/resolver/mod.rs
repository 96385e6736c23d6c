//! Module and dependency resolution.
//!
//! Leaf-first:
//! - [`classify`] sorts a raw import string into relative, `@self` or package paths
//! - [`registry`] builds the package set and selects versions with PubGrub
//! - [`index`] and [`locate`] turn a sub-path into a module file
//! - [`exports`] and [`reexport`] build export tables and follow forwarding chains
//! - [`filter`] applies `excluding` clauses
//! - [`graph`] collects module edges and finds cycles
//! - [`session`] ties the pipeline together for one resolution pass

pub mod cache;
pub mod classify;
pub mod errors;
pub mod exports;
pub mod filter;
pub mod graph;
pub mod index;
pub mod locate;
pub mod reexport;
pub mod registry;
pub mod session;
pub mod symbol;
pub mod version;

pub use cache::MemoCache;
pub use classify::{classify, ImportPath};
pub use errors::{GraphKind, ResolveError, ResolveWarning};
pub use exports::{ExportTable, Scope};
pub use graph::{DependencyGraph, GraphSnapshot};
pub use index::SourceIndex;
pub use locate::{locate, LocateRequest};
pub use reexport::{ChainWalker, ForwardChain, Hop};
pub use registry::{PackageRecord, PackageRegistry};
pub use session::{ResolutionReport, ResolvedBinding, ResolvedImport, Session};
pub use symbol::{ResolvedSymbol, SymbolTable};
pub use version::VersionSolver;
