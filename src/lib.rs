//! lume-resolve - module and dependency resolution for Lume workspaces
//!
//! This crate turns import and export declarations into concrete module
//! files and resolved symbols. It builds the package set of a workspace,
//! locates modules inside packages, enforces export visibility, follows
//! re-export chains and rejects dependency cycles.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test fixtures for resolver unit tests.
///
/// Only compiled for `cargo test`.
#[cfg(test)]
pub mod test_support;

pub use core::{
    DeclarationSet, ModuleKey, ModulePath, Package, PackageId, PackageOrigin, Workspace,
};
pub use resolver::{ResolutionReport, ResolveError, ResolveWarning, Session};
pub use util::config::ResolverConfig;
