//! Core data structures for the resolver.
//!
//! This module contains the foundational types used throughout resolution:
//! - Interned package identifiers and normalized module paths
//! - Manifests (workspace, package, module)
//! - Packages, summaries and workspace membership
//! - Import/export declarations handed over by the front end

pub mod decl;
pub mod manifest;
pub mod module;
pub mod package;
pub mod package_id;
pub mod path;
pub mod summary;
pub mod workspace;

pub use decl::{
    DeclarationSet, DeclarationSource, ExclusionClause, ExportDeclaration, ImplSelector,
    ImportDeclaration, ImportKind, ImportSpecifier, ModuleDeclarations, NamedImport,
    ReExportDeclaration, Selector, Visibility,
};
pub use manifest::{
    Linkage, Manifest, ModuleManifest, WorkspaceManifest, MODULE_MANIFEST, PACKAGE_MANIFEST,
    WORKSPACE_MANIFEST,
};
pub use module::{ModuleFile, ModuleKey};
pub use package::{Package, PackageOrigin};
pub use package_id::{InvalidPackageId, PackageId, SELF_SCOPE};
pub use path::ModulePath;
pub use summary::Summary;
pub use workspace::Workspace;
