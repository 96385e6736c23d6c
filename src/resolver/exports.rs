//! Per-module export tables and the visibility lattice.

use std::collections::HashMap;
use std::fmt;

use crate::core::decl::{ModuleDeclarations, ReExportDeclaration, Selector, Visibility};
use crate::core::module::ModuleKey;
use crate::core::PackageId;
use crate::resolver::errors::ResolveError;

/// A declared visibility with any path restriction resolved to a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Public,
    Package,
    Parent,
    Module(ModuleKey),
    Private,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Public => write!(f, "public"),
            Scope::Package => write!(f, "package"),
            Scope::Parent => write!(f, "parent"),
            Scope::Module(key) => write!(f, "path({})", key),
            Scope::Private => write!(f, "private"),
        }
    }
}

/// Where an export's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOrigin {
    /// Declared in this module
    Local,
    /// A named re-export: `remote` of `target`
    Forward { target: ModuleKey, remote: Selector },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub selector: Selector,
    pub scope: Scope,
    pub no_auto_import: bool,
    pub origin: ExportOrigin,
}

/// `export { * } from "..."`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardExport {
    pub target: ModuleKey,
    pub include_default: bool,
    pub scope: Scope,
}

/// Everything a module makes visible to other modules.
///
/// Private declarations are left out entirely: addressing one is the same
/// as addressing a name that does not exist.
#[derive(Debug, Clone)]
pub struct ExportTable {
    module: ModuleKey,
    entries: Vec<ExportEntry>,
    by_selector: HashMap<Selector, usize>,
    wildcards: Vec<WildcardExport>,
}

impl ExportTable {
    /// Build the table for `module`.
    ///
    /// `resolve_path` turns an import-style path written in this module into
    /// the module it names; it is used for re-export sources and for
    /// path-restricted visibility.
    pub fn build<F>(
        module: &ModuleKey,
        declarations: Option<&ModuleDeclarations>,
        mut resolve_path: F,
    ) -> Result<Self, ResolveError>
    where
        F: FnMut(&str) -> Result<ModuleKey, ResolveError>,
    {
        let mut table = ExportTable {
            module: module.clone(),
            entries: Vec::new(),
            by_selector: HashMap::new(),
            wildcards: Vec::new(),
        };
        let Some(declarations) = declarations else {
            return Ok(table);
        };

        let mut defaults = 0;
        for export in &declarations.exports {
            if export.selector == Selector::Default {
                defaults += 1;
            }
            let scope = resolve_scope(&export.visibility, &mut resolve_path)?;
            table.push(ExportEntry {
                selector: export.selector.clone(),
                scope,
                no_auto_import: export.no_auto_import,
                origin: ExportOrigin::Local,
            });
        }

        for reexport in &declarations.reexports {
            let scope = resolve_scope(reexport.visibility(), &mut resolve_path)?;
            let target = resolve_path(reexport.from())?;
            match reexport {
                ReExportDeclaration::Named { local, remote, .. } => {
                    if *local == Selector::Default {
                        defaults += 1;
                    }
                    table.push(ExportEntry {
                        selector: local.clone(),
                        scope,
                        no_auto_import: false,
                        origin: ExportOrigin::Forward {
                            target,
                            remote: remote.clone(),
                        },
                    });
                }
                ReExportDeclaration::Wildcard { include_default, .. } => {
                    if scope != Scope::Private {
                        table.wildcards.push(WildcardExport {
                            target,
                            include_default: *include_default,
                            scope,
                        });
                    }
                }
            }
        }

        if defaults > 1 {
            return Err(ResolveError::DuplicateDefaultExport {
                module: module.to_string(),
            });
        }

        tracing::debug!(
            "{}: {} export(s), {} wildcard re-export(s)",
            module,
            table.entries.len(),
            table.wildcards.len()
        );
        Ok(table)
    }

    fn push(&mut self, entry: ExportEntry) {
        if entry.scope == Scope::Private {
            return;
        }
        if self.by_selector.contains_key(&entry.selector) {
            tracing::warn!("{}: `{}` is exported more than once; keeping the first", self.module, entry.selector);
            return;
        }
        self.by_selector.insert(entry.selector.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn module(&self) -> &ModuleKey {
        &self.module
    }

    /// Own exports and named re-exports, in declaration order.
    pub fn entries(&self) -> &[ExportEntry] {
        &self.entries
    }

    pub fn find(&self, selector: &Selector) -> Option<&ExportEntry> {
        self.by_selector.get(selector).map(|&i| &self.entries[i])
    }

    pub fn wildcards(&self) -> &[WildcardExport] {
        &self.wildcards
    }
}

fn resolve_scope<F>(visibility: &Visibility, resolve_path: &mut F) -> Result<Scope, ResolveError>
where
    F: FnMut(&str) -> Result<ModuleKey, ResolveError>,
{
    Ok(match visibility {
        Visibility::Public => Scope::Public,
        Visibility::Package => Scope::Package,
        Visibility::Parent => Scope::Parent,
        Visibility::Path { target } => Scope::Module(resolve_path(target)?),
        Visibility::Private => Scope::Private,
    })
}

/// Whether a declaration in `declarer` with `scope` may be seen by `requester`.
///
/// `parent_of` reports the declared parent package of a package.
pub fn check_visible<F>(scope: &Scope, declarer: &ModuleKey, requester: &ModuleKey, parent_of: F) -> bool
where
    F: Fn(PackageId) -> Option<PackageId>,
{
    match scope {
        Scope::Public => true,
        Scope::Package => requester.package == declarer.package,
        Scope::Parent => {
            requester.package == declarer.package || parent_of(requester.package) == Some(declarer.package)
        }
        Scope::Module(only) => only == requester,
        Scope::Private => false,
    }
}
