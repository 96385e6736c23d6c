//! Import and export declarations.
//!
//! The resolver never parses source text. Declarations are handed to it by
//! the front end through a [`DeclarationSource`], keyed by module.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::module::ModuleKey;
use crate::core::path::ModulePath;
use crate::core::PackageId;

/// `impl`, `impl Trait`, `impl for Type`, `impl Trait for Type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImplSelector {
    #[serde(default, rename = "trait", skip_serializing_if = "Option::is_none")]
    pub trait_name: Option<String>,

    #[serde(default, rename = "for", skip_serializing_if = "Option::is_none")]
    pub for_type: Option<String>,
}

impl ImplSelector {
    pub fn new(trait_name: Option<&str>, for_type: Option<&str>) -> Self {
        ImplSelector {
            trait_name: trait_name.map(str::to_string),
            for_type: for_type.map(str::to_string),
        }
    }

    /// Fully qualified selectors name exactly one impl and bypass `@noAutoImport`.
    pub fn is_exact(&self) -> bool {
        self.trait_name.is_some() && self.for_type.is_some()
    }

    /// Whether `other` (a concrete impl binding) falls under this selector.
    /// Missing qualifiers match anything.
    pub fn covers(&self, other: &ImplSelector) -> bool {
        let trait_ok = match &self.trait_name {
            Some(t) => other.trait_name.as_ref() == Some(t),
            None => true,
        };
        let type_ok = match &self.for_type {
            Some(t) => other.for_type.as_ref() == Some(t),
            None => true,
        };
        trait_ok && type_ok
    }
}

impl fmt::Display for ImplSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "impl")?;
        if let Some(t) = &self.trait_name {
            write!(f, " {}", t)?;
        }
        if let Some(t) = &self.for_type {
            write!(f, " for {}", t)?;
        }
        Ok(())
    }
}

/// What an export, re-export, import or exclusion refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Selector {
    Name { name: String },
    Default,
    Impl(ImplSelector),
}

impl Selector {
    pub fn name(name: impl Into<String>) -> Self {
        Selector::Name { name: name.into() }
    }

    /// Whether an exclusion entry `self` removes candidate `other`.
    pub fn excludes(&self, other: &Selector) -> bool {
        match (self, other) {
            (Selector::Name { name: a }, Selector::Name { name: b }) => a == b,
            (Selector::Default, Selector::Default) => true,
            (Selector::Impl(a), Selector::Impl(b)) => a.covers(b),
            _ => false,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name { name } => write!(f, "{}", name),
            Selector::Default => write!(f, "default"),
            Selector::Impl(sel) => write!(f, "{}", sel),
        }
    }
}

/// Declared export scope, most to least permissive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Package,
    Parent,
    /// Visible to exactly one module, named by an import-style path.
    Path { target: String },
    #[default]
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDeclaration {
    pub selector: Selector,

    #[serde(default)]
    pub visibility: Visibility,

    /// `@noAutoImport`: skipped by bulk `impl` imports.
    #[serde(default, rename = "no-auto-import")]
    pub no_auto_import: bool,
}

impl ExportDeclaration {
    pub fn new(selector: Selector, visibility: Visibility) -> Self {
        ExportDeclaration {
            selector,
            visibility,
            no_auto_import: false,
        }
    }

    pub fn no_auto_import(mut self) -> Self {
        self.no_auto_import = true;
        self
    }
}

/// A forwarding pointer. Holds no value; followed at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum ReExportDeclaration {
    /// `export { remote as local } from "path"`
    Named {
        local: Selector,
        from: String,
        remote: Selector,
        #[serde(default)]
        visibility: Visibility,
    },
    /// `export { * } from "path"`, or `export default, { * } from "path"`
    Wildcard {
        from: String,
        #[serde(default, rename = "include-default")]
        include_default: bool,
        #[serde(default)]
        visibility: Visibility,
    },
}

impl ReExportDeclaration {
    pub fn visibility(&self) -> &Visibility {
        match self {
            ReExportDeclaration::Named { visibility, .. } => visibility,
            ReExportDeclaration::Wildcard { visibility, .. } => visibility,
        }
    }

    pub fn from(&self) -> &str {
        match self {
            ReExportDeclaration::Named { from, .. } => from,
            ReExportDeclaration::Wildcard { from, .. } => from,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedImport {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl NamedImport {
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum ImportKind {
    /// `import name from "path"`
    Default { local: String },
    /// `import { a, b as c } from "path"`
    Named { items: Vec<NamedImport> },
    /// `import { * } as ns from "path"`
    Namespace { alias: String },
    /// `import impl [Trait] [for Type] from "path"`
    Impl(ImplSelector),
}

/// One `excluding` clause: a single selector or a bracketed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExclusionClause {
    List(Vec<Selector>),
    Single(Selector),
}

impl ExclusionClause {
    pub fn entries(&self) -> &[Selector] {
        match self {
            ExclusionClause::List(list) => list,
            ExclusionClause::Single(one) => std::slice::from_ref(one),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDeclaration {
    pub from: String,
    pub kind: ImportKind,
    #[serde(default)]
    pub excluding: Vec<ExclusionClause>,
}

/// Everything one module declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDeclarations {
    #[serde(default)]
    pub exports: Vec<ExportDeclaration>,
    #[serde(default)]
    pub reexports: Vec<ReExportDeclaration>,
    #[serde(default)]
    pub imports: Vec<ImportDeclaration>,
}

/// A request to resolve one import on behalf of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub requester: ModuleKey,
    pub declaration: ImportDeclaration,
}

/// Supplies declarations per module. Modules without an entry declare nothing.
pub trait DeclarationSource: Send + Sync {
    fn declarations(&self, module: &ModuleKey) -> Option<Arc<ModuleDeclarations>>;

    /// Every module that has declarations, in a stable order.
    fn modules(&self) -> Vec<ModuleKey>;

    /// Every import of every module, in module order then declaration order.
    fn import_specifiers(&self) -> Vec<ImportSpecifier> {
        self.modules()
            .into_iter()
            .filter_map(|module| {
                let declarations = self.declarations(&module)?;
                Some(
                    declarations
                        .imports
                        .iter()
                        .map(|decl| ImportSpecifier {
                            requester: module.clone(),
                            declaration: decl.clone(),
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .flatten()
            .collect()
    }
}

/// In-memory declaration store.
#[derive(Debug, Clone, Default)]
pub struct DeclarationSet {
    modules: BTreeMap<ModuleKey, Arc<ModuleDeclarations>>,
}

#[derive(Debug, Deserialize)]
struct RawDeclarationFile {
    #[serde(default)]
    modules: Vec<RawModuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RawModuleEntry {
    package: PackageId,
    path: String,
    #[serde(flatten)]
    declarations: ModuleDeclarations,
}

impl DeclarationSet {
    pub fn new() -> Self {
        DeclarationSet::default()
    }

    pub fn insert(&mut self, module: ModuleKey, declarations: ModuleDeclarations) {
        self.modules.insert(module, Arc::new(declarations));
    }

    /// Builder-style insert keyed by package id text and module path.
    pub fn with_module(
        mut self,
        package: PackageId,
        path: &str,
        declarations: ModuleDeclarations,
    ) -> Self {
        self.insert(ModuleKey::new(package, ModulePath::parse(path)), declarations);
        self
    }

    /// Parse the JSON interchange format:
    /// `{ "modules": [ { "package", "path", "exports", "reexports", "imports" } ] }`.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawDeclarationFile =
            serde_json::from_str(content).context("failed to parse declaration file")?;

        let mut set = DeclarationSet::new();
        for entry in raw.modules {
            let key = ModuleKey::new(entry.package, ModulePath::parse(&entry.path));
            if set.modules.contains_key(&key) {
                anyhow::bail!("module `{}` is declared more than once", key);
            }
            set.insert(key, entry.declarations);
        }
        Ok(set)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = crate::util::fs::read_to_string(path)?;
        Self::from_json(&content)
            .with_context(|| format!("in declaration file {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl DeclarationSource for DeclarationSet {
    fn declarations(&self, module: &ModuleKey) -> Option<Arc<ModuleDeclarations>> {
        self.modules.get(module).cloned()
    }

    fn modules(&self) -> Vec<ModuleKey> {
        self.modules.keys().cloned().collect()
    }
}
