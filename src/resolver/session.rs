//! Resolution session.
//!
//! A [`Session`] owns everything one resolution pass needs: the workspace,
//! the package registry, the declarations and the per-session caches. It
//! is an ordinary value; two sessions never share state.
//!
//! Resolving a compilation unit is two-phase. Imports are resolved in
//! parallel and every module edge they touch goes into one shared graph;
//! only once all of them have finished is the graph checked for cycles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::core::decl::{DeclarationSet, DeclarationSource, ImportKind, ImportSpecifier, Selector};
use crate::core::module::{ModuleFile, ModuleKey};
use crate::core::path::ModulePath;
use crate::core::{PackageId, Workspace};
use crate::resolver::cache::MemoCache;
use crate::resolver::classify::{classify, ImportPath};
use crate::resolver::errors::{ResolveError, ResolveWarning};
use crate::resolver::exports::ExportTable;
use crate::resolver::filter;
use crate::resolver::graph::{DependencyGraph, GraphSnapshot};
use crate::resolver::locate::{locate, LocateRequest};
use crate::resolver::reexport::{ChainWalker, Enumerate, ForwardChain};
use crate::resolver::registry::PackageRegistry;
use crate::resolver::symbol::{ResolvedSymbol, SymbolTable};
use crate::sources::{DirectoryRegistry, Source};
use crate::util::config::ResolverConfig;

/// One name an import brings into scope.
#[derive(Debug, Clone)]
pub struct ResolvedBinding {
    /// Name in the importing module (`impl ...` text for impl bindings)
    pub local: String,
    pub symbol: Arc<ResolvedSymbol>,
}

/// A fully resolved import.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub requester: ModuleKey,
    pub target: ModuleFile,
    pub bindings: Vec<ResolvedBinding>,
    /// Alias of a namespace import
    pub namespace: Option<String>,
}

/// Everything one pass over a compilation unit produced.
#[derive(Debug)]
pub struct ResolutionReport {
    pub imports: Vec<ResolvedImport>,
    /// Every error found, in a stable order: package indexes, then imports
    /// in request order, then module cycles, then package cycles
    pub errors: Vec<ResolveError>,
    pub warnings: Vec<ResolveWarning>,
    pub graph: GraphSnapshot,
}

impl ResolutionReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Session {
    workspace: Workspace,
    config: ResolverConfig,
    registry: PackageRegistry,
    declarations: Arc<dyn DeclarationSource>,

    located: MemoCache<(PackageId, LocateRequest), ModuleFile>,
    exports: MemoCache<ModuleKey, ExportTable>,
    chains: MemoCache<(ModuleKey, Selector), ForwardChain>,
    symbols: SymbolTable,
}

impl Session {
    /// Load the workspace at `root` and build its package registry.
    ///
    /// Registry errors are fatal. Every package is indexed before this
    /// returns, so layout problems are known up front.
    pub fn open(root: &Path, config: ResolverConfig) -> Result<Self, ResolveError> {
        let workspace =
            Workspace::load(root).map_err(|e| ResolveError::manifest(Some(root.to_path_buf()), &e))?;

        let directory = config.registry.path.clone().map(DirectoryRegistry::new);
        let source = directory.as_ref().map(|d| d as &dyn Source);
        let registry = PackageRegistry::build(&workspace, &config, source)?;

        let indexed = registry.index_all();
        let ambiguous: usize = indexed
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|record| record.index.ambiguities().count())
            .sum();
        tracing::info!(
            "indexed {} package(s), {} ambiguous path(s)",
            indexed.len(),
            ambiguous
        );

        Ok(Session {
            workspace,
            config,
            registry,
            declarations: Arc::new(DeclarationSet::new()),
            located: MemoCache::new(),
            exports: MemoCache::new(),
            chains: MemoCache::new(),
            symbols: SymbolTable::new(),
        })
    }

    /// Replace the declarations. Export tables, chains and symbols start over.
    pub fn with_declarations(mut self, declarations: Arc<dyn DeclarationSource>) -> Self {
        self.set_declarations(declarations);
        self
    }

    pub fn set_declarations(&mut self, declarations: Arc<dyn DeclarationSource>) {
        self.declarations = declarations;
        self.exports = MemoCache::new();
        self.chains = MemoCache::new();
        self.symbols = SymbolTable::new();
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Locate the module `spec` names, as seen from `requester`.
    pub fn locate(&self, spec: &str, requester: &ModuleKey) -> Result<ModuleFile, ResolveError> {
        self.resolve_path(requester, spec)
    }

    /// Classify `raw`, find its package and locate the module inside it.
    pub fn resolve_path(&self, requester: &ModuleKey, raw: &str) -> Result<ModuleFile, ResolveError> {
        match classify(raw) {
            ImportPath::Relative(rel) => {
                let path = requester.dir().join_relative(rel).ok_or_else(|| {
                    ResolveError::ModuleNotFound {
                        package: requester.package.to_string(),
                        path: raw.to_string(),
                        tried: vec![format!("{} (outside the source root)", raw)],
                    }
                })?;
                let dir_only = rel == "." || rel == ".." || rel.ends_with('/');
                self.locate_in(requester.package, LocateRequest::new(path, dir_only))
            }

            ImportPath::SelfScoped(sub_path) => {
                self.locate_in(requester.package, LocateRequest::parse(sub_path))
            }

            ImportPath::Package {
                package,
                sub_path,
                fallback,
            } => {
                if let Some(id) = self.registered(package) {
                    return self.locate_in(id, LocateRequest::parse(sub_path));
                }
                if let Some((scope, rest)) = fallback {
                    if let Some(id) = self.registered(scope) {
                        tracing::debug!("`{}` is not registered; reading `{}` as scope `{}`", package, raw, scope);
                        return self.locate_in(id, LocateRequest::parse(rest));
                    }
                }
                Err(ResolveError::UnresolvedPackage {
                    package: package.to_string(),
                    requested_by: Some(requester.to_string()),
                })
            }
        }
    }

    fn registered(&self, raw: &str) -> Option<PackageId> {
        PackageId::parse(raw).ok().filter(|&id| self.registry.contains(id))
    }

    fn locate_in(&self, package: PackageId, request: LocateRequest) -> Result<ModuleFile, ResolveError> {
        let record = self.registry.lookup(package)?;
        let key = (package, request);
        let file = self.located.get_or_try_init(&key, || {
            locate(&record.index, &key.1, self.registry.extensions())
        })?;
        tracing::debug!("{} `{}` -> {}", package, key.1.path, file.key);
        Ok(ModuleFile::clone(&file))
    }

    /// The export table of `module`, built on first use.
    pub fn exports_of(&self, module: &ModuleKey) -> Result<Arc<ExportTable>, ResolveError> {
        self.exports.get_or_try_init(module, || {
            let declarations = self.declarations.declarations(module);
            ExportTable::build(module, declarations.as_deref(), |raw| {
                self.resolve_path(module, raw).map(|file| file.key)
            })
        })
    }

    /// The flattened chain for `selector` as exported by `module`.
    ///
    /// Visibility is not checked here; the same chain serves every consumer.
    pub fn chain(&self, module: &ModuleKey, selector: &Selector) -> Result<Arc<ForwardChain>, ResolveError> {
        self.chains
            .get_or_try_init(&(module.clone(), selector.clone()), || {
                let exports = |m: &ModuleKey| self.exports_of(m);
                let parents = |p: PackageId| self.registry.parent_of(p);
                let walk = ChainWalker::new(&exports, &parents).walk(module, selector)?;

                let Some(terminal) = walk.hops.last() else {
                    return Err(ResolveError::TargetNotFound {
                        symbol: selector.to_string(),
                        module: module.to_string(),
                    });
                };
                let file = self.module_file(&terminal.module)?;
                let symbol = self
                    .symbols
                    .intern(&terminal.module, &terminal.selector, file, walk.no_auto_import);

                Ok(ForwardChain {
                    hops: walk.hops,
                    symbol,
                })
            })
    }

    fn module_file(&self, module: &ModuleKey) -> Result<PathBuf, ResolveError> {
        let record = self.registry.lookup(module.package)?;
        record
            .index
            .file(&module.path)
            .map(Path::to_path_buf)
            .ok_or_else(|| ResolveError::ModuleNotFound {
                package: module.package.to_string(),
                path: module.path.to_string(),
                tried: vec![module.path.to_string()],
            })
    }

    /// Resolve a single import on its own.
    pub fn resolve_import(
        &self,
        spec: &ImportSpecifier,
    ) -> Result<(ResolvedImport, Vec<ResolveWarning>), ResolveError> {
        self.resolve_into(spec, &DependencyGraph::new())
    }

    /// Resolve every import of the current declarations.
    pub fn resolve_all(&self) -> ResolutionReport {
        let specs = self.declarations.import_specifiers();
        self.resolve_imports(&specs)
    }

    /// Install `unit` as the declarations and resolve all of its imports.
    pub fn resolve_unit(&mut self, unit: &DeclarationSet) -> ResolutionReport {
        self.set_declarations(Arc::new(unit.clone()));
        self.resolve_all()
    }

    /// Resolve `specs` in parallel, then validate the accumulated graph.
    pub fn resolve_imports(&self, specs: &[ImportSpecifier]) -> ResolutionReport {
        let graph = DependencyGraph::new();

        let results: Vec<_> = specs
            .par_iter()
            .map(|spec| self.resolve_into(spec, &graph))
            .collect();

        let mut errors = Vec::new();
        for record in self.registry.index_all() {
            match record {
                Ok(record) => errors.extend(
                    record
                        .index
                        .ambiguities()
                        .map(|a| record.index.ambiguity_error(a)),
                ),
                Err(e) => errors.push(e),
            }
        }

        let mut imports = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok((import, found)) => {
                    imports.push(import);
                    warnings.extend(found);
                }
                Err(e) => {
                    if !errors.contains(&e) {
                        errors.push(e);
                    }
                }
            }
        }

        // Phase two: every edge is in; now look for cycles
        let snapshot = graph.snapshot();
        errors.extend(snapshot.cycle_errors());

        tracing::info!(
            "resolved {} of {} import(s): {} error(s), {} warning(s)",
            imports.len(),
            specs.len(),
            errors.len(),
            warnings.len()
        );

        ResolutionReport {
            imports,
            errors,
            warnings,
            graph: snapshot,
        }
    }

    fn resolve_into(
        &self,
        spec: &ImportSpecifier,
        graph: &DependencyGraph,
    ) -> Result<(ResolvedImport, Vec<ResolveWarning>), ResolveError> {
        let requester = &spec.requester;
        let decl = &spec.declaration;
        tracing::debug!("{}: import from `{}`", requester, decl.from);

        let target = self.resolve_path(requester, &decl.from)?;

        let exports = |m: &ModuleKey| self.exports_of(m);
        let parents = |p: PackageId| self.registry.parent_of(p);
        let walker = ChainWalker::new(&exports, &parents);

        let bind = |selector: &Selector| -> Result<Arc<ForwardChain>, ResolveError> {
            let chain = self.chain(&target.key, selector)?;
            walker.check(&chain.hops, requester)?;
            Ok(chain)
        };

        // (local name, selector, chain once resolved)
        let mut candidates: Vec<(String, Selector, Option<Arc<ForwardChain>>)> = Vec::new();
        let mut namespace = None;

        match &decl.kind {
            ImportKind::Default { local } => {
                candidates.push((local.clone(), Selector::Default, None));
            }
            ImportKind::Named { items } => {
                for item in items {
                    candidates.push((item.local().to_string(), Selector::name(&item.name), None));
                }
            }
            ImportKind::Impl(selector) if selector.is_exact() => {
                let selector = Selector::Impl(selector.clone());
                candidates.push((selector.to_string(), selector, None));
            }
            ImportKind::Namespace { alias } => {
                namespace = Some(alias.clone());
                for selector in walker.enumerate(&target.key, Enumerate::Names)? {
                    if let Some(chain) = visible(bind(&selector))? {
                        let local = selector.to_string();
                        candidates.push((local, selector, Some(chain)));
                    }
                }
            }
            ImportKind::Impl(wanted) => {
                for selector in walker.enumerate(&target.key, Enumerate::Impls)? {
                    let Selector::Impl(found) = &selector else {
                        continue;
                    };
                    if !wanted.covers(found) {
                        continue;
                    }
                    if let Some(chain) = visible(bind(&selector))? {
                        if chain.symbol.no_auto_import {
                            tracing::debug!("{}: skipping `{}` (no auto import)", requester, selector);
                            continue;
                        }
                        candidates.push((selector.to_string(), selector, Some(chain)));
                    }
                }
            }
        }

        let filtered = filter::apply(candidates, &decl.excluding, |(_, selector, _)| selector);

        let warnings: Vec<ResolveWarning> = filtered
            .unmatched
            .iter()
            .map(|selector| {
                let warning = ResolveWarning::UnusedExclusion {
                    requester: requester.to_string(),
                    from: decl.from.clone(),
                    selector: selector.to_string(),
                };
                tracing::warn!("{}", warning);
                warning
            })
            .collect();

        let mut edges = vec![(requester.clone(), target.key.clone())];
        let mut bindings = Vec::with_capacity(filtered.kept.len());
        for (local, selector, chain) in filtered.kept {
            let chain = match chain {
                Some(chain) => chain,
                None => bind(&selector)?,
            };
            edges.extend(chain.edges().map(|(from, to)| (from.clone(), to.clone())));
            bindings.push(ResolvedBinding {
                local,
                symbol: chain.symbol.clone(),
            });
        }

        // a failed import contributes no edges
        for (from, to) in &edges {
            graph.add_edge(from, to);
        }

        Ok((
            ResolvedImport {
                requester: requester.clone(),
                target,
                bindings,
                namespace,
            },
            warnings,
        ))
    }

    /// The module a `--from` style reference (`<package>/<module path>`) names.
    pub fn module_key(&self, raw: &str) -> Result<ModuleKey, ResolveError> {
        let (package, path) = match classify(raw) {
            ImportPath::Package { package, sub_path, .. } => (package, sub_path),
            _ => (raw, ""),
        };
        let id = PackageId::parse(package).map_err(|_| ResolveError::UnresolvedPackage {
            package: package.to_string(),
            requested_by: None,
        })?;
        if !self.registry.contains(id) {
            return Err(ResolveError::UnresolvedPackage {
                package: id.to_string(),
                requested_by: None,
            });
        }
        Ok(ModuleKey::new(id, ModulePath::parse(path)))
    }
}

/// Bulk imports silently drop what the requester may not see.
fn visible(
    result: Result<Arc<ForwardChain>, ResolveError>,
) -> Result<Option<Arc<ForwardChain>>, ResolveError> {
    match result {
        Ok(chain) => Ok(Some(chain)),
        Err(ResolveError::PrivateSymbol { .. }) | Err(ResolveError::TargetNotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decl::{
        ExclusionClause, ExportDeclaration, ImplSelector, ImportDeclaration, ModuleDeclarations,
        NamedImport, ReExportDeclaration, Visibility,
    };
    use crate::resolver::errors::GraphKind;
    use crate::test_support::WorkspaceFixture;

    const APP: &str = "name = \"app\"\nversion = \"1.0.0\"\n";
    const LIB: &str = "name = \"lib\"\nversion = \"1.0.0\"\n";

    fn id(raw: &str) -> PackageId {
        PackageId::parse(raw).unwrap()
    }

    fn key(pkg: &str, path: &str) -> ModuleKey {
        ModuleKey::new(id(pkg), ModulePath::parse(path))
    }

    fn exports(list: &[(&str, Visibility)]) -> ModuleDeclarations {
        ModuleDeclarations {
            exports: list
                .iter()
                .map(|(name, vis)| ExportDeclaration::new(Selector::name(*name), vis.clone()))
                .collect(),
            ..Default::default()
        }
    }

    fn named(from: &str, names: &[&str]) -> ImportDeclaration {
        ImportDeclaration {
            from: from.to_string(),
            kind: ImportKind::Named {
                items: names
                    .iter()
                    .map(|n| NamedImport {
                        name: n.to_string(),
                        alias: None,
                    })
                    .collect(),
            },
            excluding: Vec::new(),
        }
    }

    fn namespace(from: &str, alias: &str) -> ImportDeclaration {
        ImportDeclaration {
            from: from.to_string(),
            kind: ImportKind::Namespace {
                alias: alias.to_string(),
            },
            excluding: Vec::new(),
        }
    }

    fn importing(imports: Vec<ImportDeclaration>) -> ModuleDeclarations {
        ModuleDeclarations {
            imports,
            ..Default::default()
        }
    }

    fn spec(requester: ModuleKey, declaration: ImportDeclaration) -> ImportSpecifier {
        ImportSpecifier {
            requester,
            declaration,
        }
    }

    #[test]
    fn test_self_path_case_folds() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/main.lume")
            .touch("app/src/utils.lume")
            .build();
        let session = fx.session().unwrap();
        let main = key("app", "main.lume");

        let upper = session.locate("@self/Utils", &main).unwrap();
        let lower = session.locate("@self/utils", &main).unwrap();
        assert_eq!(upper.key, lower.key);
        assert_eq!(upper.key, key("app", "utils.lume"));
    }

    #[test]
    fn test_lookalike_unicode_is_distinct() {
        // second file uses CYRILLIC SMALL LETTER TE
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/utils.lume")
            .touch("app/src/u\u{0442}ils.lume")
            .build();
        let session = fx.session().unwrap();
        let main = key("app", "main.lume");

        let latin = session.locate("@self/utils", &main).unwrap();
        let cyrillic = session.locate("@self/u\u{0442}ils", &main).unwrap();
        assert_ne!(latin.key, cyrillic.key);
        assert_ne!(latin.file, cyrillic.file);
    }

    #[test]
    fn test_explicit_suffix_probes_one_file() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/net/mod.lume")
            .build();
        let session = fx.session().unwrap();

        match session.locate("@self/net.lume", &key("app", "main.lume")) {
            Err(ResolveError::ModuleNotFound { tried, .. }) => assert_eq!(tried, vec!["net.lume"]),
            other => panic!("unexpected {:?}", other),
        }
        assert!(session.locate("@self/net", &key("app", "main.lume")).is_ok());
    }

    #[test]
    fn test_relative_and_package_paths() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .member("lib", LIB)
            .touch("app/src/cli/run.lume")
            .touch("app/src/shared.lume")
            .touch("lib/src/mod.lume")
            .touch("lib/src/text/mod.lume")
            .build();
        let session = fx.session().unwrap();
        let run = key("app", "cli/run.lume");

        assert_eq!(session.locate("../shared", &run).unwrap().key, key("app", "shared.lume"));
        assert_eq!(session.locate("lib", &run).unwrap().key, key("lib", "mod.lume"));
        assert_eq!(session.locate("Lib/Text", &run).unwrap().key, key("lib", "text/mod.lume"));
        assert!(matches!(
            session.locate("../../escape", &run),
            Err(ResolveError::ModuleNotFound { .. })
        ));
        assert!(matches!(
            session.locate("ghost/x", &run),
            Err(ResolveError::UnresolvedPackage { .. })
        ));
    }

    #[test]
    fn test_scope_only_builtin() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .builtin("@std", "0.3.0")
            .touch("builtins/std/io/mod.lume")
            .build();
        let session = fx.session().unwrap();

        let io = session.locate("@std/io", &key("app", "main.lume")).unwrap();
        assert_eq!(io.key, key("@std", "io/mod.lume"));
    }

    #[test]
    fn test_ambiguity_reported_without_import() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/main.lume")
            .touch("app/src/other.lume")
            .touch("app/src/foo.lume")
            .touch("app/src/foo/bar.lume")
            .build();
        let mut session = fx.session().unwrap();

        let unit = DeclarationSet::new()
            .with_module(id("app"), "main.lume", importing(vec![namespace("./other", "other")]));
        let report = session.resolve_unit(&unit);

        assert_eq!(report.imports.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(&report.errors[0], ResolveError::AmbiguousModulePath { path, .. } if *path == "foo"));
    }

    #[test]
    fn test_visibility_through_forwarding() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .member("lib", LIB)
            .member("wrap", "name = \"wrap\"\nversion = \"1.0.0\"\n")
            .touch("app/src/main.lume")
            .touch("lib/src/a.lume")
            .touch("lib/src/b.lume")
            .touch("wrap/src/b.lume")
            .build();

        let forward = |from: &str| ModuleDeclarations {
            reexports: vec![ReExportDeclaration::Named {
                local: Selector::name("x"),
                from: from.to_string(),
                remote: Selector::name("x"),
                visibility: Visibility::Public,
            }],
            ..Default::default()
        };
        let unit = DeclarationSet::new()
            .with_module(id("lib"), "a.lume", exports(&[("x", Visibility::Package)]))
            .with_module(id("lib"), "b.lume", forward("./a"))
            .with_module(id("wrap"), "b.lume", forward("lib/a"));
        let session = fx.session().unwrap().with_declarations(Arc::new(unit));
        let main = key("app", "main.lume");

        // same-package forwarder: allowed
        let (import, _) = session.resolve_import(&spec(main.clone(), named("lib/b", &["x"]))).unwrap();
        assert_eq!(import.bindings[0].symbol.module, key("lib", "a.lume"));

        // cross-package forwarder cannot widen `package` visibility
        let err = session.resolve_import(&spec(main, named("wrap/b", &["x"]))).unwrap_err();
        assert!(matches!(err, ResolveError::PrivateSymbol { ref module, .. } if *module == "lib/a.lume"));
    }

    #[test]
    fn test_private_export_is_not_found() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/main.lume")
            .touch("app/src/a.lume")
            .build();
        let unit = DeclarationSet::new().with_module(id("app"), "a.lume", exports(&[("hidden", Visibility::Private)]));
        let session = fx.session().unwrap().with_declarations(Arc::new(unit));

        let err = session
            .resolve_import(&spec(key("app", "main.lume"), named("./a", &["hidden"])))
            .unwrap_err();
        assert!(matches!(err, ResolveError::TargetNotFound { .. }));
    }

    #[test]
    fn test_reexport_cycle_lists_every_hop() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/main.lume")
            .touch("app/src/a.lume")
            .touch("app/src/b.lume")
            .touch("app/src/c.lume")
            .build();
        let forward = |from: &str| ModuleDeclarations {
            reexports: vec![ReExportDeclaration::Named {
                local: Selector::name("x"),
                from: from.to_string(),
                remote: Selector::name("x"),
                visibility: Visibility::Public,
            }],
            ..Default::default()
        };
        let unit = DeclarationSet::new()
            .with_module(id("app"), "a.lume", forward("./b"))
            .with_module(id("app"), "b.lume", forward("./c"))
            .with_module(id("app"), "c.lume", forward("./a"));
        let session = fx.session().unwrap().with_declarations(Arc::new(unit));

        match session.resolve_import(&spec(key("app", "main.lume"), named("./a", &["x"]))) {
            Err(ResolveError::CyclicReExport { chain, .. }) => assert_eq!(
                chain,
                vec!["app/a.lume::x", "app/b.lume::x", "app/c.lume::x", "app/a.lume::x"]
            ),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_module_cycle_found_after_all_imports() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/a.lume")
            .touch("app/src/b.lume")
            .touch("app/src/c.lume")
            .build();
        let unit = DeclarationSet::new()
            .with_module(id("app"), "c.lume", importing(vec![namespace("./a", "a")]))
            .with_module(id("app"), "a.lume", importing(vec![namespace("./b", "b")]))
            .with_module(id("app"), "b.lume", importing(vec![namespace("./c", "c")]));
        let mut session = fx.session().unwrap();
        let report = session.resolve_unit(&unit);

        assert_eq!(report.imports.len(), 3);
        assert_eq!(report.errors.len(), 1);
        match &report.errors[0] {
            ResolveError::CyclicDependency { kind, cycle } => {
                assert_eq!(*kind, GraphKind::Module);
                assert_eq!(cycle, &vec!["app/a.lume", "app/b.lume", "app/c.lume", "app/a.lume"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failed_import_adds_no_edge() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/a.lume")
            .touch("app/src/b.lume")
            .build();
        let mut b = exports(&[("hidden", Visibility::Private)]);
        b.imports.push(namespace("./a", "a"));
        let unit = DeclarationSet::new()
            .with_module(id("app"), "a.lume", importing(vec![named("./b", &["hidden"])]))
            .with_module(id("app"), "b.lume", b);
        let mut session = fx.session().unwrap();
        let report = session.resolve_unit(&unit);

        assert_eq!(report.imports.len(), 1);
        assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
        assert!(matches!(report.errors[0], ResolveError::TargetNotFound { .. }));
        assert!(report.graph.modules.contains_edge(&key("app", "b.lume"), &key("app", "a.lume")));
        assert!(!report.graph.modules.contains_edge(&key("app", "a.lume"), &key("app", "b.lume")));
    }

    #[test]
    fn test_missing_exclusion_warns_once() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/main.lume")
            .touch("app/src/text.lume")
            .build();
        let mut import = namespace("./text", "text");
        import.excluding = vec![ExclusionClause::List(vec![Selector::name("ghost"), Selector::name("debug")])];
        let unit = DeclarationSet::new()
            .with_module(
                id("app"),
                "text.lume",
                exports(&[("parse", Visibility::Public), ("debug", Visibility::Public)]),
            )
            .with_module(id("app"), "main.lume", importing(vec![import]));
        let mut session = fx.session().unwrap();
        let report = session.resolve_unit(&unit);

        assert!(report.is_ok(), "{:?}", report.errors);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            ResolveWarning::UnusedExclusion { selector, .. } if *selector == "ghost"
        ));
        let locals: Vec<_> = report.imports[0].bindings.iter().map(|b| b.local.as_str()).collect();
        assert_eq!(locals, vec!["parse"]);
    }

    #[test]
    fn test_symbols_are_shared_across_import_sites() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .member("lib", LIB)
            .touch("app/src/one.lume")
            .touch("app/src/two.lume")
            .touch("lib/src/mod.lume")
            .build();
        let unit = DeclarationSet::new()
            .with_module(id("lib"), "mod.lume", exports(&[("x", Visibility::Public)]))
            .with_module(id("app"), "one.lume", importing(vec![named("lib", &["x"])]))
            .with_module(id("app"), "two.lume", importing(vec![named("Lib", &["x"])]));
        let mut session = fx.session().unwrap();
        let report = session.resolve_unit(&unit);

        assert!(report.is_ok(), "{:?}", report.errors);
        let a = &report.imports[0].bindings[0].symbol;
        let b = &report.imports[1].bindings[0].symbol;
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(session.symbols().len(), 1);
    }

    #[test]
    fn test_impl_bulk_import_skips_no_auto_import() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/main.lume")
            .touch("app/src/point.lume")
            .build();
        let show = ImplSelector::new(Some("Show"), Some("Point"));
        let debug = ImplSelector::new(Some("Debug"), Some("Point"));
        let unit = DeclarationSet::new().with_module(
            id("app"),
            "point.lume",
            ModuleDeclarations {
                exports: vec![
                    ExportDeclaration::new(Selector::Impl(show.clone()), Visibility::Public),
                    ExportDeclaration::new(Selector::Impl(debug.clone()), Visibility::Public).no_auto_import(),
                ],
                ..Default::default()
            },
        );
        let session = fx.session().unwrap().with_declarations(Arc::new(unit));
        let main = key("app", "main.lume");
        let impl_import = |sel: ImplSelector| ImportDeclaration {
            from: "./point".to_string(),
            kind: ImportKind::Impl(sel),
            excluding: Vec::new(),
        };

        let (bulk, _) = session
            .resolve_import(&spec(main.clone(), impl_import(ImplSelector::default())))
            .unwrap();
        let locals: Vec<_> = bulk.bindings.iter().map(|b| b.local.as_str()).collect();
        assert_eq!(locals, vec!["impl Show for Point"]);

        let (exact, _) = session.resolve_import(&spec(main, impl_import(debug))).unwrap();
        assert_eq!(exact.bindings.len(), 1);
    }

    #[test]
    fn test_wildcard_reexport_skips_default() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/main.lume")
            .touch("app/src/core.lume")
            .touch("app/src/prelude.lume")
            .build();
        let mut core = exports(&[("run", Visibility::Public)]);
        core.exports.push(ExportDeclaration::new(Selector::Default, Visibility::Public));
        let unit = DeclarationSet::new()
            .with_module(id("app"), "core.lume", core)
            .with_module(
                id("app"),
                "prelude.lume",
                ModuleDeclarations {
                    reexports: vec![ReExportDeclaration::Wildcard {
                        from: "./core".to_string(),
                        include_default: false,
                        visibility: Visibility::Public,
                    }],
                    ..Default::default()
                },
            );
        let session = fx.session().unwrap().with_declarations(Arc::new(unit));
        let main = key("app", "main.lume");

        let (import, _) = session.resolve_import(&spec(main.clone(), named("./prelude", &["run"]))).unwrap();
        assert_eq!(import.bindings[0].symbol.module, key("app", "core.lume"));

        let default = ImportDeclaration {
            from: "./prelude".to_string(),
            kind: ImportKind::Default {
                local: "core".to_string(),
            },
            excluding: Vec::new(),
        };
        assert!(matches!(
            session.resolve_import(&spec(main, default)),
            Err(ResolveError::TargetNotFound { .. })
        ));
    }

    #[test]
    fn test_namespace_import_through_wildcard_that_leads_back() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .touch("app/src/main.lume")
            .touch("app/src/a.lume")
            .touch("app/src/b.lume")
            .touch("app/src/c.lume")
            .build();
        let everything_from = |from: &str| ReExportDeclaration::Wildcard {
            from: from.to_string(),
            include_default: false,
            visibility: Visibility::Public,
        };
        let unit = DeclarationSet::new()
            .with_module(
                id("app"),
                "a.lume",
                ModuleDeclarations {
                    reexports: vec![everything_from("./c"), everything_from("./b")],
                    ..Default::default()
                },
            )
            .with_module(
                id("app"),
                "c.lume",
                ModuleDeclarations {
                    reexports: vec![everything_from("./a")],
                    ..Default::default()
                },
            )
            .with_module(id("app"), "b.lume", exports(&[("x", Visibility::Public)]));
        let session = fx.session().unwrap().with_declarations(Arc::new(unit));

        let (import, _) = session
            .resolve_import(&spec(key("app", "main.lume"), namespace("./a", "a")))
            .unwrap();
        assert_eq!(import.bindings.len(), 1);
        assert_eq!(import.bindings[0].local, "x");
        assert_eq!(import.bindings[0].symbol.module, key("app", "b.lume"));
    }

    #[test]
    fn test_indexing_happens_once_per_package() {
        let fx = WorkspaceFixture::new()
            .member("app", APP)
            .member("lib", LIB)
            .touch("app/src/main.lume")
            .touch("lib/src/mod.lume")
            .build();
        let session = fx.session().unwrap();
        assert_eq!(session.registry().constructions(), 2);

        let main = key("app", "main.lume");
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| session.locate("lib", &main).unwrap());
            }
        });
        assert_eq!(session.registry().constructions(), 2);
    }
}
