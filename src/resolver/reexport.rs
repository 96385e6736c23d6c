//! Following re-export chains to the declaration they end at.
//!
//! A chain is walked with an explicit stack of `(module, selector)` pairs;
//! meeting a pair that is already on the stack is a cycle. Walks never call
//! back into the session's chain cache, only into the export-table cache,
//! so a walk can never wait on itself.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::core::decl::Selector;
use crate::core::module::ModuleKey;
use crate::core::PackageId;
use crate::resolver::errors::ResolveError;
use crate::resolver::exports::{check_visible, ExportOrigin, ExportTable, Scope};
use crate::resolver::symbol::ResolvedSymbol;

/// One declaration along a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub module: ModuleKey,
    pub selector: Selector,
    pub scope: Scope,
}

/// Result of a raw walk: the hops, outermost first, ending at a local export.
#[derive(Debug, Clone)]
pub struct Walk {
    pub hops: Vec<Hop>,
    pub no_auto_import: bool,
}

/// A flattened chain, cached per `(module, selector)`.
#[derive(Debug)]
pub struct ForwardChain {
    pub hops: Vec<Hop>,
    pub symbol: Arc<ResolvedSymbol>,
}

impl ForwardChain {
    /// Module-to-module edges the chain touches: each forwarder to its target.
    pub fn edges(&self) -> impl Iterator<Item = (&ModuleKey, &ModuleKey)> {
        self.hops.windows(2).map(|pair| (&pair[0].module, &pair[1].module))
    }
}

/// What a bulk enumeration collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enumerate {
    /// Named exports, own and forwarded (wildcards included)
    Names,
    /// `impl` exports, own and named re-exports
    Impls,
}

pub struct ChainWalker<'a> {
    exports_of: &'a dyn Fn(&ModuleKey) -> Result<Arc<ExportTable>, ResolveError>,
    parent_of: &'a dyn Fn(PackageId) -> Option<PackageId>,
}

impl<'a> ChainWalker<'a> {
    pub fn new(
        exports_of: &'a dyn Fn(&ModuleKey) -> Result<Arc<ExportTable>, ResolveError>,
        parent_of: &'a dyn Fn(PackageId) -> Option<PackageId>,
    ) -> Self {
        ChainWalker {
            exports_of,
            parent_of,
        }
    }

    /// Walk from `selector` as exported by `module` to its terminal declaration.
    pub fn walk(&self, module: &ModuleKey, selector: &Selector) -> Result<Walk, ResolveError> {
        let mut stack = Vec::new();
        self.walk_from(module, selector, &mut stack)
    }

    fn walk_from(
        &self,
        module: &ModuleKey,
        selector: &Selector,
        stack: &mut Vec<(ModuleKey, Selector)>,
    ) -> Result<Walk, ResolveError> {
        if stack.iter().any(|(m, s)| m == module && s == selector) {
            let mut chain: Vec<String> = stack.iter().map(|(m, s)| format!("{}::{}", m, s)).collect();
            chain.push(format!("{}::{}", module, selector));
            return Err(ResolveError::CyclicReExport {
                symbol: selector.to_string(),
                chain,
            });
        }

        stack.push((module.clone(), selector.clone()));
        let result = self.step(module, selector, stack);
        stack.pop();
        result
    }

    fn step(
        &self,
        module: &ModuleKey,
        selector: &Selector,
        stack: &mut Vec<(ModuleKey, Selector)>,
    ) -> Result<Walk, ResolveError> {
        let table = (self.exports_of)(module)?;
        let hop = |scope: &Scope| Hop {
            module: module.clone(),
            selector: selector.clone(),
            scope: scope.clone(),
        };

        if let Some(entry) = table.find(selector) {
            return match &entry.origin {
                ExportOrigin::Local => Ok(Walk {
                    hops: vec![hop(&entry.scope)],
                    no_auto_import: entry.no_auto_import,
                }),
                ExportOrigin::Forward { target, remote } => {
                    tracing::debug!("{}::{} forwards to {}::{}", module, selector, target, remote);
                    let mut rest = self.walk_from(target, remote, stack)?;
                    rest.hops.insert(0, hop(&entry.scope));
                    Ok(rest)
                }
            };
        }

        // A wildcard that only leads back onto the stack provides nothing;
        // the cycle is reported only if no later wildcard provides the name.
        let mut cycle = None;

        // impls are never forwarded by wildcards
        if !matches!(selector, Selector::Impl(_)) {
            for wildcard in table.wildcards() {
                if *selector == Selector::Default && !wildcard.include_default {
                    continue;
                }
                match self.walk_from(&wildcard.target, selector, stack) {
                    Ok(mut rest) => {
                        // only names the forwarding module can see are forwarded
                        if self.check(&rest.hops, module).is_err() {
                            continue;
                        }
                        rest.hops.insert(0, hop(&wildcard.scope));
                        return Ok(rest);
                    }
                    Err(ResolveError::TargetNotFound { .. }) => continue,
                    Err(e @ ResolveError::CyclicReExport { .. }) => {
                        tracing::debug!("{}: wildcard from {} cycles for `{}`", module, wildcard.target, selector);
                        cycle.get_or_insert(e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        if let Some(e) = cycle {
            return Err(e);
        }

        Err(ResolveError::TargetNotFound {
            symbol: selector.to_string(),
            module: module.to_string(),
        })
    }

    /// Check a chain on behalf of `consumer`.
    ///
    /// The consumer must see the outermost declaration. Every later hop must
    /// be visible to the module forwarding to it and, when the hop crosses
    /// into another package, to the consumer as well.
    pub fn check(&self, hops: &[Hop], consumer: &ModuleKey) -> Result<(), ResolveError> {
        let private = |hop: &Hop, requester: &ModuleKey| ResolveError::PrivateSymbol {
            symbol: hop.selector.to_string(),
            module: hop.module.to_string(),
            requester: requester.to_string(),
            visibility: hop.scope.to_string(),
        };

        let Some(first) = hops.first() else {
            return Ok(());
        };
        if !check_visible(&first.scope, &first.module, consumer, self.parent_of) {
            return Err(private(first, consumer));
        }

        for pair in hops.windows(2) {
            let (forwarder, target) = (&pair[0], &pair[1]);
            if !check_visible(&target.scope, &target.module, &forwarder.module, self.parent_of) {
                return Err(private(target, &forwarder.module));
            }
            if target.module.package != forwarder.module.package
                && !check_visible(&target.scope, &target.module, consumer, self.parent_of)
            {
                return Err(private(target, consumer));
            }
        }
        Ok(())
    }

    /// Every selector `module` exports of the given kind, sorted.
    ///
    /// Visibility is not checked here; callers resolve and check each one.
    pub fn enumerate(&self, module: &ModuleKey, what: Enumerate) -> Result<Vec<Selector>, ResolveError> {
        let mut found = BTreeSet::new();
        let mut visited = HashSet::new();
        self.collect(module, what, &mut found, &mut visited)?;
        Ok(found.into_iter().collect())
    }

    fn collect(
        &self,
        module: &ModuleKey,
        what: Enumerate,
        found: &mut BTreeSet<Selector>,
        visited: &mut HashSet<ModuleKey>,
    ) -> Result<(), ResolveError> {
        if !visited.insert(module.clone()) {
            return Ok(());
        }
        let table = (self.exports_of)(module)?;

        for entry in table.entries() {
            let wanted = match (&entry.selector, what) {
                (Selector::Name { .. }, Enumerate::Names) => true,
                (Selector::Impl(_), Enumerate::Impls) => true,
                _ => false,
            };
            if wanted {
                found.insert(entry.selector.clone());
            }
        }

        if what == Enumerate::Names {
            for wildcard in table.wildcards() {
                self.collect(&wildcard.target, what, found, visited)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decl::{ExportDeclaration, ModuleDeclarations, ReExportDeclaration, Visibility};
    use crate::core::path::ModulePath;
    use std::collections::HashMap;

    fn key(pkg: &str, path: &str) -> ModuleKey {
        ModuleKey::new(PackageId::parse(pkg).unwrap(), ModulePath::parse(path))
    }

    /// Modules addressed as `pkg:path` in re-export sources.
    struct Fixture {
        tables: HashMap<ModuleKey, Arc<ExportTable>>,
    }

    impl Fixture {
        fn new(modules: Vec<(ModuleKey, ModuleDeclarations)>) -> Self {
            let tables = modules
                .into_iter()
                .map(|(module, decls)| {
                    let table = ExportTable::build(&module, Some(&decls), |raw| {
                        let (pkg, path) = raw.split_once(':').unwrap();
                        Ok(key(pkg, path))
                    })
                    .unwrap();
                    (module, Arc::new(table))
                })
                .collect();
            Fixture { tables }
        }

        fn exports_of(&self, module: &ModuleKey) -> Result<Arc<ExportTable>, ResolveError> {
            self.tables.get(module).cloned().ok_or_else(|| ResolveError::ModuleNotFound {
                package: module.package.to_string(),
                path: module.path.to_string(),
                tried: vec![],
            })
        }
    }

    fn forward(local: &str, from: &str, visibility: Visibility) -> ReExportDeclaration {
        ReExportDeclaration::Named {
            local: Selector::name(local),
            from: from.to_string(),
            remote: Selector::name(local),
            visibility,
        }
    }

    fn exporting(name: &str, visibility: Visibility) -> ModuleDeclarations {
        ModuleDeclarations {
            exports: vec![ExportDeclaration::new(Selector::name(name), visibility)],
            ..Default::default()
        }
    }

    fn forwarding(reexports: Vec<ReExportDeclaration>) -> ModuleDeclarations {
        ModuleDeclarations {
            reexports,
            ..Default::default()
        }
    }

    fn no_parents(_: PackageId) -> Option<PackageId> {
        None
    }

    #[test]
    fn test_chain_terminates() {
        let fixture = Fixture::new(vec![
            (key("p", "a"), forwarding(vec![forward("x", "p:b", Visibility::Public)])),
            (key("p", "b"), forwarding(vec![forward("x", "p:c", Visibility::Public)])),
            (key("p", "c"), exporting("x", Visibility::Public)),
        ]);
        let exports = |m: &ModuleKey| fixture.exports_of(m);
        let walker = ChainWalker::new(&exports, &no_parents);

        let walk = walker.walk(&key("p", "a"), &Selector::name("x")).unwrap();
        let modules: Vec<_> = walk.hops.iter().map(|h| h.module.to_string()).collect();
        assert_eq!(modules, vec!["p/a", "p/b", "p/c"]);
    }

    #[test]
    fn test_cycle_lists_every_hop() {
        let fixture = Fixture::new(vec![
            (key("p", "a"), forwarding(vec![forward("x", "p:b", Visibility::Public)])),
            (key("p", "b"), forwarding(vec![forward("x", "p:c", Visibility::Public)])),
            (key("p", "c"), forwarding(vec![forward("x", "p:a", Visibility::Public)])),
        ]);
        let exports = |m: &ModuleKey| fixture.exports_of(m);
        let walker = ChainWalker::new(&exports, &no_parents);

        match walker.walk(&key("p", "a"), &Selector::name("x")) {
            Err(ResolveError::CyclicReExport { chain, .. }) => {
                assert_eq!(chain, vec!["p/a::x", "p/b::x", "p/c::x", "p/a::x"]);
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_same_package_facade_launders_nothing_across_packages() {
        let fixture = Fixture::new(vec![
            (key("p", "a"), exporting("x", Visibility::Package)),
            (key("p", "b"), forwarding(vec![forward("x", "p:a", Visibility::Public)])),
            (key("q", "b"), forwarding(vec![forward("x", "p:a", Visibility::Public)])),
        ]);
        let exports = |m: &ModuleKey| fixture.exports_of(m);
        let walker = ChainWalker::new(&exports, &no_parents);
        let consumer = key("external", "main");

        let through_same = walker.walk(&key("p", "b"), &Selector::name("x")).unwrap();
        assert!(walker.check(&through_same.hops, &consumer).is_ok());

        let through_other = walker.walk(&key("q", "b"), &Selector::name("x")).unwrap();
        assert!(matches!(
            walker.check(&through_other.hops, &consumer),
            Err(ResolveError::PrivateSymbol { .. })
        ));
    }

    #[test]
    fn test_wildcard_forwards_names_but_not_default() {
        let mut target = exporting("x", Visibility::Public);
        target
            .exports
            .push(ExportDeclaration::new(Selector::Default, Visibility::Public));
        let fixture = Fixture::new(vec![
            (key("p", "lib"), target),
            (
                key("p", "facade"),
                forwarding(vec![ReExportDeclaration::Wildcard {
                    from: "p:lib".to_string(),
                    include_default: false,
                    visibility: Visibility::Public,
                }]),
            ),
        ]);
        let exports = |m: &ModuleKey| fixture.exports_of(m);
        let walker = ChainWalker::new(&exports, &no_parents);

        assert!(walker.walk(&key("p", "facade"), &Selector::name("x")).is_ok());
        assert!(matches!(
            walker.walk(&key("p", "facade"), &Selector::Default),
            Err(ResolveError::TargetNotFound { .. })
        ));
        assert_eq!(
            walker.enumerate(&key("p", "facade"), Enumerate::Names).unwrap(),
            vec![Selector::name("x")]
        );
    }

    fn wildcard(from: &str) -> ReExportDeclaration {
        ReExportDeclaration::Wildcard {
            from: from.to_string(),
            include_default: false,
            visibility: Visibility::Public,
        }
    }

    #[test]
    fn test_wildcard_leading_back_does_not_hide_later_wildcards() {
        // `a` re-exports everything from `c` then `b`; `c` re-exports `a`
        let fixture = Fixture::new(vec![
            (key("p", "a"), forwarding(vec![wildcard("p:c"), wildcard("p:b")])),
            (key("p", "c"), forwarding(vec![wildcard("p:a")])),
            (key("p", "b"), exporting("x", Visibility::Public)),
        ]);
        let exports = |m: &ModuleKey| fixture.exports_of(m);
        let walker = ChainWalker::new(&exports, &no_parents);

        let walk = walker.walk(&key("p", "a"), &Selector::name("x")).unwrap();
        let modules: Vec<_> = walk.hops.iter().map(|h| h.module.to_string()).collect();
        assert_eq!(modules, vec!["p/a", "p/b"]);

        let walk = walker.walk(&key("p", "c"), &Selector::name("x")).unwrap();
        let modules: Vec<_> = walk.hops.iter().map(|h| h.module.to_string()).collect();
        assert_eq!(modules, vec!["p/c", "p/a", "p/b"]);

        assert_eq!(
            walker.enumerate(&key("p", "a"), Enumerate::Names).unwrap(),
            vec![Selector::name("x")]
        );

        // nobody provides `y`: the wildcard loop is the only thing left to report
        assert!(matches!(
            walker.walk(&key("p", "a"), &Selector::name("y")),
            Err(ResolveError::CyclicReExport { .. })
        ));
    }
}
