//! Resolved symbols and their per-session interning.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::decl::Selector;
use crate::core::module::ModuleKey;
use crate::core::PackageId;

/// A terminal symbol: the declaration a chain of forwards ends at.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedSymbol {
    pub module: ModuleKey,
    pub selector: Selector,
    /// Backing file of the owning module
    pub file: PathBuf,
    pub no_auto_import: bool,
}

impl ResolvedSymbol {
    pub fn package(&self) -> PackageId {
        self.module.package
    }
}

impl fmt::Display for ResolvedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.selector)
    }
}

/// One `Arc<ResolvedSymbol>` per `(module, selector)` for the whole session,
/// so every import site can compare resolutions by pointer.
#[derive(Default)]
pub struct SymbolTable {
    symbols: Mutex<HashMap<(ModuleKey, Selector), Arc<ResolvedSymbol>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn intern(&self, module: &ModuleKey, selector: &Selector, file: PathBuf, no_auto_import: bool) -> Arc<ResolvedSymbol> {
        let mut symbols = self.symbols.lock();
        symbols
            .entry((module.clone(), selector.clone()))
            .or_insert_with(|| {
                Arc::new(ResolvedSymbol {
                    module: module.clone(),
                    selector: selector.clone(),
                    file,
                    no_auto_import,
                })
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.symbols.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.lock().is_empty()
    }
}
