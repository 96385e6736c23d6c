//! `excluding` clauses.
//!
//! Filtering runs on candidates that already passed visibility. Every
//! exclusion entry is matched independently against the full candidate set;
//! an entry that matches nothing is reported back, never an error.

use crate::core::decl::{ExclusionClause, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filtered<T> {
    pub kept: Vec<T>,
    /// Entries that matched no candidate, in clause order
    pub unmatched: Vec<Selector>,
}

/// Drop every candidate matched by some exclusion entry.
pub fn apply<T, F>(candidates: Vec<T>, exclusions: &[ExclusionClause], selector_of: F) -> Filtered<T>
where
    F: Fn(&T) -> &Selector,
{
    let entries: Vec<&Selector> = exclusions.iter().flat_map(|c| c.entries()).collect();

    let unmatched = entries
        .iter()
        .filter(|entry| !candidates.iter().any(|c| entry.excludes(selector_of(c))))
        .map(|entry| (*entry).clone())
        .collect();

    let kept = candidates
        .into_iter()
        .filter(|c| !entries.iter().any(|entry| entry.excludes(selector_of(c))))
        .collect();

    Filtered { kept, unmatched }
}
