//! Dependency graphs and cycle detection.
//!
//! Edges are collected from many worker threads behind one mutex. Cycle
//! detection only ever runs on a finished snapshot, so the order in which
//! edges arrived cannot change what is reported.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use parking_lot::Mutex;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::module::ModuleKey;
use crate::core::PackageId;
use crate::resolver::errors::{GraphKind, ResolveError};

/// A directed graph with one node per distinct weight.
#[derive(Debug, Clone)]
pub struct KeyedGraph<N> {
    graph: DiGraph<N, ()>,
    nodes: HashMap<N, NodeIndex>,
}

impl<N> KeyedGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        KeyedGraph {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, node: &N) -> NodeIndex {
        if let Some(&index) = self.nodes.get(node) {
            return index;
        }
        let index = self.graph.add_node(node.clone());
        self.nodes.insert(node.clone(), index);
        index
    }

    pub fn add_edge(&mut self, from: &N, to: &N) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn contains_edge(&self, from: &N, to: &N) -> bool {
        match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges as `(from, to)` pairs, sorted.
    pub fn edges(&self) -> Vec<(N, N)> {
        let mut out: Vec<(N, N)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].clone(), self.graph[b].clone()))
            .collect();
        out.sort();
        out
    }

    /// One canonical cycle per strongly connected component that has one.
    ///
    /// Each cycle starts and ends at the component's smallest node and
    /// follows the smallest successor that leads back, so the result does
    /// not depend on edge insertion order. Cycles are sorted.
    pub fn cycles(&self) -> Vec<Vec<N>> {
        let mut cycles = Vec::new();

        for component in tarjan_scc(&self.graph) {
            let is_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| self.graph.contains_edge(n, n));
            if !is_cycle {
                continue;
            }

            let members: HashSet<NodeIndex> = component.iter().copied().collect();
            let Some(&start) = component.iter().min_by(|&&a, &&b| self.graph[a].cmp(&self.graph[b])) else {
                continue;
            };
            if let Some(path) = self.cycle_through(start, &members) {
                cycles.push(path.into_iter().map(|n| self.graph[n].clone()).collect());
            }
        }

        cycles.sort();
        cycles
    }

    /// Iterative DFS inside one component from `start` back to `start`.
    fn cycle_through(&self, start: NodeIndex, members: &HashSet<NodeIndex>) -> Option<Vec<NodeIndex>> {
        let sorted_successors = |n: NodeIndex| {
            let mut next: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(n, Direction::Outgoing)
                .filter(|m| members.contains(m))
                .collect();
            next.sort_by(|&a, &b| self.graph[a].cmp(&self.graph[b]));
            next
        };

        let mut path = vec![start];
        let mut on_path: HashSet<NodeIndex> = HashSet::from([start]);
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        // pending successors per path entry
        let mut frames: Vec<std::vec::IntoIter<NodeIndex>> = vec![sorted_successors(start).into_iter()];

        while let Some(frame) = frames.last_mut() {
            match frame.next() {
                Some(next) if next == start => {
                    path.push(start);
                    return Some(path);
                }
                Some(next) => {
                    if on_path.contains(&next) || !visited.insert(next) {
                        continue;
                    }
                    path.push(next);
                    on_path.insert(next);
                    frames.push(sorted_successors(next).into_iter());
                }
                None => {
                    frames.pop();
                    if let Some(done) = path.pop() {
                        on_path.remove(&done);
                    }
                }
            }
        }
        None
    }
}

impl<N> Default for KeyedGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Module edges accumulated during one resolution pass.
///
/// Writers take the lock for a single edge insertion.
#[derive(Default)]
pub struct DependencyGraph {
    modules: Mutex<KeyedGraph<ModuleKey>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph::default()
    }

    /// Record that resolving something in `from` touched `to`.
    pub fn add_edge(&self, from: &ModuleKey, to: &ModuleKey) {
        self.modules.lock().add_edge(from, to);
    }

    /// Freeze the current edges for validation.
    pub fn snapshot(&self) -> GraphSnapshot {
        let modules = self.modules.lock().clone();

        let mut packages = KeyedGraph::new();
        for (from, to) in modules.edges() {
            packages.add_node(&from.package);
            packages.add_node(&to.package);
            if from.package != to.package {
                packages.add_edge(&from.package, &to.package);
            }
        }

        GraphSnapshot { modules, packages }
    }
}

/// Finished module and package graphs.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    pub modules: KeyedGraph<ModuleKey>,
    /// Module edges collapsed onto their owning packages
    pub packages: KeyedGraph<PackageId>,
}

impl GraphSnapshot {
    /// Validate both graphs, module cycles first.
    pub fn cycle_errors(&self) -> Vec<ResolveError> {
        let mut errors = cycle_errors(GraphKind::Module, self.modules.cycles());
        errors.extend(cycle_errors(GraphKind::Package, self.packages.cycles()));
        errors
    }
}

fn cycle_errors<N: Display>(kind: GraphKind, cycles: Vec<Vec<N>>) -> Vec<ResolveError> {
    cycles
        .into_iter()
        .map(|cycle| ResolveError::CyclicDependency {
            kind,
            cycle: cycle.iter().map(ToString::to_string).collect(),
        })
        .collect()
}
