//! Circular dependency detection.

use std::collections::{BTreeMap, HashMap, HashSet};

use addon_meta::Addon;
use addon_repo::RepositorySnapshot;

use crate::diagnostic::Diagnostic;

/// `add-on id -> ids of its dependencies that are published`, in
/// declaration order. Add-ons without resolvable dependencies have no key.
pub type DependencyGraph = BTreeMap<String, Vec<String>>;

/// Build the dependency graph reachable from `root`.
///
/// Dependencies are looked up with [`RepositorySnapshot::find`]; those not
/// published add no edge. Every add-on is expanded once.
pub fn build_dependency_graph(root: &Addon, snapshot: &RepositorySnapshot) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    let mut visited: HashSet<&str> = HashSet::from([root.id.as_str()]);
    let mut pending: Vec<&Addon> = vec![root];

    while let Some(addon) = pending.pop() {
        for dependency in &addon.dependencies {
            let Some(target) = snapshot.find(&dependency.target_id) else {
                continue;
            };
            let edges = graph.entry(addon.id.clone()).or_default();
            if !edges.contains(&dependency.target_id) {
                edges.push(dependency.target_id.clone());
            }
            if visited.insert(target.id.as_str()) {
                pending.push(target);
            }
        }
    }

    graph
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path
    Open,
    /// Fully explored
    Closed,
}

/// Depth-first search from `root`, returning every node that a back edge
/// points to. Each node is returned once; a self-loop counts.
pub fn detect_cycles(graph: &DependencyGraph, root: &str) -> Vec<String> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut cycles = Vec::new();
    let mut reported: HashSet<&str> = HashSet::new();

    // (node, index of the next edge to follow)
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
    marks.insert(root, Mark::Open);

    while let Some(frame) = stack.last_mut() {
        let (node, next) = *frame;
        let edges = graph.get(node).map_or(&[][..], Vec::as_slice);

        let Some(child) = edges.get(next) else {
            marks.insert(node, Mark::Closed);
            stack.pop();
            continue;
        };
        frame.1 += 1;

        let child = child.as_str();
        match marks.get(child) {
            None => {
                marks.insert(child, Mark::Open);
                stack.push((child, 0));
            }
            Some(Mark::Open) => {
                if reported.insert(child) {
                    cycles.push(child.to_string());
                }
            }
            Some(Mark::Closed) => {}
        }
    }

    cycles
}

/// Report the cycles reachable from `addon` in `snapshot`.
pub fn check_circular_dependencies(addon: &Addon, snapshot: &RepositorySnapshot) -> Vec<Diagnostic> {
    let graph = build_dependency_graph(addon, snapshot);
    detect_cycles(&graph, &addon.id)
        .into_iter()
        .map(|id| Diagnostic::problem(format!("Circular dependencies: {id}")))
        .collect()
}
